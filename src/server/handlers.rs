//! HTTP handlers for resource operations
//!
//! All handlers are generic over the resource type and its repository. They
//! only translate between HTTP and [`EntityService`] calls: query string to
//! [`QuerySpec`](crate::core::query::QuerySpec), JSON bodies to
//! [`Versioned`] payloads, and errors to problem responses.

use crate::core::entity::{Resource, Versioned};
use crate::core::error::{Error, Result};
use crate::core::parser::{QueryParams, parse};
use crate::core::query::Page;
use crate::core::repository::Repository;
use crate::core::service::{EntityService, RequestContext};
use crate::server::error::ProblemDetails;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{OriginalUri, Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::{Value, json};
use std::time::Duration;

/// Application state shared across handlers of one resource
pub struct ResourceState<T, R> {
    pub service: EntityService<T, R>,

    /// Upper bound on one request's unit of work
    pub request_timeout: Option<Duration>,
}

impl<T, R> Clone for ResourceState<T, R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<T, R> ResourceState<T, R> {
    pub fn new(service: EntityService<T, R>) -> Self {
        Self {
            service,
            request_timeout: None,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    fn context(&self) -> RequestContext {
        let ctx = RequestContext::new();
        match self.request_timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::request(format!("invalid request body: {}", rejection.body_text())))
}

/// GET /{plural}?filter=...&sort=...&page=...&size=...
pub async fn query_resources<T, R>(
    State(state): State<ResourceState<T, R>>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Page<Versioned<T>>>>
where
    T: Resource,
    R: Repository<Versioned<T>> + 'static,
{
    let params = QueryParams::from_query_string(raw.as_deref().unwrap_or_default())?;
    let query = parse(&params)?;
    let page = state.service.query(&state.context(), query).await?;
    Ok(Json(page))
}

/// GET /{plural}/{id}
pub async fn read_resource<T, R>(
    State(state): State<ResourceState<T, R>>,
    Path(id): Path<String>,
) -> Result<Json<Versioned<T>>>
where
    T: Resource,
    R: Repository<Versioned<T>> + 'static,
{
    let entity = state.service.read(&state.context(), &id).await?;
    Ok(Json(entity))
}

/// POST /{plural}
///
/// Any id or version in the body is ignored; the store assigns both.
pub async fn create_resource<T, R>(
    State(state): State<ResourceState<T, R>>,
    payload: std::result::Result<Json<Versioned<T>>, JsonRejection>,
) -> Result<(StatusCode, Json<Versioned<T>>)>
where
    T: Resource,
    R: Repository<Versioned<T>> + 'static,
{
    let entity = body(payload)?;
    let created = state
        .service
        .create(&state.context(), Versioned::unsaved(entity.data))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /{plural}/{id}
///
/// The path id replaces any id in the body; the body must carry the
/// version the caller last read.
pub async fn update_resource<T, R>(
    State(state): State<ResourceState<T, R>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<Versioned<T>>, JsonRejection>,
) -> Result<Json<Versioned<T>>>
where
    T: Resource,
    R: Repository<Versioned<T>> + 'static,
{
    let mut entity = body(payload)?;
    entity.metadata.id = id;
    let updated = state.service.update(&state.context(), entity).await?;
    Ok(Json(updated))
}

/// DELETE /{plural}/{id}
pub async fn delete_resource<T, R>(
    State(state): State<ResourceState<T, R>>,
    Path(id): Path<String>,
) -> Result<StatusCode>
where
    T: Resource,
    R: Repository<Versioned<T>> + 'static,
{
    state.service.delete(&state.context(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint handler
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "ticket-rs"
    }))
}

/// Fallback for unmatched paths
pub async fn path_not_found(OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    ProblemDetails::path_not_found(uri.path())
}
