//! Route table for resources
//!
//! Each registered resource gets:
//! - `GET    /api/v1/{plural}`       query
//! - `POST   /api/v1/{plural}`       create
//! - `GET    /api/v1/{plural}/{id}`  read
//! - `PUT    /api/v1/{plural}/{id}`  update
//! - `DELETE /api/v1/{plural}/{id}`  delete

use crate::core::entity::{Resource, Versioned};
use crate::core::repository::Repository;
use crate::server::handlers::{
    ResourceState, create_resource, delete_resource, health_check, query_resources,
    read_resource, update_resource,
};
use axum::{Router, routing::get};

/// Prefix of every resource route
pub const API_PREFIX: &str = "/api/v1";

/// Build the CRUD and query routes of one resource
pub fn resource_routes<T, R>(state: ResourceState<T, R>) -> Router
where
    T: Resource,
    R: Repository<Versioned<T>> + 'static,
{
    let collection = format!("{}/{}", API_PREFIX, T::resource_name());
    let item = format!("{}/{{id}}", collection);

    Router::new()
        .route(
            &collection,
            get(query_resources::<T, R>).post(create_resource::<T, R>),
        )
        .route(
            &item,
            get(read_resource::<T, R>)
                .put(update_resource::<T, R>)
                .delete(delete_resource::<T, R>),
        )
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}
