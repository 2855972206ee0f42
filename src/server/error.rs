//! RFC 7807 problem responses
//!
//! Every [`Error`] leaving a handler is rendered as
//! `application/problem+json`:
//!
//! ```json
//! {"type": "ticket:err:conflict", "title": "Conflict", "status": 409, "detail": "update ticket failed: version conflict"}
//! ```
//!
//! The detail carries the innermost error message. Internal errors are
//! logged and their detail is left empty.

use crate::core::error::{Error, ErrorKind};
use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

const TYPE_PREFIX: &str = "ticket:err:";
const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// RFC 7807 problem details body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
}

impl ProblemDetails {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        let title = status.canonical_reason().unwrap_or("Unknown Error");
        Self {
            type_uri: format!("{}{}", TYPE_PREFIX, title.to_lowercase().replace(' ', "")),
            title: title.to_string(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    /// Problem for a path no route matches
    pub fn path_not_found(path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("path not found: {}", path))
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            Json(self),
        )
            .into_response()
    }
}

/// HTTP status for an error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Query | ErrorKind::Request => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<&Error> for ProblemDetails {
    fn from(err: &Error) -> Self {
        let status = status_for(err.kind());
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %err, "request failed");
            return ProblemDetails::new(status, "");
        }
        ProblemDetails::new(status, err.root().to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        ProblemDetails::from(&self).into_response()
    }
}
