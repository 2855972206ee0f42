//! HTTP exposure of resource services
//!
//! A thin axum layer over [`EntityService`](crate::core::service::EntityService):
//! - CRUD and query routes for every registered resource
//! - RFC 7807 problem responses for every error
//! - request tracing through `tower-http`

pub mod builder;
pub mod error;
pub mod handlers;
pub mod router;

pub use builder::ServerBuilder;
pub use error::ProblemDetails;
pub use handlers::ResourceState;
pub use router::{API_PREFIX, resource_routes};
