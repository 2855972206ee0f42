//! # ticket-rs
//!
//! The core of a ticket service: a small query language for list requests,
//! its compilation to parameterised SQL, and transactional repositories with
//! optimistic concurrency control.
//!
//! ## Features
//!
//! - **Query language**: `filter=status==open&sort=summary asc&page=2&size=10`
//!   parsed into a typed [`QuerySpec`](core::query::QuerySpec)
//! - **Capabilities**: per-resource declaration of filterable and sortable fields
//! - **SQL compilation**: values always travel as bind parameters
//! - **Transactions**: one all-or-nothing unit of work per service call
//! - **Optimistic locking**: stale updates fail with a conflict
//! - **Storage backends**: in-memory (default) and PostgreSQL (`postgres` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ticket::prelude::*;
//!
//! let service = EntityService::<Ticket, _>::new(
//!     InMemoryRepository::new(),
//!     Arc::new(AlwaysAuthorize),
//! )?;
//!
//! let ctx = RequestContext::new();
//! let created = service
//!     .create(&ctx, Versioned::unsaved(Ticket::new("Printer jam", "", "open")))
//!     .await?;
//!
//! let params = QueryParams::from_query_string("filter=status==open&sort=summary asc")?;
//! let page = service.query(&ctx, parse(&params)?).await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Query language ===
    pub use crate::core::{
        capability::{Capabilities, FieldCapability},
        parser::{QueryParams, parse},
        query::{Direction, FilterExpr, Operator, Page, QueryDefaults, QuerySpec, SortExpr},
        sql::{Placeholder, SqlQuery, compile},
    };

    // === Entities and services ===
    pub use crate::core::{
        auth::{AlwaysAuthorize, Authorizer},
        entity::{Metadata, Resource, Versioned},
        error::{Error, ErrorKind, Result, ResultExt},
        field::FieldValue,
        repository::{Repository, Transaction},
        service::{EntityService, RequestContext},
    };
    pub use crate::entities::{Ticket, TicketWithMetadata};

    // === Macros ===
    pub use crate::impl_resource;

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryRepository;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresTicketRepository;

    // === Config ===
    pub use crate::config::{ApiConfig, AppConfig, DatabaseConfig};

    // === Server ===
    pub use crate::server::{ProblemDetails, ServerBuilder};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use uuid::Uuid;
}
