//! Shared test harness for storage backend testing
//!
//! Provides ticket fixtures, a service factory and the contract suites every
//! `Repository<TicketWithMetadata>` implementation must pass.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//!
//! repository_contract_tests!(InMemoryRepository::<Ticket>::new());
//! rest_integration_tests!(InMemoryRepository::<Ticket>::new());
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod repository_tests;
#[macro_use]
pub mod rest_tests;

use std::sync::Arc;
use ticket::core::auth::AlwaysAuthorize;
use ticket::core::entity::Versioned;
use ticket::core::query::Page;
use ticket::core::repository::Repository;
use ticket::core::service::{EntityService, RequestContext};
use ticket::entities::{Ticket, TicketWithMetadata};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A ticket without id or version, ready to be created
pub fn new_ticket(summary: &str, status: &str) -> TicketWithMetadata {
    Versioned::unsaved(Ticket::new(summary, format!("about {}", summary), status))
}

/// Five tickets, three of them open
pub fn sample_batch() -> Vec<TicketWithMetadata> {
    vec![
        new_ticket("alpha", "open"),
        new_ticket("bravo", "closed"),
        new_ticket("charlie", "open"),
        new_ticket("delta", "pending"),
        new_ticket("echo", "open"),
    ]
}

/// Wrap a repository in a service that permits every operation
pub fn service_for<R>(repository: R) -> EntityService<Ticket, R>
where
    R: Repository<TicketWithMetadata> + 'static,
{
    EntityService::new(repository, Arc::new(AlwaysAuthorize)).expect("ticket capabilities are valid")
}

pub fn ctx() -> RequestContext {
    RequestContext::new()
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

pub fn summaries(page: &Page<TicketWithMetadata>) -> Vec<&str> {
    page.results.iter().map(|t| t.data.summary.as_str()).collect()
}

pub fn assert_uuid(id: &str) {
    assert!(
        uuid::Uuid::parse_str(id).is_ok(),
        "Expected a UUID id, got {:?}",
        id
    );
}
