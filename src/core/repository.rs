//! Repository and transaction traits
//!
//! A repository performs CRUD and query operations for one entity type,
//! always inside a transaction obtained from [`Repository::start_tx`].
//!
//! # Transactions
//!
//! [`Transaction::commit`] consumes the handle. A handle that is dropped
//! without being committed is rolled back, so holding one in a local
//! binding gives a rollback on every early return while committing stays
//! explicit.
//!
//! # Optimistic concurrency
//!
//! `update` only succeeds when the caller supplies the version it last
//! observed. Any other outcome (stale version, row deleted concurrently) is
//! a [`Conflict`](crate::core::error::ErrorKind::Conflict). `delete` does not
//! check the version.

use crate::core::error::Result;
use crate::core::query::{Page, QuerySpec};
use async_trait::async_trait;

/// An atomic unit of work
///
/// All operations performed through the same transaction either all
/// commit or all roll back.
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self) -> Result<()>;

    /// Abort the transaction explicitly
    async fn rollback(self) -> Result<()>;
}

/// Transaction-scoped CRUD and query operations for entities of type `T`
#[async_trait]
pub trait Repository<T: Send + 'static>: Send + Sync {
    /// The transaction handle type of this store
    type Tx: Transaction + 'static;

    /// Begin a transaction at the store's default isolation level
    async fn start_tx(&self, read_only: bool) -> Result<Self::Tx>;

    /// Insert a new entity; the store assigns id and initial version
    ///
    /// Returns the entity as read back from the store.
    async fn create(&self, tx: &mut Self::Tx, entity: T) -> Result<T>;

    /// Read an entity by id, failing with NotFound if absent
    async fn read(&self, tx: &mut Self::Tx, id: &str) -> Result<T>;

    /// Update an entity if its version still matches
    ///
    /// Fails with NotFound if the entity does not exist and with Conflict
    /// if the version check does not affect exactly one row. Returns the
    /// entity with its new version.
    async fn update(&self, tx: &mut Self::Tx, entity: T) -> Result<T>;

    /// Delete an entity by id, without a version check
    async fn delete(&self, tx: &mut Self::Tx, id: &str) -> Result<()>;

    /// Run a validated query
    async fn query(&self, tx: &mut Self::Tx, query: &QuerySpec) -> Result<Page<T>>;
}
