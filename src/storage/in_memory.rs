//! In-memory repository for testing and development
//!
//! Write transactions take an exclusive lock on the table for their whole
//! lifetime and work on a private copy, which replaces the committed table
//! on commit. Dropping an uncommitted transaction discards the copy.
//! Read-only transactions work on a snapshot taken at start. Taking it needs
//! the same lock, so a reader waits for any open write transaction to end.
//!
//! Ids are random UUIDs. Versions are a decimal counter starting at `"1"`.

use crate::core::entity::{Metadata, Resource, Versioned, parse_id};
use crate::core::error::{Error, Result};
use crate::core::query::{Page, QuerySpec};
use crate::core::repository::{Repository, Transaction};
use crate::core::store::apply_query;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type Table<T> = IndexMap<Uuid, Versioned<T>>;

/// Initial version token of a created entity
pub const INITIAL_VERSION: &str = "1";

/// In-memory repository implementation
///
/// Useful for testing and development. Clones share the same table.
pub struct InMemoryRepository<T> {
    table: Arc<Mutex<Table<T>>>,
}

impl<T> InMemoryRepository<T> {
    /// Create a new, empty repository
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(IndexMap::new())),
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

/// Transaction over an [`InMemoryRepository`]
pub struct InMemoryTx<T> {
    /// Held for the whole transaction by writers; `None` for readers
    lock: Option<OwnedMutexGuard<Table<T>>>,
    working: Table<T>,
}

impl<T> InMemoryTx<T> {
    fn is_read_only(&self) -> bool {
        self.lock.is_none()
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.is_read_only() {
            return Err(Error::internal(
                "write rejected",
                "cannot execute write in a read-only transaction",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Send + 'static> Transaction for InMemoryTx<T> {
    async fn commit(self) -> Result<()> {
        if let Some(mut lock) = self.lock {
            *lock = self.working;
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

fn next_version(current: &str) -> Result<String> {
    current
        .parse::<u64>()
        .map(|v| (v + 1).to_string())
        .map_err(|e| Error::internal("corrupt version token", e))
}

fn not_found<T: Resource>(id: &str) -> Error {
    Error::not_found(format!(
        "no {} with id {} found",
        T::resource_name_singular(),
        id
    ))
}

#[async_trait]
impl<T: Resource> Repository<Versioned<T>> for InMemoryRepository<T> {
    type Tx = InMemoryTx<T>;

    async fn start_tx(&self, read_only: bool) -> Result<Self::Tx> {
        if read_only {
            let snapshot = self.table.lock().await.clone();
            Ok(InMemoryTx {
                lock: None,
                working: snapshot,
            })
        } else {
            let lock = self.table.clone().lock_owned().await;
            let working = (*lock).clone();
            Ok(InMemoryTx {
                lock: Some(lock),
                working,
            })
        }
    }

    async fn create(&self, tx: &mut Self::Tx, entity: Versioned<T>) -> Result<Versioned<T>> {
        tx.ensure_writable()?;

        let id = Uuid::new_v4();
        let stored = Versioned::new(
            Metadata::new(id.to_string(), INITIAL_VERSION),
            entity.data,
        );
        tx.working.insert(id, stored);

        self.read(tx, &id.to_string()).await
    }

    async fn read(&self, tx: &mut Self::Tx, id: &str) -> Result<Versioned<T>> {
        let key = parse_id(id)?;
        tx.working
            .get(&key)
            .cloned()
            .ok_or_else(|| not_found::<T>(id))
    }

    async fn update(&self, tx: &mut Self::Tx, entity: Versioned<T>) -> Result<Versioned<T>> {
        tx.ensure_writable()?;

        // malformed input is a request error even when the row is absent
        let key = entity.metadata.parse_id()?;
        entity
            .metadata
            .version
            .parse::<u64>()
            .map_err(|_| Error::request(format!("invalid version: {}", entity.metadata.version)))?;

        let id = entity.metadata.id.clone();
        let current = self.read(tx, &id).await?;

        if current.metadata.version != entity.metadata.version {
            tracing::warn!(id = %id, "version conflict on update");
            return Err(Error::conflict(format!(
                "update {} failed: version conflict",
                T::resource_name_singular()
            )));
        }

        let updated = Versioned::new(
            Metadata::new(id.clone(), next_version(&current.metadata.version)?),
            entity.data,
        );
        tx.working.insert(key, updated);

        self.read(tx, &id).await
    }

    async fn delete(&self, tx: &mut Self::Tx, id: &str) -> Result<()> {
        tx.ensure_writable()?;

        let key = parse_id(id)?;
        tx.working.shift_remove(&key);
        Ok(())
    }

    async fn query(&self, tx: &mut Self::Tx, query: &QuerySpec) -> Result<Page<Versioned<T>>> {
        let rows: Vec<_> = tx.working.values().cloned().collect();
        let results = apply_query(rows, query);
        Ok(Page::from_results(results, query.page))
    }
}
