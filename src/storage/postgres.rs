//! PostgreSQL storage backend using sqlx.
//!
//! Provides [`PostgresTicketRepository`], a [`Repository`] for tickets
//! backed by a `sqlx::PgPool`, and [`PgTx`], its transaction handle.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! ticket-rs = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Concurrency
//!
//! Transactions run at the database's default isolation level. Updates are
//! guarded by the version column:
//!
//! ```sql
//! UPDATE tickets SET ..., version = version + 1 WHERE id = $1 AND version = $2
//! ```
//!
//! and anything other than exactly one affected row is a conflict.

use crate::config::DatabaseConfig;
use crate::core::entity::{Metadata, Resource, Versioned, parse_id};
use crate::core::error::{Error, Result};
use crate::core::query::{Page, QuerySpec};
use crate::core::repository::{Repository, Transaction};
use crate::core::sql::SqlQuery;
use crate::entities::Ticket;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Connection and schema management
// ---------------------------------------------------------------------------

/// Open a connection pool for the configured database
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_url())
        .await
        .map_err(|e| Error::internal("connect to database failed", e))
}

/// Create the `tickets` table if it does not exist.
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS tickets (
            id UUID PRIMARY KEY,
            version BIGINT NOT NULL DEFAULT 1,
            summary TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| Error::internal("create tickets table failed", e))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets (status)")
        .execute(pool)
        .await
        .map_err(|e| Error::internal("create tickets index failed", e))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// A PostgreSQL transaction
///
/// Dropping the handle without committing rolls the transaction back.
pub struct PgTx {
    inner: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTx {
    async fn commit(self) -> Result<()> {
        self.inner
            .commit()
            .await
            .map_err(|e| Error::internal("commit failed", e))
    }

    async fn rollback(self) -> Result<()> {
        self.inner
            .rollback()
            .await
            .map_err(|e| Error::internal("rollback failed", e))
    }
}

// ---------------------------------------------------------------------------
// PostgresTicketRepository
// ---------------------------------------------------------------------------

const TABLE: &str = "tickets";

/// Columns selected for every ticket row, in [`TicketRow`] order
const TICKET_COLUMNS: &[&str] = &["id", "version", "summary", "description", "status"];

const SELECT_BY_ID: &str =
    "SELECT id, version, summary, description, status FROM tickets WHERE id = $1";

const INSERT: &str = "INSERT INTO tickets (id, version, summary, description, status) \
     VALUES ($1, 1, $2, $3, $4)";

const UPDATE: &str = "UPDATE tickets SET summary = $3, description = $4, status = $5, \
     version = version + 1 WHERE id = $1 AND version = $2";

const DELETE: &str = "DELETE FROM tickets WHERE id = $1";

#[derive(Debug, sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    version: i64,
    summary: String,
    description: String,
    status: String,
}

impl From<TicketRow> for Versioned<Ticket> {
    fn from(row: TicketRow) -> Self {
        Versioned::new(
            Metadata::new(row.id.to_string(), row.version.to_string()),
            Ticket::new(row.summary, row.description, row.status),
        )
    }
}

/// Ticket repository backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// let pool = ticket::storage::postgres::connect(&config.database).await?;
/// ensure_schema(&pool).await?;
/// let repository = PostgresTicketRepository::new(pool);
/// ```
#[derive(Clone, Debug)]
pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn parse_version(version: &str) -> Result<i64> {
    version
        .parse::<i64>()
        .map_err(|_| Error::request(format!("invalid version: {}", version)))
}

#[async_trait]
impl Repository<Versioned<Ticket>> for PostgresTicketRepository {
    type Tx = PgTx;

    async fn start_tx(&self, read_only: bool) -> Result<PgTx> {
        let mut inner = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::internal("begin failed", e))?;

        if read_only {
            sqlx::query("SET TRANSACTION READ ONLY")
                .execute(&mut *inner)
                .await
                .map_err(|e| Error::internal("set read only failed", e))?;
        }

        Ok(PgTx { inner })
    }

    async fn create(&self, tx: &mut PgTx, entity: Versioned<Ticket>) -> Result<Versioned<Ticket>> {
        let id = Uuid::new_v4();
        let ticket = &entity.data;
        sqlx::query(INSERT)
            .bind(id)
            .bind(&ticket.summary)
            .bind(&ticket.description)
            .bind(&ticket.status)
            .execute(&mut *tx.inner)
            .await
            .map_err(|e| Error::internal("insert ticket failed", e))?;

        tracing::debug!(id = %id, "ticket inserted");
        self.read(tx, &id.to_string()).await
    }

    async fn read(&self, tx: &mut PgTx, id: &str) -> Result<Versioned<Ticket>> {
        let key = parse_id(id)?;
        let row: Option<TicketRow> = sqlx::query_as(SELECT_BY_ID)
            .bind(key)
            .fetch_optional(&mut *tx.inner)
            .await
            .map_err(|e| Error::internal("select ticket failed", e))?;

        row.map(Versioned::from).ok_or_else(|| {
            Error::not_found(format!(
                "no {} with id {} found",
                Ticket::resource_name_singular(),
                id
            ))
        })
    }

    async fn update(&self, tx: &mut PgTx, entity: Versioned<Ticket>) -> Result<Versioned<Ticket>> {
        let key = entity.metadata.parse_id()?;
        let version = parse_version(&entity.metadata.version)?;

        // absent rows are NotFound, not Conflict
        self.read(tx, &entity.metadata.id).await?;

        let ticket = &entity.data;
        let result = sqlx::query(UPDATE)
            .bind(key)
            .bind(version)
            .bind(&ticket.summary)
            .bind(&ticket.description)
            .bind(&ticket.status)
            .execute(&mut *tx.inner)
            .await
            .map_err(|e| Error::internal("update ticket failed", e))?;

        if result.rows_affected() != 1 {
            tracing::warn!(id = %key, version, "version conflict on update");
            return Err(Error::conflict("update ticket failed: version conflict"));
        }

        self.read(tx, &entity.metadata.id).await
    }

    async fn delete(&self, tx: &mut PgTx, id: &str) -> Result<()> {
        let key = parse_id(id)?;
        sqlx::query(DELETE)
            .bind(key)
            .execute(&mut *tx.inner)
            .await
            .map_err(|e| Error::internal("delete ticket failed", e))?;
        Ok(())
    }

    async fn query(&self, tx: &mut PgTx, query: &QuerySpec) -> Result<Page<Versioned<Ticket>>> {
        let (sql, args) = SqlQuery::new(TICKET_COLUMNS, TABLE, query).to_sql()?;
        tracing::debug!(sql = %sql, args = ?args, "running ticket query");

        let mut statement = sqlx::query_as::<_, TicketRow>(&sql);
        for arg in &args {
            statement = statement.bind(arg);
        }

        let rows = statement
            .fetch_all(&mut *tx.inner)
            .await
            .map_err(|e| Error::internal("query tickets failed", e))?;

        let results = rows.into_iter().map(Versioned::from).collect();
        Ok(Page::from_results(results, query.page))
    }
}
