//! Service layer: one all-or-nothing unit of work per request
//!
//! [`EntityService`] sequences, for each operation:
//!
//! 1. the authorization check (no transaction is started if it fails)
//! 2. request validation: query capabilities, identifier format, payload rules
//! 3. a transaction (read-only for query and read)
//! 4. exactly one repository call
//! 5. rollback on failure, commit on success
//!
//! An operation is only reported as done once commit returns without error.
//! A commit failure is returned even though the repository call succeeded.

use crate::core::auth::{Authorizer, Operation, OperationTag};
use crate::core::capability::Capabilities;
use crate::core::entity::{Resource, Versioned, parse_id};
use crate::core::error::{Error, Result, ResultExt};
use crate::core::query::{Page, QueryDefaults, QuerySpec};
use crate::core::repository::{Repository, Transaction};
use futures::future::BoxFuture;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Per-request context passed into every service operation
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Point in time after which the operation is abandoned and rolled back
    pub deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }
}

/// Operation tags for one resource
#[derive(Debug, Clone)]
struct OperationTags {
    query: OperationTag,
    read: OperationTag,
    create: OperationTag,
    update: OperationTag,
    delete: OperationTag,
}

impl OperationTags {
    fn for_resource<T: Resource>() -> Self {
        let tag =
            |op| OperationTag::new(op, T::resource_name_singular(), T::resource_name());
        Self {
            query: tag(Operation::Query),
            read: tag(Operation::Read),
            create: tag(Operation::Create),
            update: tag(Operation::Update),
            delete: tag(Operation::Delete),
        }
    }
}

/// Transactional CRUD and query service for a resource `T`
///
/// # Example
///
/// ```rust,ignore
/// let service = EntityService::<Ticket, _>::new(
///     InMemoryRepository::new(),
///     Arc::new(AlwaysAuthorize),
/// )?;
/// let created = service.create(&ctx, Versioned::unsaved(ticket)).await?;
/// ```
pub struct EntityService<T, R> {
    repository: Arc<R>,
    authorizer: Arc<dyn Authorizer>,
    capabilities: Arc<Capabilities>,
    defaults: QueryDefaults,
    tags: OperationTags,
    _marker: PhantomData<fn() -> T>,
}

impl<T, R> Clone for EntityService<T, R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            authorizer: self.authorizer.clone(),
            capabilities: self.capabilities.clone(),
            defaults: self.defaults,
            tags: self.tags.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, R> EntityService<T, R>
where
    T: Resource,
    R: Repository<Versioned<T>>,
{
    /// Build the service, declaring the resource's capabilities once
    pub fn new(repository: R, authorizer: Arc<dyn Authorizer>) -> Result<Self> {
        let capabilities = T::capabilities().context("declare capabilities failed")?;
        Ok(Self {
            repository: Arc::new(repository),
            authorizer,
            capabilities: Arc::new(capabilities),
            defaults: QueryDefaults::default(),
            tags: OperationTags::for_resource::<T>(),
            _marker: PhantomData,
        })
    }

    /// Page and size applied to queries that leave them unset
    pub fn with_defaults(mut self, defaults: QueryDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn query(
        &self,
        ctx: &RequestContext,
        query: QuerySpec,
    ) -> Result<Page<Versioned<T>>> {
        self.authorizer
            .is_authorized(ctx, &self.tags.query)
            .await?;

        let query = query.with_defaults(&self.defaults);
        self.capabilities.validate(&query)?;

        self.in_tx(ctx, &self.tags.query, true, move |repo, tx| {
            Box::pin(async move {
                repo.query(tx, &query)
                    .await
                    .context("query from repository failed")
            })
        })
        .await
    }

    pub async fn read(&self, ctx: &RequestContext, id: &str) -> Result<Versioned<T>> {
        self.authorizer
            .is_authorized(ctx, &self.tags.read)
            .await?;

        parse_id(id)?;

        let id = id.to_string();
        self.in_tx(ctx, &self.tags.read, true, move |repo, tx| {
            Box::pin(async move {
                repo.read(tx, &id)
                    .await
                    .context("read from repository failed")
            })
        })
        .await
    }

    pub async fn create(&self, ctx: &RequestContext, entity: Versioned<T>) -> Result<Versioned<T>> {
        self.authorizer
            .is_authorized(ctx, &self.tags.create)
            .await?;

        entity.data.validate_payload()?;

        self.in_tx(ctx, &self.tags.create, false, move |repo, tx| {
            Box::pin(async move {
                repo.create(tx, entity)
                    .await
                    .context("create in repository failed")
            })
        })
        .await
    }

    pub async fn update(&self, ctx: &RequestContext, entity: Versioned<T>) -> Result<Versioned<T>> {
        self.authorizer
            .is_authorized(ctx, &self.tags.update)
            .await?;

        entity.metadata.parse_id()?;
        entity.data.validate_payload()?;

        self.in_tx(ctx, &self.tags.update, false, move |repo, tx| {
            Box::pin(async move {
                repo.update(tx, entity)
                    .await
                    .context("update in repository failed")
            })
        })
        .await
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        self.authorizer
            .is_authorized(ctx, &self.tags.delete)
            .await?;

        parse_id(id)?;

        let id = id.to_string();
        self.in_tx(ctx, &self.tags.delete, false, move |repo, tx| {
            Box::pin(async move {
                repo.delete(tx, &id)
                    .await
                    .context("delete from repository failed")
            })
        })
        .await
    }

    /// Run `work` inside a fresh transaction, honouring the request deadline
    async fn in_tx<O, F>(
        &self,
        ctx: &RequestContext,
        operation: &OperationTag,
        read_only: bool,
        work: F,
    ) -> Result<O>
    where
        O: Send,
        F: for<'t> FnOnce(&'t R, &'t mut R::Tx) -> BoxFuture<'t, Result<O>> + Send,
    {
        let unit = async {
            // dropping `tx` on any early exit rolls it back
            let mut tx = self
                .repository
                .start_tx(read_only)
                .await
                .context("could not start tx")?;

            match work(self.repository.as_ref(), &mut tx).await {
                Ok(out) => {
                    tx.commit().await.context("could not commit tx")?;
                    tracing::debug!(operation = %operation, "transaction committed");
                    Ok(out)
                }
                Err(e) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::warn!(
                            operation = %operation,
                            error = %rollback_err,
                            "rollback failed"
                        );
                    }
                    tracing::debug!(operation = %operation, error = %e, "transaction rolled back");
                    Err(e)
                }
            }
        };

        match ctx.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, unit)
                .await
                .map_err(|elapsed| Error::internal("deadline exceeded", elapsed))?,
            None => unit.await,
        }
    }
}
