//! Ticket service over HTTP
//!
//! This example demonstrates:
//! - Loading configuration from YAML plus environment overrides
//! - The in-memory store, or PostgreSQL with `--features postgres`
//! - Querying with filters, sorting and pagination
//!
//! ```sh
//! cargo run --example ticket_server -- demos/ticket_server/config.yaml
//!
//! curl -X POST localhost:8080/api/v1/tickets \
//!      -H 'content-type: application/json' \
//!      -d '{"summary": "Printer jam", "status": "open"}'
//! curl 'localhost:8080/api/v1/tickets?filter=status==open&sort=summary+asc&page=1&size=10'
//! ```

use std::path::PathBuf;
use std::time::Duration;
use ticket::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,ticket=debug")),
        )
        .init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;

    let authorizer: Arc<dyn Authorizer> = Arc::new(AlwaysAuthorize);

    let builder = ServerBuilder::new().with_request_timeout(Duration::from_secs(10));

    #[cfg(feature = "postgres")]
    let builder = {
        use ticket::storage::postgres::{connect, ensure_schema};

        let pool = connect(&config.database).await?;
        ensure_schema(&pool).await?;
        tracing::info!(host = %config.database.host, database = %config.database.database, "using PostgreSQL");

        let service = EntityService::<Ticket, _>::new(PostgresTicketRepository::new(pool), authorizer)?
            .with_defaults(config.query);
        builder.register_resource(service)
    };

    #[cfg(not(feature = "postgres"))]
    let builder = {
        tracing::info!("using in-memory store");
        let service = EntityService::<Ticket, _>::new(InMemoryRepository::new(), authorizer)?
            .with_defaults(config.query);
        builder.register_resource(service)
    };

    builder.serve(&format!("0.0.0.0:{}", config.api.port)).await
}
