//! ServerBuilder for fluent API to build HTTP servers

use super::handlers::{ResourceState, path_not_found};
use super::router::{health_routes, resource_routes};
use crate::core::entity::{Resource, Versioned};
use crate::core::repository::Repository;
use crate::core::service::EntityService;
use anyhow::Result;
use axum::Router;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for creating HTTP servers with registered resource routes
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_request_timeout(Duration::from_secs(5))
///     .register_resource(ticket_service)
///     .build();
/// ```
pub struct ServerBuilder {
    routes: Vec<Router>,
    request_timeout: Option<Duration>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            request_timeout: None,
        }
    }

    /// Abandon and roll back any unit of work running longer than `timeout`
    ///
    /// Applies to resources registered after this call.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Expose a resource service under `/api/v1/{plural}`
    pub fn register_resource<T, R>(mut self, service: EntityService<T, R>) -> Self
    where
        T: Resource,
        R: Repository<Versioned<T>> + 'static,
    {
        let mut state = ResourceState::new(service);
        if let Some(timeout) = self.request_timeout {
            state = state.with_request_timeout(timeout);
        }

        tracing::debug!(resource = T::resource_name(), "registering resource routes");
        self.routes.push(resource_routes(state));
        self
    }

    /// Build the final router
    ///
    /// Unmatched paths answer with a 404 problem.
    pub fn build(self) -> Router {
        let mut app = health_routes();

        for router in self.routes {
            app = app.merge(router);
        }

        app.fallback(path_not_found)
            .layer(TraceLayer::new_for_http())
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to the provided address
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build();
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
