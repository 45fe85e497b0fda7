//! Local HTTP server
//!
//! Sets up the Axum HTTP server with:
//! - The widget routes
//! - Middleware (request tracing, timeout, body limit)
//! - Graceful shutdown

use anyhow::Context;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::routes;
use crate::widgets::WidgetService;

/// HTTP server for local development
pub struct Server {
    config: Config,
    service: Arc<WidgetService>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config, service: Arc<WidgetService>) -> Self {
        Self { config, service }
    }

    /// Build the Axum router with all middleware
    fn build_router(&self) -> Router {
        routes::create_router(self.service.clone(), self.config.server.max_body_size).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    self.config.server.timeout_secs,
                )))
                .into_inner(),
        )
    }

    /// Start the server and run until shutdown signal
    pub async fn start<F>(&self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let app = self.build_router();

        let listener = tokio::net::TcpListener::bind(self.config.server.bind_address)
            .await
            .with_context(|| format!("binding {}", self.config.server.bind_address))?;
        info!(address = %self.config.server.bind_address, "Server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
