//! Widget Service - CRUD on widgets stored in a single S3 bucket
//!
//! Runs either as an AWS Lambda function behind an API Gateway proxy
//! integration or as a local HTTP server. Both front ends share the same
//! router, storage adapter and response envelope.

mod config;
mod envelope;
mod errors;
mod lambda;
mod routes;
mod server;
mod storage;
mod widgets;

use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, RuntimeMode};
use crate::server::Server;
use crate::widgets::WidgetService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment and optional config file
    let config = Config::from_env()?;

    // Initialize tracing with JSON output for structured logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_ansi(config.runtime == RuntimeMode::Server),
        )
        .init();

    info!(?config, "Configuration loaded");

    // The S3 client is built lazily on first use and shared afterwards
    let store = storage::create_backend(&config);
    let service = Arc::new(WidgetService::new(store));
    info!(backend = ?config.backend.backend_type, bucket = %config.backend.bucket, "Storage backend ready");

    match config.runtime {
        RuntimeMode::Lambda => lambda::run(service).await,
        RuntimeMode::Server => {
            let server = Server::new(config.clone(), service);

            // Handle graceful shutdown
            let shutdown_signal = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for shutdown signal");
                    std::future::pending::<()>().await;
                }
                info!("Received shutdown signal");
            };

            if let Err(e) = server.start(shutdown_signal).await {
                error!(error = %e, "Server error");
                return Err(e);
            }

            info!("Server shutdown complete");
            Ok(())
        }
    }
}
