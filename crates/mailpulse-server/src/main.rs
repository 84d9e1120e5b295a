//! MailPulse - Tracking server entry point

use anyhow::{Context, Result};
use mailpulse_api::{create_router, AppState};
use mailpulse_common::config::{Config, LoggingConfig};
use mailpulse_core::SmtpMailer;
use mailpulse_storage::Datastore;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting MailPulse tracking server...");

    // Initialize datastore (runs migrations for PostgreSQL)
    let store = Datastore::from_config(&config.database).await?;
    info!(backend = store.backend(), "Datastore ready");

    // Initialize outbound mail
    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);

    let state = AppState::new(store.clone(), mailer, &config.tracking)?;
    let app = create_router(state);

    let addr = config.server.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        address = %addr,
        base_url = %config.tracking.base_url,
        "MailPulse server started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    // Cleanup
    store.close().await;

    info!("MailPulse server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
