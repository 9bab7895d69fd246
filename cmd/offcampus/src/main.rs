//! offcampus/cmd/offcampus/src/main.rs
//!
//! Composition root: loads settings, opens the store, wires the identity
//! provider and services, and serves HTTP plus the chat WebSocket.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::AppState;
use auth_adapters::JwtIdentityProvider;
use configs::{LogFormat, LogSettings, Settings};
use storage_adapters::SqliteStore;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading configuration")?;
    init_tracing(&settings.log);

    let store = Arc::new(
        SqliteStore::connect(&settings.database.url, settings.database.max_connections)
            .await
            .context("opening the database")?,
    );
    let identity = Arc::new(JwtIdentityProvider::new(
        &settings.auth.jwt_secret,
        chrono::Duration::seconds(settings.auth.token_ttl_secs),
    ));

    let state = AppState::new(store, identity, settings.chat.channel_capacity);
    let app = api_adapters::router(state);

    let addr = settings.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "offcampus listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("offcampus stopped");
    Ok(())
}

/// `RUST_LOG` takes precedence over the configured filter.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match log.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received, draining connections");
}
