//! `site_server`: HTTP backend for the terminal portfolio.

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use anyhow::Context;
use site::{router, AppState, LocalBlobStore, ServerConfig, SqliteStore};
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let store = SqliteStore::open(&config.database_path).with_context(|| {
        format!("failed to open database {}", config.database_path.display())
    })?;
    let blobs = LocalBlobStore::new(&config.blob_root).with_context(|| {
        format!("failed to prepare blob root {}", config.blob_root.display())
    })?;
    if config.admin_password.is_none() {
        tracing::warn!("SITE_ADMIN_PASSWORD is unset; admin routes will answer 503");
    }

    let state = AppState::new(Arc::new(store), Arc::new(blobs), &config);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "site_server listening");

    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    tracing::info!("site_server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
