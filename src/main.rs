//! Data Insight - browser dashboard for CSV analysis
//!
//! Serves the upload page, quick statistics and profiling reports over HTTP.

use anyhow::Context;
use data_insight::config::{Arguments, Config};
use data_insight::web::{build_router, AppState};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Arguments::build();
    let config = Config::from_args(&args)?;
    info!(
        addr = %config.addr,
        report_dir = %config.report_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        "starting Data Insight"
    );

    let state = Arc::new(AppState::new(config.clone()).context("failed to initialise templates")?);
    let reaper = state
        .sessions
        .spawn_reaper(config.session_ttl, config.reap_interval);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    info!("listening on http://{}", config.addr);

    axum::serve(listener, build_router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reaper.abort();
    let dropped = state.sessions.clear().await;
    info!(sessions = dropped, "shut down, report files removed");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
