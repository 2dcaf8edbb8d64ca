//! Axum router: maps URL paths to handlers.

use crate::web::handlers::{
    page::index,
    report::{cancel_report, download_report, report_status, start_report},
    session::{end_session, health},
    upload::upload,
};
use crate::web::state::SharedState;
use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build and return the full Axum router.
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state
        .config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        // Page
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/session/end", post(end_session))
        // Report job
        .route("/report", post(start_report))
        .route("/report/cancel", post(cancel_report))
        .route("/report/status", get(report_status))
        .route("/report/download", get(download_report))
        .route("/health", get(health))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
