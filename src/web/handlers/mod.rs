//! HTTP handlers for all web routes.

pub mod page;
pub mod report;
pub mod session;
pub mod upload;

use crate::query::Query;
use crate::report::ReportSlot;
use crate::web::error::AppError;
use crate::web::state::SharedState;
use crate::web::views::PageView;
use axum::response::Html;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "data_insight_session";

/// Resolve the caller's session, issuing a cookie when a new one was created.
pub(crate) async fn session_id(state: &SharedState, jar: CookieJar) -> (CookieJar, Uuid) {
    let presented = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());
    let id = state.sessions.resolve(presented).await;
    if presented == Some(id) {
        return (jar, id);
    }

    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}

/// Re-render the whole page from the session's current state.
pub(crate) async fn render_page(
    state: &SharedState,
    id: Uuid,
    query: Option<Query>,
    error: Option<String>,
) -> Result<Html<String>, AppError> {
    let (dataset, report) = state
        .sessions
        .with_session(id, |s| (s.dataset.clone(), s.report.status()))
        .await
        .unwrap_or_else(|| (None, ReportSlot::default().status()));

    let state = Arc::clone(state);
    let html = tokio::task::spawn_blocking(move || -> Result<String, AppError> {
        let view = PageView::build(
            dataset.as_deref(),
            query.as_ref(),
            state.dispatcher.as_ref(),
            report,
            state.config.grid_rows,
            state.config.max_upload_bytes,
        )?
        .with_error(error);
        Ok(state.views.render(&view)?)
    })
    .await??;

    Ok(Html(html))
}
