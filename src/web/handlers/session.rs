//! Session teardown and liveness.

use crate::web::handlers::SESSION_COOKIE;
use crate::web::state::SharedState;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use uuid::Uuid;

/// Destroy the caller's session, deleting any report file it owns.
pub async fn end_session(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        state.sessions.destroy(id).await;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}

pub async fn health() -> &'static str {
    "ok"
}
