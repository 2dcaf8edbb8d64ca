//! The dashboard page.

use crate::query::Query;
use crate::web::error::AppError;
use crate::web::handlers::{render_page, session_id};
use crate::web::state::SharedState;
use axum::extract::{self, State};
use axum::response::Html;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub q: Option<String>,
}

pub async fn index(
    State(state): State<SharedState>,
    jar: CookieJar,
    extract::Query(params): extract::Query<PageParams>,
) -> Result<(CookieJar, Html<String>), AppError> {
    let (jar, id) = session_id(&state, jar).await;
    let query = params.q.as_deref().and_then(Query::new);
    let page = render_page(&state, id, query, None).await?;
    Ok((jar, page))
}
