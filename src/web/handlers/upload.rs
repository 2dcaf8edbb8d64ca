//! CSV upload.

use crate::web::error::AppError;
use crate::web::handlers::{render_page, session_id};
use crate::web::state::SharedState;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::{info, warn};

/// Name of the multipart field carrying the file.
pub const FILE_FIELD: &str = "file";

/// Parse the uploaded file into the session's dataset. On failure the previous dataset
/// is dropped and the page is re-rendered with the error.
pub async fn upload(
    State(state): State<SharedState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let (jar, id) = session_id(&state, jar).await;

    let loaded = match read_file_field(&mut multipart).await {
        Ok((file_name, bytes)) => {
            let loader = state.loader.clone();
            tokio::task::spawn_blocking(move || loader.load_upload(file_name.as_deref(), &bytes))
                .await?
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => Err((e.status(), format!("Upload failed: {}", e.body_text()))),
    };

    match loaded {
        Ok(ds) => {
            info!(
                session = %id,
                file = ds.file_name(),
                rows = ds.height(),
                columns = ds.width(),
                "dataset loaded"
            );
            state
                .sessions
                .with_session(id, |s| s.replace_dataset(Arc::new(ds)))
                .await;
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err((status, message)) => {
            warn!(session = %id, %status, error = %message, "upload rejected");
            state
                .sessions
                .with_session(id, |s| s.clear_dataset())
                .await;
            let page = render_page(&state, id, None, Some(message)).await?;
            Ok((status, jar, page).into_response())
        }
    }
}

async fn read_file_field(
    multipart: &mut Multipart,
) -> Result<(Option<String>, Bytes), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            return Ok((file_name, bytes));
        }
    }
    Ok((None, Bytes::new()))
}
