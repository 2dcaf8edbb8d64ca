//! Report job control and download.

use crate::data::Dataset;
use crate::report::{ReportError, ReportSlot, ReportStatus, RunningJob};
use crate::web::error::AppError;
use crate::web::handlers::session_id;
use crate::web::state::SharedState;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::response::{IntoResponse, Redirect};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const DOWNLOAD_FILE_NAME: &str = "sweetviz_report.html";

/// Start profiling the session's dataset. No-op without a dataset or while a job runs.
pub async fn start_report(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, id) = session_id(&state, jar).await;

    let started = state
        .sessions
        .with_session(id, |s| {
            let ds = s.dataset.clone()?;
            if s.report.running_id().is_some() {
                return None;
            }
            let job = RunningJob::new();
            s.report = ReportSlot::Running(job.clone());
            Some((ds, job))
        })
        .await
        .flatten();

    if let Some((ds, job)) = started {
        spawn_job(Arc::clone(&state), id, ds, job);
    }
    (jar, Redirect::to("/"))
}

fn spawn_job(state: SharedState, session: Uuid, ds: Arc<Dataset>, job: RunningJob) {
    info!(%session, job = %job.id, dataset = ds.file_name(), "report job started");

    tokio::spawn(async move {
        let generator = Arc::clone(&state.reports);
        let token = job.token.clone();
        let progress = Arc::clone(&job.progress);
        let result = tokio::task::spawn_blocking(move || generator.generate(&ds, &token, &progress))
            .await
            .unwrap_or_else(|e| Err(ReportError::Worker(e.to_string())));

        match &result {
            Ok(artifact) => info!(%session, job = %job.id, bytes = artifact.size(), "report job finished"),
            Err(ReportError::Cancelled) => info!(%session, job = %job.id, "report job cancelled"),
            Err(e) => error!(%session, job = %job.id, error = %e, "report job failed"),
        }

        let job_id = job.id;
        let stored = state
            .sessions
            .with_session(session, move |s| {
                if s.report.running_id() == Some(job_id) {
                    s.report.finish(result);
                    true
                } else {
                    false
                }
            })
            .await;
        if stored != Some(true) {
            debug!(%session, job = %job_id, "stale report result discarded");
        }
    });
}

pub async fn cancel_report(State(state): State<SharedState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, id) = session_id(&state, jar).await;
    let cancelled = state
        .sessions
        .with_session(id, |s| {
            let running = s.report.running_id();
            s.report.cancel();
            running
        })
        .await
        .flatten();
    if let Some(job) = cancelled {
        info!(session = %id, %job, "report cancel requested");
    }
    (jar, Redirect::to("/"))
}

pub async fn report_status(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> (CookieJar, Json<ReportStatus>) {
    let (jar, id) = session_id(&state, jar).await;
    let status = state
        .sessions
        .with_session(id, |s| s.report.status())
        .await
        .unwrap_or_else(|| ReportSlot::default().status());
    (jar, Json(status))
}

/// Stream the finished report as an HTML attachment.
pub async fn download_report(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let (jar, id) = session_id(&state, jar).await;
    let artifact = state
        .sessions
        .with_session(id, |s| s.report.artifact())
        .await
        .flatten()
        .ok_or(AppError::ReportNotFound)?;

    let file = tokio::fs::File::open(artifact.path()).await?;
    let length = file.metadata().await?.len();
    let stream = ReaderStream::new(file);

    Ok((
        jar,
        [
            (CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (CONTENT_LENGTH, length.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""),
            ),
        ],
        Body::from_stream(stream),
    ))
}
