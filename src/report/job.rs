//! Report job plumbing: cooperative cancellation, progress and job state.

use crate::report::{ReportArtifact, ReportError};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Shared flag checked by the generator between units of work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), ReportError> {
        if self.is_cancelled() {
            Err(ReportError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Steps completed out of the total, updated from worker threads.
#[derive(Debug, Default)]
pub struct ReportProgress {
    done: AtomicUsize,
    total: AtomicUsize,
}

impl ReportProgress {
    pub fn start(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.done.store(0, Ordering::SeqCst);
    }

    pub fn advance(&self) {
        self.done.fetch_add(1, Ordering::SeqCst);
    }

    /// `(done, total)`
    pub fn snapshot(&self) -> (usize, usize) {
        (
            self.done.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }
}

/// Handle to a job that is still running.
#[derive(Debug, Clone)]
pub struct RunningJob {
    pub id: Uuid,
    pub token: CancellationToken,
    pub progress: Arc<ReportProgress>,
}

impl RunningJob {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            token: CancellationToken::new(),
            progress: Arc::new(ReportProgress::default()),
        }
    }
}

impl Default for RunningJob {
    fn default() -> Self {
        Self::new()
    }
}

/// Report slot owned by a session. The file is deleted once the last handle to a
/// `Ready` artifact is dropped.
#[derive(Debug, Default)]
pub enum ReportSlot {
    #[default]
    Idle,
    Running(RunningJob),
    Ready(Arc<ReportArtifact>),
    Failed(String),
    Cancelled,
}

impl ReportSlot {
    pub fn artifact(&self) -> Option<Arc<ReportArtifact>> {
        match self {
            ReportSlot::Ready(artifact) => Some(Arc::clone(artifact)),
            _ => None,
        }
    }

    pub fn running_id(&self) -> Option<Uuid> {
        match self {
            ReportSlot::Running(job) => Some(job.id),
            _ => None,
        }
    }

    /// Cancel a running job, if any.
    pub fn cancel(&mut self) {
        if let ReportSlot::Running(job) = self {
            job.token.cancel();
            *self = ReportSlot::Cancelled;
        }
    }

    /// Store a finished job's result.
    pub fn finish(&mut self, result: Result<ReportArtifact, ReportError>) {
        *self = match result {
            Ok(artifact) => ReportSlot::Ready(Arc::new(artifact)),
            Err(ReportError::Cancelled) => ReportSlot::Cancelled,
            Err(err) => ReportSlot::Failed(err.to_string()),
        };
    }

    pub fn status(&self) -> ReportStatus {
        match self {
            ReportSlot::Idle => ReportStatus::new("idle", 0, 0, ""),
            ReportSlot::Running(job) => {
                let (done, total) = job.progress.snapshot();
                ReportStatus::new("running", done, total, "Generating report... Please wait...")
            }
            ReportSlot::Ready(artifact) => ReportStatus::new(
                "ready",
                1,
                1,
                &format!(
                    "Report generated successfully at {} ({} bytes).",
                    artifact.generated_at().format("%H:%M:%S"),
                    artifact.size()
                ),
            ),
            ReportSlot::Failed(message) => ReportStatus::new("failed", 0, 0, message),
            ReportSlot::Cancelled => {
                ReportStatus::new("cancelled", 0, 0, "Report generation was cancelled.")
            }
        }
    }
}

/// JSON body of the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStatus {
    pub state: &'static str,
    pub done: usize,
    pub total: usize,
    pub message: String,
}

impl ReportStatus {
    fn new(state: &'static str, done: usize, total: usize, message: &str) -> Self {
        Self {
            state,
            done,
            total,
            message: message.to_string(),
        }
    }
}
