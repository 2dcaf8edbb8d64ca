//! Session-scoped state: the current dataset and report slot of one browser.

use crate::data::Dataset;
use crate::report::ReportSlot;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

/// One user's context. Dropping it cancels a running report and deletes report files.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub dataset: Option<Arc<Dataset>>,
    pub report: ReportSlot,
    last_seen: Instant,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            dataset: None,
            report: ReportSlot::Idle,
            last_seen: Instant::now(),
        }
    }

    /// Install a freshly uploaded dataset, discarding the previous one and its report.
    pub fn replace_dataset(&mut self, ds: Arc<Dataset>) {
        self.report.cancel();
        self.report = ReportSlot::Idle;
        self.dataset = Some(ds);
    }

    /// Forget the current dataset after a failed upload.
    pub fn clear_dataset(&mut self) {
        self.report.cancel();
        self.report = ReportSlot::Idle;
        self.dataset = None;
    }

    fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_seen)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.report.cancel();
    }
}

/// All live sessions, keyed by the id stored in the session cookie.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Touch the session for `id`, or create a new one when it is unknown.
    pub async fn resolve(&self, id: Option<Uuid>) -> Uuid {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = id.and_then(|id| sessions.get_mut(&id)) {
            session.touch();
            return session.id;
        }

        let id = Uuid::new_v4();
        sessions.insert(id, Session::new(id));
        debug!(session = %id, "session created");
        id
    }

    /// Run `f` against a session without refreshing its idle timer.
    pub async fn with_session<R>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.lock().await;
        sessions.get_mut(&id).map(f)
    }

    pub async fn destroy(&self, id: Uuid) -> bool {
        let removed = self.sessions.lock().await.remove(&id);
        if removed.is_some() {
            info!(session = %id, "session ended");
        }
        removed.is_some()
    }

    /// Drop sessions idle for longer than `ttl`. Returns how many were removed.
    pub async fn reap_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.idle_for(now) <= ttl);
        before - sessions.len()
    }

    /// Drop every session, used at shutdown.
    pub async fn clear(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let count = sessions.len();
        sessions.clear();
        count
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Periodically expire idle sessions.
    pub fn spawn_reaper(&self, ttl: Duration, every: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = store.reap_idle(ttl).await;
                if removed > 0 {
                    info!(removed, "expired idle sessions");
                }
            }
        })
    }
}
