//! Shared application state for the web server.

use crate::config::Config;
use crate::data::DataLoader;
use crate::query::{KeywordDispatcher, QueryDispatcher};
use crate::report::{ReportError, ReportGenerator};
use crate::web::session::SessionStore;
use crate::web::views::PageRenderer;
use std::sync::Arc;

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub loader: DataLoader,
    pub dispatcher: Arc<dyn QueryDispatcher>,
    pub reports: Arc<ReportGenerator>,
    pub views: PageRenderer,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, ReportError> {
        Self::with_dispatcher(config, Arc::new(KeywordDispatcher))
    }

    /// Build state around a custom question answerer.
    pub fn with_dispatcher(
        config: Config,
        dispatcher: Arc<dyn QueryDispatcher>,
    ) -> Result<Self, ReportError> {
        Ok(Self {
            loader: DataLoader::new(config.max_upload_bytes),
            reports: Arc::new(ReportGenerator::new(config.report_dir.clone())?),
            views: PageRenderer::new()?,
            sessions: SessionStore::new(),
            dispatcher,
            config,
        })
    }
}

pub type SharedState = Arc<AppState>;
