//! Browser dashboard: HTTP routes, sessions and page rendering.

pub mod error;
pub mod handlers;
pub mod router;
pub mod session;
pub mod state;
pub mod views;

pub use error::AppError;
pub use router::build_router;
pub use session::{Session, SessionStore};
pub use state::{AppState, SharedState};
pub use views::{PageRenderer, PageView};
