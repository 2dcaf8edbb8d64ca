//! Query module - keyword question answering

mod dispatcher;

pub use dispatcher::{KeywordDispatcher, Preview, Query, QueryDispatcher, Response, PREVIEW_ROWS};
