//! Data module - CSV loading and the in-memory dataset

mod dataset;
mod loader;

pub use dataset::{format_float, ColumnKind, Dataset};
pub use loader::{DataLoader, LoaderError, NULL_VALUES};
