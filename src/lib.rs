//! Data Insight - CSV dashboard with quick statistics, keyword questions and
//! downloadable profiling reports.

pub mod config;
pub mod data;
pub mod query;
pub mod report;
pub mod stats;
pub mod web;
