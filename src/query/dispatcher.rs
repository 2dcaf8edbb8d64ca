//! Keyword Query Dispatcher
//! Maps a free-text question to one of three canned answers.

use crate::data::Dataset;
use crate::stats::{DescribeTable, NullCounts, StatsCalculator};
use polars::prelude::PolarsResult;
use serde::Serialize;

/// Rows shown by the fallback answer.
pub const PREVIEW_ROWS: usize = 5;

/// A non-blank question typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| Query(trimmed.to_string()))
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

/// The first rows of a dataset, rendered as text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Preview {
    pub fn of(ds: &Dataset, n: usize) -> PolarsResult<Self> {
        Ok(Self {
            columns: ds.column_names(),
            rows: ds.head_rows(n)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Response {
    Summary(DescribeTable),
    Missing(NullCounts),
    Preview(Preview),
}

/// Answers a question about a dataset.
pub trait QueryDispatcher: Send + Sync {
    fn dispatch(&self, query: &Query, ds: &Dataset) -> PolarsResult<Response>;
}

/// Case-insensitive substring rules; first match wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordDispatcher;

impl QueryDispatcher for KeywordDispatcher {
    fn dispatch(&self, query: &Query, ds: &Dataset) -> PolarsResult<Response> {
        let text = query.text().to_lowercase();

        if text.contains("summary") {
            Ok(Response::Summary(StatsCalculator::describe(ds)?))
        } else if text.contains("missing") {
            Ok(Response::Missing(StatsCalculator::null_counts_by_column(ds)))
        } else {
            Ok(Response::Preview(Preview::of(ds, PREVIEW_ROWS)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;

    fn sample() -> Dataset {
        let csv = "id,city,temp\n1,Oslo,3.5\n2,Rome,\n3,Oslo,21\n4,Lima,18\n5,Rome,25\n6,Oslo,\n7,Lima,19\n";
        DataLoader::parse_csv("weather.csv", csv.as_bytes()).unwrap()
    }

    fn ask(text: &str, ds: &Dataset) -> Response {
        KeywordDispatcher
            .dispatch(&Query::new(text).unwrap(), ds)
            .unwrap()
    }

    #[test]
    fn blank_queries_are_rejected() {
        assert!(Query::new("").is_none());
        assert!(Query::new("   \t").is_none());
        assert!(Query::new(" hi ").is_some());
    }

    #[test]
    fn summary_keyword_returns_describe_in_any_case() {
        let ds = sample();
        let expected = Response::Summary(StatsCalculator::describe(&ds).unwrap());
        assert_eq!(ask("Give me a SUMMARY please", &ds), expected);
        assert_eq!(ask("summary", &ds), expected);
    }

    #[test]
    fn missing_keyword_returns_null_counts() {
        let ds = sample();
        let expected = Response::Missing(StatsCalculator::null_counts_by_column(&ds));
        assert_eq!(ask("Which values are Missing?", &ds), expected);
    }

    #[test]
    fn summary_wins_over_missing() {
        let ds = sample();
        assert!(matches!(
            ask("missing value summary", &ds),
            Response::Summary(_)
        ));
    }

    #[test]
    fn fallback_returns_first_five_rows() {
        let ds = sample();
        match ask("What are the key trends?", &ds) {
            Response::Preview(p) => {
                assert_eq!(p.columns, vec!["id", "city", "temp"]);
                assert_eq!(p.rows.len(), 5);
                assert_eq!(p.rows[0], vec!["1", "Oslo", "3.5"]);
                assert_eq!(p.rows[1], vec!["2", "Rome", ""]);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn fallback_on_small_dataset_returns_all_rows() {
        let ds = DataLoader::parse_csv("t.csv", b"a\n1\n2\n").unwrap();
        match ask("insights", &ds) {
            Response::Preview(p) => assert_eq!(p.rows.len(), 2),
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
