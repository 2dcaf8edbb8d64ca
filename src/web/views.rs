//! Page view model and template rendering.

use crate::data::Dataset;
use crate::query::{Preview, Query, QueryDispatcher, Response};
use crate::report::ReportStatus;
use crate::stats::StatsCalculator;
use minijinja::Environment;
use polars::prelude::PolarsResult;
use serde::Serialize;

const PAGE_TEMPLATE: &str = include_str!("../../templates/page.html");

/// Dataset-dependent part of the page.
#[derive(Debug, Serialize)]
pub struct DatasetView {
    pub file_name: String,
    pub rows: usize,
    pub columns: usize,
    pub missing: usize,
    pub grid: Preview,
    pub grid_truncated: bool,
}

impl DatasetView {
    pub fn build(ds: &Dataset, grid_rows: usize) -> PolarsResult<Self> {
        Ok(Self {
            file_name: ds.file_name().to_string(),
            rows: StatsCalculator::row_count(ds),
            columns: StatsCalculator::column_count(ds),
            missing: StatsCalculator::missing_count(ds),
            grid: Preview::of(ds, grid_rows)?,
            grid_truncated: ds.height() > grid_rows,
        })
    }
}

/// A dispatched answer flattened into a header row and body rows.
#[derive(Debug, PartialEq, Serialize)]
pub struct AnswerView {
    pub intro: Option<&'static str>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl From<Response> for AnswerView {
    fn from(response: Response) -> Self {
        match response {
            Response::Summary(table) => {
                let mut header = vec![String::new()];
                header.extend(table.columns.iter().cloned());
                let rows = table
                    .rows()
                    .into_iter()
                    .map(|row| {
                        let mut cells = vec![row.label.to_string()];
                        cells.extend(row.cells);
                        cells
                    })
                    .collect();
                Self {
                    intro: None,
                    header,
                    rows,
                }
            }
            Response::Missing(counts) => Self {
                intro: None,
                header: vec!["column".to_string(), "missing".to_string()],
                rows: counts
                    .entries
                    .into_iter()
                    .map(|(name, n)| vec![name, n.to_string()])
                    .collect(),
            },
            Response::Preview(preview) => Self {
                intro: Some("Here are some quick insights:"),
                header: preview.columns,
                rows: preview.rows,
            },
        }
    }
}

/// Everything the page template needs for one render.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub error: Option<String>,
    pub dataset: Option<DatasetView>,
    pub query: Option<String>,
    pub answer: Option<AnswerView>,
    pub report: ReportStatus,
    pub max_upload_mb: usize,
}

impl PageView {
    /// Assemble the page from a session snapshot. CPU-bound on large datasets.
    pub fn build(
        ds: Option<&Dataset>,
        query: Option<&Query>,
        dispatcher: &dyn QueryDispatcher,
        report: ReportStatus,
        grid_rows: usize,
        max_upload_bytes: usize,
    ) -> PolarsResult<Self> {
        let dataset = ds.map(|ds| DatasetView::build(ds, grid_rows)).transpose()?;
        let answer = match (ds, query) {
            (Some(ds), Some(query)) => Some(dispatcher.dispatch(query, ds)?.into()),
            _ => None,
        };

        Ok(Self {
            error: None,
            dataset,
            query: query.map(|q| q.text().to_string()),
            answer,
            report,
            max_upload_mb: max_upload_bytes / (1024 * 1024),
        })
    }

    pub fn with_error(mut self, error: Option<String>) -> Self {
        self.error = error;
        self
    }
}

/// Renders the dashboard page.
pub struct PageRenderer {
    env: Environment<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("page.html", PAGE_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn render(&self, view: &PageView) -> Result<String, minijinja::Error> {
        self.env.get_template("page.html")?.render(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;
    use crate::query::KeywordDispatcher;
    use crate::report::{ReportSlot, RunningJob};

    fn sample() -> Dataset {
        DataLoader::parse_csv("people.csv", b"name,age\nAda,36\nAlan,\nGrace,85\n").unwrap()
    }

    fn build(ds: Option<&Dataset>, q: &str, grid_rows: usize) -> PageView {
        PageView::build(
            ds,
            Query::new(q).as_ref(),
            &KeywordDispatcher,
            ReportSlot::Idle.status(),
            grid_rows,
            200 * 1024 * 1024,
        )
        .unwrap()
    }

    #[test]
    fn dataset_cards_and_truncated_grid() {
        let ds = sample();
        let view = build(Some(&ds), "", 2);
        let data = view.dataset.unwrap();
        assert_eq!((data.rows, data.columns, data.missing), (3, 2, 1));
        assert_eq!(data.grid.rows.len(), 2);
        assert!(data.grid_truncated);
        assert!(view.answer.is_none());
        assert_eq!(view.max_upload_mb, 200);
    }

    #[test]
    fn missing_answer_lists_each_column() {
        let ds = sample();
        let answer = build(Some(&ds), "Any MISSING values?", 10).answer.unwrap();
        assert_eq!(answer.header, vec!["column", "missing"]);
        assert_eq!(
            answer.rows,
            vec![vec!["name".to_string(), "0".to_string()], vec!["age".to_string(), "1".to_string()]]
        );
    }

    #[test]
    fn summary_answer_leads_with_stat_labels() {
        let ds = sample();
        let answer = build(Some(&ds), "summary please", 10).answer.unwrap();
        assert_eq!(answer.header, vec!["", "name", "age"]);
        assert_eq!(answer.rows[0][0], "count");
        assert!(answer.intro.is_none());
    }

    #[test]
    fn no_dataset_means_no_answer() {
        let view = build(None, "summary", 10);
        assert!(view.dataset.is_none());
        assert!(view.answer.is_none());
        assert_eq!(view.query.as_deref(), Some("summary"));
    }

    #[test]
    fn page_renders_escaped_error_and_cards() {
        let ds = sample();
        let renderer = PageRenderer::new().unwrap();
        let view = build(Some(&ds), "trends?", 10).with_error(Some("<bad>".to_string()));
        let html = renderer.render(&view).unwrap();
        assert!(html.contains("&lt;bad&gt;"));
        assert!(html.contains("people.csv"));
        assert!(html.contains("Here are some quick insights:"));
        assert!(html.contains("Grace"));
    }

    fn render_with_report(slot: ReportSlot) -> String {
        let ds = sample();
        let view = PageView::build(
            Some(&ds),
            None,
            &KeywordDispatcher,
            slot.status(),
            10,
            200 * 1024 * 1024,
        )
        .unwrap();
        PageRenderer::new().unwrap().render(&view).unwrap()
    }

    #[test]
    fn failed_report_shows_message_without_download() {
        let html = render_with_report(ReportSlot::Failed("boom".to_string()));
        assert!(html.contains("Report generation failed: boom"));
        assert!(!html.contains("/report/download"));
        assert!(html.contains("action=\"/report\""));
    }

    #[test]
    fn cancelled_report_offers_restart_without_download() {
        let html = render_with_report(ReportSlot::Cancelled);
        assert!(html.contains("Report generation was cancelled."));
        assert!(!html.contains("/report/download"));
        assert!(!html.contains("/report/status"));
    }

    #[test]
    fn running_report_shows_cancel_and_poller() {
        let html = render_with_report(ReportSlot::Running(RunningJob::new()));
        assert!(html.contains("class=\"spinner\""));
        assert!(html.contains("action=\"/report/cancel\""));
        assert!(html.contains("/report/status"));
        assert!(!html.contains("/report/download"));
    }

    #[test]
    fn upload_form_only_without_dataset() {
        let renderer = PageRenderer::new().unwrap();
        let html = renderer.render(&build(None, "", 10)).unwrap();
        assert!(html.contains("action=\"/upload\""));
        assert!(!html.contains("Basic Dataset Info"));
    }
}
