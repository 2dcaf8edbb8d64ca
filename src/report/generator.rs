//! HTML Report Generator
//! Profiles a dataset and writes a standalone HTML report to a scoped temp file.

use crate::data::Dataset;
use crate::report::charts::{ChartRenderer, BAR_COLOR, MISSING_COLOR};
use crate::report::job::{CancellationToken, ReportProgress};
use crate::report::profile::{ColumnProfile, DatasetProfile, Profiler};
use crate::report::ReportError;
use crate::stats::format_stat;
use chrono::{DateTime, Local};
use minijinja::{context, Environment};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

const REPORT_TEMPLATE: &str = include_str!("../../templates/report.html");

/// A generated report. The backing file is removed when this value is dropped.
#[derive(Debug)]
pub struct ReportArtifact {
    file: NamedTempFile,
    size: u64,
    generated_at: DateTime<Local>,
}

impl ReportArtifact {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn generated_at(&self) -> DateTime<Local> {
        self.generated_at
    }
}

#[derive(Serialize)]
struct StatView {
    label: &'static str,
    value: String,
}

#[derive(Serialize)]
struct ColumnView<'a> {
    profile: &'a ColumnProfile,
    kind: &'static str,
    missing_percent: String,
    stats: Vec<StatView>,
    chart: String,
}

#[derive(Serialize)]
struct CorrelationCell {
    text: String,
    background: String,
}

#[derive(Serialize)]
struct CorrelationRow {
    name: String,
    cells: Vec<CorrelationCell>,
}

#[derive(Serialize)]
struct MissingRow {
    name: String,
    count: usize,
    percent: String,
}

/// Builds profiling reports into a directory of temp files.
pub struct ReportGenerator {
    env: Environment<'static>,
    dir: PathBuf,
}

impl ReportGenerator {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let mut env = Environment::new();
        env.add_template("report.html", REPORT_TEMPLATE)?;
        Ok(Self {
            env,
            dir: dir.into(),
        })
    }

    /// Profile, render and write the report. Blocking.
    pub fn generate(
        &self,
        ds: &Dataset,
        token: &CancellationToken,
        progress: &ReportProgress,
    ) -> Result<ReportArtifact, ReportError> {
        let profile = Profiler::profile(ds, token, progress)?;
        token.check()?;

        let generated_at = Local::now();
        let html = self.render(ds, &profile, generated_at)?;
        token.check()?;

        let mut file = tempfile::Builder::new()
            .prefix("data-insight-report-")
            .suffix(".html")
            .tempfile_in(&self.dir)?;
        file.write_all(html.as_bytes())?;
        file.flush()?;

        info!(
            dataset = ds.file_name(),
            path = %file.path().display(),
            bytes = html.len(),
            "report written"
        );

        Ok(ReportArtifact {
            file,
            size: html.len() as u64,
            generated_at,
        })
    }

    /// Render the report document for an already computed profile.
    pub fn render(
        &self,
        ds: &Dataset,
        profile: &DatasetProfile,
        generated_at: DateTime<Local>,
    ) -> Result<String, ReportError> {
        let columns = profile
            .columns
            .par_iter()
            .map(Self::column_view)
            .collect::<Result<Vec<_>, ReportError>>()?;

        let (names, counts): (Vec<String>, Vec<usize>) = profile
            .missing
            .per_column
            .iter()
            .map(|(name, count, _)| (name.clone(), *count))
            .unzip();
        let missing_chart = ChartRenderer::bar_chart_svg(&names, &counts, MISSING_COLOR)?;
        let missing_rows: Vec<MissingRow> = profile
            .missing
            .per_column
            .iter()
            .map(|(name, count, pct)| MissingRow {
                name: name.clone(),
                count: *count,
                percent: format!("{:.1}%", pct),
            })
            .collect();

        let correlation_rows: Vec<CorrelationRow> = profile
            .correlations
            .columns
            .iter()
            .zip(profile.correlations.matrix.iter())
            .map(|(name, row)| CorrelationRow {
                name: name.clone(),
                cells: row.iter().map(|r| correlation_cell(*r)).collect(),
            })
            .collect();

        debug!(columns = columns.len(), "rendering report template");

        let template = self.env.get_template("report.html")?;
        let html = template.render(context! {
            file_name => ds.file_name(),
            generated_at => generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            overview => &profile.overview,
            missing_percent => format!("{:.1}%", profile.overview.missing_percent),
            columns => columns,
            correlation_columns => &profile.correlations.columns,
            correlation_rows => correlation_rows,
            missing_rows => missing_rows,
            missing_chart => missing_chart,
            rows_with_missing => profile.missing.rows_with_missing,
            complete_rows => profile.missing.complete_rows,
        })?;
        Ok(html)
    }

    fn column_view(profile: &ColumnProfile) -> Result<ColumnView<'_>, ReportError> {
        let (stats, chart) = match &profile.numeric {
            Some(numeric) => {
                let s = &numeric.summary;
                let stats = vec![
                    stat("mean", s.mean),
                    stat("std", s.std),
                    stat("min", s.min),
                    stat("25%", s.q25),
                    stat("50%", s.median),
                    stat("75%", s.q75),
                    stat("max", s.max),
                    stat("range", numeric.range),
                    stat("IQR", numeric.iqr),
                    stat("skewness", numeric.skewness),
                    stat("kurtosis", numeric.kurtosis),
                    StatView {
                        label: "zeros",
                        value: numeric.zeros.to_string(),
                    },
                ];
                (stats, ChartRenderer::histogram_svg(&numeric.histogram)?)
            }
            None => {
                let labels: Vec<String> =
                    profile.top_values.iter().map(|v| v.value.clone()).collect();
                let counts: Vec<usize> = profile.top_values.iter().map(|v| v.count).collect();
                (
                    Vec::new(),
                    ChartRenderer::bar_chart_svg(&labels, &counts, BAR_COLOR)?,
                )
            }
        };

        Ok(ColumnView {
            profile,
            kind: profile.kind.label(),
            missing_percent: format!("{:.1}%", profile.missing_percent),
            stats,
            chart,
        })
    }
}

fn stat(label: &'static str, value: f64) -> StatView {
    StatView {
        label,
        value: format_stat(value),
    }
}

/// Blue for positive, red for negative, opacity by magnitude.
fn correlation_cell(r: Option<f64>) -> CorrelationCell {
    match r {
        Some(r) => {
            let (red, green, blue) = if r >= 0.0 { (74, 71, 163) } else { (231, 76, 60) };
            CorrelationCell {
                text: format!("{:.2}", r),
                background: format!("rgba({red},{green},{blue},{:.2})", r.abs() * 0.85),
            }
        }
        None => CorrelationCell {
            text: "n/a".to_string(),
            background: "transparent".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;
    use crate::report::ReportSlot;

    fn generator(dir: &Path) -> ReportGenerator {
        ReportGenerator::new(dir).unwrap()
    }

    fn sample() -> Dataset {
        let csv = "id,city,temp,rain\n1,Oslo,3.5,true\n2,Rome,,false\n3,Oslo,21,true\n4,Lima,18,\n";
        DataLoader::parse_csv("weather.csv", csv.as_bytes()).unwrap()
    }

    #[test]
    fn report_is_a_non_empty_html_document() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = generator(dir.path())
            .generate(
                &sample(),
                &CancellationToken::new(),
                &ReportProgress::default(),
            )
            .unwrap();

        let content = std::fs::read_to_string(artifact.path()).unwrap();
        assert!(content.starts_with("<!DOCTYPE html>"));
        assert!(artifact.size() > 0);
        assert_eq!(artifact.size(), content.len() as u64);
        assert!(content.contains("weather.csv"));
        assert!(content.contains("<svg"));
        assert!(artifact.path().starts_with(dir.path()));
    }

    #[test]
    fn ready_status_reports_generation_time() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = generator(dir.path())
            .generate(
                &sample(),
                &CancellationToken::new(),
                &ReportProgress::default(),
            )
            .unwrap();
        let stamp = artifact.generated_at().format("%H:%M:%S").to_string();

        let mut slot = ReportSlot::Idle;
        slot.finish(Ok(artifact));
        let status = slot.status();
        assert_eq!(status.state, "ready");
        assert!(status.message.contains(&stamp), "{}", status.message);
    }

    #[test]
    fn dropping_the_artifact_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = generator(dir.path())
            .generate(
                &sample(),
                &CancellationToken::new(),
                &ReportProgress::default(),
            )
            .unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn cancelled_generation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = generator(dir.path())
            .generate(&sample(), &token, &ReportProgress::default())
            .unwrap_err();
        assert!(matches!(err, ReportError::Cancelled));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_output_directory_is_a_visible_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("does-not-exist");
        let err = generator(&gone)
            .generate(
                &sample(),
                &CancellationToken::new(),
                &ReportProgress::default(),
            )
            .unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }

    #[test]
    fn user_text_is_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let ds = DataLoader::parse_csv("x.csv", b"<b>name</b>\n<script>\n").unwrap();
        let artifact = generator(dir.path())
            .generate(&ds, &CancellationToken::new(), &ReportProgress::default())
            .unwrap();
        let content = std::fs::read_to_string(artifact.path()).unwrap();
        assert!(!content.contains("<script>"));
        assert!(content.contains("&lt;b&gt;name"));
    }

    #[test]
    fn correlation_cells_are_colored_by_sign() {
        assert!(correlation_cell(Some(0.5)).background.starts_with("rgba(74,71,163"));
        assert!(correlation_cell(Some(-0.5)).background.starts_with("rgba(231,76,60"));
        assert_eq!(correlation_cell(None).text, "n/a");
    }
}
