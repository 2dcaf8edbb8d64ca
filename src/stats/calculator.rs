//! Statistics Calculator Module
//! Handles dataset-level counts and per-column descriptive statistics.

use crate::data::{ColumnKind, Dataset};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Numeric column statistics.
#[derive(Debug, Clone, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl Default for NumericSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            q25: f64::NAN,
            median: f64::NAN,
            q75: f64::NAN,
            max: f64::NAN,
        }
    }
}

// NaN compares equal to NaN so identical inputs give identical summaries.
impl PartialEq for NumericSummary {
    fn eq(&self, other: &Self) -> bool {
        fn same(a: f64, b: f64) -> bool {
            a == b || (a.is_nan() && b.is_nan())
        }
        self.count == other.count
            && same(self.mean, other.mean)
            && same(self.std, other.std)
            && same(self.min, other.min)
            && same(self.q25, other.q25)
            && same(self.median, other.median)
            && same(self.q75, other.q75)
            && same(self.max, other.max)
    }
}

/// Non-numeric column statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    pub top: Option<String>,
    pub freq: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ColumnSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

impl ColumnSummary {
    pub fn count(&self) -> usize {
        match self {
            ColumnSummary::Numeric(s) => s.count,
            ColumnSummary::Categorical(s) => s.count,
        }
    }
}

/// One labelled row of the describe table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeRow {
    pub label: &'static str,
    pub cells: Vec<String>,
}

/// Output of `describe()`: one summary per column, in column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescribeTable {
    pub columns: Vec<String>,
    pub summaries: Vec<ColumnSummary>,
}

impl DescribeTable {
    /// Row labels present in the table, in display order.
    pub fn labels(&self) -> Vec<&'static str> {
        let has_numeric = self
            .summaries
            .iter()
            .any(|s| matches!(s, ColumnSummary::Numeric(_)));
        let has_categorical = self
            .summaries
            .iter()
            .any(|s| matches!(s, ColumnSummary::Categorical(_)));

        let mut labels = vec!["count"];
        if has_categorical {
            labels.extend(["unique", "top", "freq"]);
        }
        if has_numeric {
            labels.extend(["mean", "std", "min", "25%", "50%", "75%", "max"]);
        }
        labels
    }

    /// Table body as text, `NaN` where a statistic does not apply.
    pub fn rows(&self) -> Vec<DescribeRow> {
        self.labels()
            .into_iter()
            .map(|label| DescribeRow {
                label,
                cells: self.summaries.iter().map(|s| cell(s, label)).collect(),
            })
            .collect()
    }
}

fn cell(summary: &ColumnSummary, label: &str) -> String {
    const NA: &str = "NaN";
    match (summary, label) {
        (s, "count") => s.count().to_string(),
        (ColumnSummary::Categorical(c), "unique") => c.unique.to_string(),
        (ColumnSummary::Categorical(c), "top") => c.top.clone().unwrap_or_else(|| NA.into()),
        (ColumnSummary::Categorical(c), "freq") => {
            c.freq.map(|f| f.to_string()).unwrap_or_else(|| NA.into())
        }
        (ColumnSummary::Numeric(n), "mean") => format_stat(n.mean),
        (ColumnSummary::Numeric(n), "std") => format_stat(n.std),
        (ColumnSummary::Numeric(n), "min") => format_stat(n.min),
        (ColumnSummary::Numeric(n), "25%") => format_stat(n.q25),
        (ColumnSummary::Numeric(n), "50%") => format_stat(n.median),
        (ColumnSummary::Numeric(n), "75%") => format_stat(n.q75),
        (ColumnSummary::Numeric(n), "max") => format_stat(n.max),
        _ => NA.into(),
    }
}

/// Six-decimal formatting with trailing zeros trimmed (`2.0`, `1.414214`).
pub fn format_stat(v: f64) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let s = format!("{:.6}", v);
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Per-column null counts, in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NullCounts {
    pub entries: Vec<(String, usize)>,
}

impl NullCounts {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    pub fn row_count(ds: &Dataset) -> usize {
        ds.height()
    }

    pub fn column_count(ds: &Dataset) -> usize {
        ds.width()
    }

    /// Total number of null cells across all columns.
    pub fn missing_count(ds: &Dataset) -> usize {
        ds.dataframe()
            .get_columns()
            .iter()
            .map(|col| col.null_count())
            .sum()
    }

    pub fn null_counts_by_column(ds: &Dataset) -> NullCounts {
        NullCounts {
            entries: ds
                .dataframe()
                .get_columns()
                .iter()
                .map(|col| (col.name().to_string(), col.null_count()))
                .collect(),
        }
    }

    /// Summarize every column in parallel.
    pub fn describe(ds: &Dataset) -> PolarsResult<DescribeTable> {
        let columns: Vec<(&Column, ColumnKind)> = ds.columns().collect();

        let summaries = columns
            .par_iter()
            .map(|(col, kind)| Self::summarize_column(col, *kind))
            .collect::<PolarsResult<Vec<_>>>()?;

        Ok(DescribeTable {
            columns: ds.column_names(),
            summaries,
        })
    }

    pub fn summarize_column(col: &Column, kind: ColumnKind) -> PolarsResult<ColumnSummary> {
        if kind.is_numeric() {
            let values = Dataset::numeric_values(col)?;
            Ok(ColumnSummary::Numeric(Self::compute_descriptive_stats(
                &values,
            )))
        } else {
            let texts = Dataset::cell_texts(col)?;
            Ok(ColumnSummary::Categorical(Self::compute_categorical_stats(
                texts.iter().flatten().map(String::as_str),
            )))
        }
    }

    /// Compute descriptive statistics for an array of values.
    pub fn compute_descriptive_stats(values: &[f64]) -> NumericSummary {
        let n = values.len();
        if n == 0 {
            return NumericSummary::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mean = values.iter().sum::<f64>() / n as f64;

        // Sample standard deviation; undefined for a single value.
        let std = if n > 1 {
            let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            variance.sqrt()
        } else {
            f64::NAN
        };

        NumericSummary {
            count: n,
            mean,
            std,
            min: sorted[0],
            q25: Self::percentile(&sorted, 25.0),
            median: Self::percentile(&sorted, 50.0),
            q75: Self::percentile(&sorted, 75.0),
            max: sorted[n - 1],
        }
    }

    /// Count, distinct count and most frequent value. Ties go to the value seen first.
    pub fn compute_categorical_stats<'a>(
        values: impl Iterator<Item = &'a str>,
    ) -> CategoricalSummary {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut count = 0;

        for (i, v) in values.enumerate() {
            count += 1;
            counts.entry(v).or_insert((0, i)).0 += 1;
        }

        let top = counts
            .iter()
            .max_by(|(_, (ca, fa)), (_, (cb, fb))| ca.cmp(cb).then(fb.cmp(fa)))
            .map(|(v, (c, _))| (v.to_string(), *c));

        CategoricalSummary {
            count,
            unique: counts.len(),
            freq: top.as_ref().map(|(_, c)| *c),
            top: top.map(|(v, _)| v),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;

    fn load(csv: &str) -> Dataset {
        DataLoader::parse_csv("t.csv", csv.as_bytes()).unwrap()
    }

    #[test]
    fn round_trip_counts() {
        let ds = load("a,b\n1,2\n3,\n");
        assert_eq!(StatsCalculator::row_count(&ds), 2);
        assert_eq!(StatsCalculator::column_count(&ds), 2);
        assert_eq!(StatsCalculator::missing_count(&ds), 1);
    }

    #[test]
    fn missing_count_matches_sum_of_null_counts() {
        let ds = load("a,b,c\n1,,x\n,NA,\n3,4,z\n,,\n");
        let nulls = StatsCalculator::null_counts_by_column(&ds);
        assert_eq!(
            nulls.entries,
            vec![
                ("a".to_string(), 2),
                ("b".to_string(), 3),
                ("c".to_string(), 2)
            ]
        );
        assert_eq!(StatsCalculator::missing_count(&ds), nulls.total());
    }

    #[test]
    fn numeric_describe_matches_conventional_values() {
        let s = StatsCalculator::compute_descriptive_stats(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(s.count, 4);
        assert!((s.mean - 2.5).abs() < 1e-12);
        assert!((s.std - 1.2909944487358056).abs() < 1e-12);
        assert_eq!(s.min, 1.0);
        assert!((s.q25 - 1.75).abs() < 1e-12);
        assert!((s.median - 2.5).abs() < 1e-12);
        assert!((s.q75 - 3.25).abs() < 1e-12);
        assert_eq!(s.max, 4.0);
    }

    #[test]
    fn single_value_has_undefined_std() {
        let s = StatsCalculator::compute_descriptive_stats(&[7.0]);
        assert_eq!(s.count, 1);
        assert!(s.std.is_nan());
        assert_eq!(s.median, 7.0);
    }

    #[test]
    fn categorical_top_prefers_first_seen_on_ties() {
        let s = StatsCalculator::compute_categorical_stats(["b", "a", "a", "b", "c"].into_iter());
        assert_eq!(s.count, 5);
        assert_eq!(s.unique, 3);
        assert_eq!(s.top.as_deref(), Some("b"));
        assert_eq!(s.freq, Some(2));
    }

    #[test]
    fn describe_mixed_table_has_all_rows() {
        let ds = load("n,s,f\n1,x,true\n2,y,true\n3,x,false\n");
        let table = StatsCalculator::describe(&ds).unwrap();

        assert_eq!(
            table.labels(),
            vec!["count", "unique", "top", "freq", "mean", "std", "min", "25%", "50%", "75%", "max"]
        );

        let rows = table.rows();
        let top = rows.iter().find(|r| r.label == "top").unwrap();
        assert_eq!(top.cells, vec!["NaN", "x", "True"]);
        let mean = rows.iter().find(|r| r.label == "mean").unwrap();
        assert_eq!(mean.cells, vec!["2.0", "NaN", "NaN"]);
    }

    #[test]
    fn describe_numeric_only_table_omits_categorical_rows() {
        let ds = load("a,b\n1,2\n3,4\n");
        let table = StatsCalculator::describe(&ds).unwrap();
        assert_eq!(
            table.labels(),
            vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max"]
        );
    }

    #[test]
    fn describe_is_deterministic() {
        let ds = load("a,b\n1,x\n,y\n");
        assert_eq!(
            StatsCalculator::describe(&ds).unwrap(),
            StatsCalculator::describe(&ds).unwrap()
        );
    }

    #[test]
    fn format_stat_trims_zeros() {
        assert_eq!(format_stat(2.0), "2.0");
        assert_eq!(format_stat(2f64.sqrt()), "1.414214");
        assert_eq!(format_stat(f64::NAN), "NaN");
    }
}
