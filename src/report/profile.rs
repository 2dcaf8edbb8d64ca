//! Dataset profiling for the HTML report.
//!
//! Column profiles are computed in parallel; the cancellation token is checked
//! before each column and progress advances by one step per column.

use crate::data::{ColumnKind, Dataset};
use crate::report::job::{CancellationToken, ReportProgress};
use crate::report::ReportError;
use crate::stats::{NumericSummary, StatsCalculator};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use std::collections::{HashMap, HashSet};

/// Number of histogram bins for numeric columns.
pub const HISTOGRAM_BINS: usize = 10;
/// Number of most frequent values listed for categorical columns.
pub const TOP_VALUES: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NumericProfile {
    pub summary: NumericSummary,
    pub range: f64,
    pub iqr: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub zeros: usize,
    pub histogram: Vec<HistogramBin>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValueFrequency {
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub count: usize,
    pub missing: usize,
    pub missing_percent: f64,
    pub distinct: usize,
    pub numeric: Option<NumericProfile>,
    pub top_values: Vec<ValueFrequency>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Correlations {
    pub columns: Vec<String>,
    /// Pearson coefficients; `None` when undefined for a pair.
    pub matrix: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissingPatterns {
    pub per_column: Vec<(String, usize, f64)>,
    pub rows_with_missing: usize,
    pub complete_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub rows: usize,
    pub columns: usize,
    pub missing_cells: usize,
    pub missing_percent: f64,
    pub duplicate_rows: usize,
    pub numeric_columns: usize,
    pub boolean_columns: usize,
    pub text_columns: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetProfile {
    pub overview: Overview,
    pub columns: Vec<ColumnProfile>,
    pub correlations: Correlations,
    pub missing: MissingPatterns,
}

pub struct Profiler;

impl Profiler {
    /// Steps reported through `ReportProgress` for a dataset.
    pub fn total_steps(ds: &Dataset) -> usize {
        ds.width() + 2
    }

    pub fn profile(
        ds: &Dataset,
        token: &CancellationToken,
        progress: &ReportProgress,
    ) -> Result<DatasetProfile, ReportError> {
        progress.start(Self::total_steps(ds));
        let rows = ds.height();

        let pairs: Vec<(&Column, ColumnKind)> = ds.columns().collect();
        let columns = pairs
            .par_iter()
            .map(|(col, kind)| {
                if token.is_cancelled() {
                    return Err(ReportError::Cancelled);
                }
                let profile = Self::profile_column(col, *kind, rows)?;
                progress.advance();
                Ok(profile)
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        token.check()?;
        let correlations = Self::correlations(ds)?;
        progress.advance();

        token.check()?;
        let texts = ds
            .dataframe()
            .get_columns()
            .iter()
            .map(Dataset::cell_texts)
            .collect::<PolarsResult<Vec<_>>>()?;
        let missing = Self::missing_patterns(&columns, &texts, rows);
        let duplicate_rows = Self::duplicate_rows(&texts, rows);
        progress.advance();

        let missing_cells: usize = columns.iter().map(|c| c.missing).sum();
        let cells = rows * columns.len();
        let count_kind = |pred: fn(ColumnKind) -> bool| {
            columns.iter().filter(|c| pred(c.kind)).count()
        };

        let overview = Overview {
            rows,
            columns: columns.len(),
            missing_cells,
            missing_percent: percent(missing_cells, cells),
            duplicate_rows,
            numeric_columns: count_kind(ColumnKind::is_numeric),
            boolean_columns: count_kind(|k| k == ColumnKind::Boolean),
            text_columns: count_kind(|k| k == ColumnKind::Text),
        };

        Ok(DatasetProfile {
            overview,
            columns,
            correlations,
            missing,
        })
    }

    fn profile_column(
        col: &Column,
        kind: ColumnKind,
        rows: usize,
    ) -> Result<ColumnProfile, ReportError> {
        let missing = col.null_count();
        let count = rows - missing;

        let (numeric, top_values, distinct) = if kind.is_numeric() {
            let values = Dataset::numeric_values(col)?;
            let distinct = values
                .iter()
                .map(|v| v.to_bits())
                .collect::<HashSet<u64>>()
                .len();
            (Some(Self::numeric_profile(&values)), Vec::new(), distinct)
        } else {
            let texts = Dataset::cell_texts(col)?;
            let (top, distinct) = Self::top_values(texts.iter().flatten().map(String::as_str));
            (None, top, distinct)
        };

        Ok(ColumnProfile {
            name: col.name().to_string(),
            kind,
            count,
            missing,
            missing_percent: percent(missing, rows),
            distinct,
            numeric,
            top_values,
        })
    }

    pub fn numeric_profile(values: &[f64]) -> NumericProfile {
        let summary = StatsCalculator::compute_descriptive_stats(values);
        let (skewness, kurtosis) = Self::shape(values, summary.mean);

        NumericProfile {
            range: summary.max - summary.min,
            iqr: summary.q75 - summary.q25,
            skewness,
            kurtosis,
            zeros: values.iter().filter(|v| **v == 0.0).count(),
            histogram: Self::histogram(values, summary.min, summary.max),
            summary,
        }
    }

    /// Bias-corrected sample skewness and excess kurtosis.
    fn shape(values: &[f64], mean: f64) -> (f64, f64) {
        let n = values.len() as f64;
        if values.is_empty() {
            return (f64::NAN, f64::NAN);
        }

        let moment = |p: i32| values.iter().map(|x| (x - mean).powi(p)).sum::<f64>() / n;
        let m2 = moment(2);
        let m3 = moment(3);
        let m4 = moment(4);

        let skewness = if n < 3.0 {
            f64::NAN
        } else if m2 == 0.0 {
            0.0
        } else {
            let g1 = m3 / m2.powf(1.5);
            g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
        };

        let kurtosis = if n < 4.0 {
            f64::NAN
        } else if m2 == 0.0 {
            0.0
        } else {
            let g2 = m4 / (m2 * m2) - 3.0;
            ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
        };

        (skewness, kurtosis)
    }

    /// Equal-width bins over `[min, max]`; the last bin is closed.
    pub fn histogram(values: &[f64], min: f64, max: f64) -> Vec<HistogramBin> {
        if values.is_empty() || !min.is_finite() || !max.is_finite() {
            return Vec::new();
        }
        if min == max {
            return vec![HistogramBin {
                lower: min - 0.5,
                upper: max + 0.5,
                count: values.len(),
            }];
        }

        let width = (max - min) / HISTOGRAM_BINS as f64;
        let mut counts = vec![0usize; HISTOGRAM_BINS];
        for v in values.iter().filter(|v| v.is_finite()) {
            let idx = (((v - min) / width) as usize).min(HISTOGRAM_BINS - 1);
            counts[idx] += 1;
        }

        counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| HistogramBin {
                lower: min + width * i as f64,
                upper: min + width * (i + 1) as f64,
                count,
            })
            .collect()
    }

    /// Most frequent values (ties by first appearance) and the distinct count.
    pub fn top_values<'a>(values: impl Iterator<Item = &'a str>) -> (Vec<ValueFrequency>, usize) {
        let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut total = 0;
        for (i, v) in values.enumerate() {
            total += 1;
            counts.entry(v).or_insert((0, i)).0 += 1;
        }

        let mut ranked: Vec<(&str, usize, usize)> =
            counts.iter().map(|(v, (c, first))| (*v, *c, *first)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let top = ranked
            .into_iter()
            .take(TOP_VALUES)
            .map(|(value, count, _)| ValueFrequency {
                value: value.to_string(),
                count,
                percent: percent(count, total),
            })
            .collect();
        (top, counts.len())
    }

    /// Pearson correlations between numeric columns over pairwise-complete rows.
    pub fn correlations(ds: &Dataset) -> PolarsResult<Correlations> {
        let numeric: Vec<(String, Vec<Option<f64>>)> = ds
            .columns()
            .filter(|(_, kind)| kind.is_numeric())
            .map(|(col, _)| -> PolarsResult<(String, Vec<Option<f64>>)> {
                Ok((col.name().to_string(), Dataset::numeric_options(col)?))
            })
            .collect::<PolarsResult<_>>()?;

        let matrix = numeric
            .iter()
            .map(|(_, a)| {
                numeric
                    .iter()
                    .map(|(_, b)| pearson(a, b))
                    .collect::<Vec<_>>()
            })
            .collect();

        Ok(Correlations {
            columns: numeric.into_iter().map(|(name, _)| name).collect(),
            matrix,
        })
    }

    fn missing_patterns(
        columns: &[ColumnProfile],
        texts: &[Vec<Option<String>>],
        rows: usize,
    ) -> MissingPatterns {
        let rows_with_missing = (0..rows)
            .filter(|&i| texts.iter().any(|col| col[i].is_none()))
            .count();

        MissingPatterns {
            per_column: columns
                .iter()
                .map(|c| (c.name.clone(), c.missing, c.missing_percent))
                .collect(),
            rows_with_missing,
            complete_rows: rows - rows_with_missing,
        }
    }

    fn duplicate_rows(texts: &[Vec<Option<String>>], rows: usize) -> usize {
        let mut seen: HashSet<Vec<Option<&str>>> = HashSet::with_capacity(rows);
        (0..rows)
            .filter(|&i| {
                let row: Vec<Option<&str>> = texts.iter().map(|col| col[i].as_deref()).collect();
                !seen.insert(row)
            })
            .count()
    }
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .unzip();

    if xs.len() < 2 {
        return None;
    }

    let sx = xs.iter().std_dev();
    let sy = ys.iter().std_dev();
    if sx == 0.0 || sy == 0.0 || sx.is_nan() || sy.is_nan() {
        return None;
    }

    let r = xs.iter().covariance(ys.iter()) / (sx * sy);
    Some(r.clamp(-1.0, 1.0))
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
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
    fn histogram_puts_max_in_last_bin() {
        let values: Vec<f64> = (0..=10).map(f64::from).collect();
        let bins = Profiler::histogram(&values, 0.0, 10.0);
        assert_eq!(bins.len(), HISTOGRAM_BINS);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 11);
        assert_eq!(bins[9].count, 2);
    }

    #[test]
    fn constant_column_gets_single_bin() {
        let bins = Profiler::histogram(&[4.0, 4.0], 4.0, 4.0);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
    }

    #[test]
    fn perfectly_correlated_columns() {
        let ds = load("x,y,z,label\n1,2,5,a\n2,4,4,b\n3,6,3,c\n4,8,2,d\n");
        let corr = Profiler::correlations(&ds).unwrap();
        assert_eq!(corr.columns, vec!["x", "y", "z"]);
        assert!((corr.matrix[0][1].unwrap() - 1.0).abs() < 1e-9);
        assert!((corr.matrix[0][2].unwrap() + 1.0).abs() < 1e-9);
    }

    #[test]
    fn correlation_is_undefined_for_constant_column() {
        let ds = load("x,c\n1,7\n2,7\n3,7\n");
        let corr = Profiler::correlations(&ds).unwrap();
        assert_eq!(corr.matrix[0][1], None);
    }

    #[test]
    fn skewness_of_symmetric_data_is_zero() {
        let p = Profiler::numeric_profile(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(p.skewness.abs() < 1e-12);
        assert!((p.kurtosis + 1.2).abs() < 1e-9);
        assert_eq!(p.range, 4.0);
        assert_eq!(p.iqr, 2.0);
    }

    #[test]
    fn profile_counts_missing_and_duplicates() {
        let ds = load("a,b\n1,x\n1,x\n,y\n2,\n");
        let token = CancellationToken::new();
        let progress = ReportProgress::default();
        let profile = Profiler::profile(&ds, &token, &progress).unwrap();

        assert_eq!(profile.overview.rows, 4);
        assert_eq!(profile.overview.missing_cells, 2);
        assert_eq!(profile.overview.duplicate_rows, 1);
        assert_eq!(profile.missing.rows_with_missing, 2);
        assert_eq!(profile.missing.complete_rows, 2);
        assert_eq!(profile.columns[1].top_values[0].value, "x");
        assert_eq!(profile.columns[1].distinct, 2);
        assert_eq!(progress.snapshot(), (4, 4));
    }

    #[test]
    fn cancelled_token_stops_profiling() {
        let ds = load("a,b\n1,2\n");
        let token = CancellationToken::new();
        token.cancel();
        let err = Profiler::profile(&ds, &token, &ReportProgress::default()).unwrap_err();
        assert!(matches!(err, ReportError::Cancelled));
    }
}
