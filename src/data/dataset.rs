//! Dataset Module
//! Immutable in-memory table built from one uploaded file.

use polars::prelude::*;
use serde::Serialize;

/// Inferred kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl ColumnKind {
    /// Numeric columns get count/mean/std/quartile statistics.
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }

    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Text => "text",
        }
    }

    fn from_dtype(dtype: &DataType) -> Self {
        match dtype {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => ColumnKind::Integer,
            DataType::Float32 | DataType::Float64 => ColumnKind::Float,
            DataType::Boolean => ColumnKind::Boolean,
            _ => ColumnKind::Text,
        }
    }
}

/// One uploaded table. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct Dataset {
    file_name: String,
    df: DataFrame,
    kinds: Vec<ColumnKind>,
}

impl Dataset {
    pub fn new(file_name: impl Into<String>, df: DataFrame) -> Self {
        let kinds = df
            .get_columns()
            .iter()
            .map(|col| ColumnKind::from_dtype(col.dtype()))
            .collect();

        Self {
            file_name: file_name.into(),
            df,
            kinds,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    /// Columns paired with their inferred kind, in table order.
    pub fn columns(&self) -> impl Iterator<Item = (&Column, ColumnKind)> {
        self.df.get_columns().iter().zip(self.kinds.iter().copied())
    }

    /// Non-null values of a numeric column as `f64`.
    pub fn numeric_values(column: &Column) -> PolarsResult<Vec<f64>> {
        let as_f64 = column.cast(&DataType::Float64)?;
        Ok(as_f64.f64()?.into_iter().flatten().collect())
    }

    /// All values of a numeric column as `f64`, nulls kept as `None`.
    pub fn numeric_options(column: &Column) -> PolarsResult<Vec<Option<f64>>> {
        let as_f64 = column.cast(&DataType::Float64)?;
        Ok(as_f64.f64()?.into_iter().collect())
    }

    /// Display text for every cell of a column, `None` for nulls.
    pub fn cell_texts(column: &Column) -> PolarsResult<Vec<Option<String>>> {
        let texts = match column.dtype() {
            DataType::Float32 | DataType::Float64 => {
                let as_f64 = column.cast(&DataType::Float64)?;
                as_f64
                    .f64()?
                    .into_iter()
                    .map(|v| v.map(format_float))
                    .collect()
            }
            DataType::Boolean => column
                .bool()?
                .into_iter()
                .map(|v| v.map(|b| if b { "True" } else { "False" }.to_string()))
                .collect(),
            _ => {
                let as_str = column.cast(&DataType::String)?;
                as_str
                    .str()?
                    .into_iter()
                    .map(|v| v.map(str::to_string))
                    .collect()
            }
        };
        Ok(texts)
    }

    /// First `n` rows rendered as text, empty string for nulls.
    pub fn head_rows(&self, n: usize) -> PolarsResult<Vec<Vec<String>>> {
        let head = self.df.head(Some(n));
        let columns = head
            .get_columns()
            .iter()
            .map(Self::cell_texts)
            .collect::<PolarsResult<Vec<_>>>()?;

        let rows = (0..head.height())
            .map(|i| {
                columns
                    .iter()
                    .map(|col| col[i].clone().unwrap_or_default())
                    .collect()
            })
            .collect();
        Ok(rows)
    }
}

/// Float cell formatting: whole numbers keep one decimal, like `3.0`.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_float_keeps_one_decimal_for_whole_numbers() {
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(f64::NAN), "NaN");
    }

    #[test]
    fn kinds_follow_dtypes() {
        let df = DataFrame::new(vec![
            Column::new("i".into(), vec![Some(1i64), None]),
            Column::new("f".into(), vec![Some(1.5f64), Some(2.0)]),
            Column::new("b".into(), vec![Some(true), Some(false)]),
            Column::new("s".into(), vec![Some("x"), None]),
        ])
        .unwrap();
        let ds = Dataset::new("t.csv", df);

        assert_eq!(
            ds.kinds(),
            &[
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Boolean,
                ColumnKind::Text
            ]
        );
        assert_eq!(ds.height(), 2);
        assert_eq!(ds.width(), 4);
    }

    #[test]
    fn head_rows_render_nulls_as_empty() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), vec![Some(1i64), Some(3)]),
            Column::new("b".into(), vec![Some(2i64), None]),
        ])
        .unwrap();
        let ds = Dataset::new("t.csv", df);

        let rows = ds.head_rows(5).unwrap();
        assert_eq!(rows, vec![vec!["1", "2"], vec!["3", ""]]);
    }
}
