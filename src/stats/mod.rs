//! Stats module - descriptive statistics

mod calculator;

pub use calculator::{
    format_stat, CategoricalSummary, ColumnSummary, DescribeRow, DescribeTable, NullCounts,
    NumericSummary, StatsCalculator,
};
