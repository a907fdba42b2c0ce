//! Settings that control how the dataset is interpreted and displayed.

use clap::ValueEnum;
use serde::Serialize;

/// The default name of the column holding transaction timestamps.
pub const DEFAULT_TEMPORAL_COLUMN: &str = "TransactionStartTime";
/// The default name of the column holding transaction amounts.
pub const DEFAULT_AMOUNT_COLUMN: &str = "Amount";
/// The default number of filtered rows shown in the raw table preview.
pub const DEFAULT_PREVIEW_ROWS: usize = 100;

/// What to do when negative amounts should be excluded but there is no
/// numeric amount column to check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAmountPolicy {
    /// Skip the sign filter and log a warning.
    #[default]
    Ignore,
    /// Fail the request with [crate::Error::MissingColumn].
    Reject,
}

/// The well-known column names and edge case behaviour of the filter pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// The exact name of the timestamp column, if the dataset has one.
    pub temporal_column: String,
    /// The exact name of the column checked by the sign filter.
    pub amount_column: String,
    /// How the sign filter treats a missing amount column.
    pub missing_amount: MissingAmountPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            temporal_column: DEFAULT_TEMPORAL_COLUMN.to_owned(),
            amount_column: DEFAULT_AMOUNT_COLUMN.to_owned(),
            missing_amount: MissingAmountPolicy::default(),
        }
    }
}

/// Display settings for the dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    /// The maximum number of filtered rows shown in the raw table preview.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}
