use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// A required column is absent from the input header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("missing required column '{column}'")]
pub struct SchemaError {
    pub column: String,
}

/// Fatal load-time failures. A failed load aborts the whole pipeline run;
/// there is no partial dashboard and no retry.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("row {row}: cannot parse timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}, column '{column}': '{value}' is not a valid number")]
    Value {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: {message}")]
    Malformed { row: usize, message: String },

    #[error("reading CSV row {row}: {source}")]
    Csv { row: usize, source: csv::Error },

    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reading parquet file: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("reading parquet data: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// An out-of-range coded value surfacing through a derived feature.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeriveError {
    #[error("season code {0} is outside the coded range 1-4")]
    SeasonCode(u8),
}

/// Failures local to a single aggregation. The affected chart or metric
/// degrades to an explicit no-data state; the rest of the dashboard keeps
/// rendering.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AggregateError {
    /// The filtered view has no rows, so every statistic is undefined.
    #[error("no rows match the current filter selection")]
    EmptySelection,

    #[error(transparent)]
    Derive(#[from] DeriveError),
}
