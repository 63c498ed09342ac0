//! Error types for the dataset preparation tools

use thiserror::Error;

use crate::splitter::Side;

/// Main error type for dataset preparation
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WKT error: {0}")]
    Wkt(String),

    #[error("Unsupported geometry: expected POLYGON, got {0}")]
    UnsupportedGeometry(String),

    #[error("Degenerate {side} ring: {points} points cannot form a polygon")]
    DegenerateRing { side: Side, points: usize },

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field: {name} ({reason})")]
    InvalidField { name: &'static str, reason: String },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Bad record on line {line}: {reason}")]
    Record { line: usize, reason: String },

    #[error("No records in input")]
    EmptyInput,
}

/// Result type alias for dataset preparation
pub type Result<T> = std::result::Result<T, PrepError>;
