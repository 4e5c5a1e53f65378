//! Error types for stockroute-core
//!
//! Only structurally missing or unreadable input ends up here. Messy business
//! data (unparseable quantities, unknown SKUs, unmatched titles) is reported
//! through warnings and status values instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stockroute-core
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse CSV
    #[error("failed to parse CSV '{path}': {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV writer error
    #[error("failed to write CSV: {0}")]
    CsvWrite(#[from] csv::Error),

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// The product table has no column that looks like a title or item name
    #[error("table '{table}' has no title or item name column")]
    MissingTitleColumn { table: String },

    /// A location given as `Name=path` could not be split
    #[error("invalid location '{0}', expected NAME=PATH")]
    InvalidLocationSpec(String),

    /// Unknown output format
    #[error("unknown output format '{0}', supported formats: csv, json")]
    UnknownFormat(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
