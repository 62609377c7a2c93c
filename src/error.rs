//! Error types for challenge evaluation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for evaluation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while evaluating submissions or building leaderboards.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An expected result or ground-truth file is absent.
    #[error("Missing file: {path}")]
    MissingFile {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// A ground-truth filename has no corresponding prediction.
    #[error("No prediction found for ground-truth image: {filename}")]
    MissingPrediction {
        /// Ground-truth filename without a matching prediction row.
        filename: String,
    },

    /// Two sequences that must be aligned have different lengths.
    #[error("Shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch {
        /// Expected number of elements.
        expected: usize,
        /// Actual number of elements.
        actual: usize,
    },

    /// Input is degenerate for the requested computation (e.g. single-class
    /// labels fed to a ROC sweep).
    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    /// A submission's effective root could not be determined.
    #[error("Could not locate result files under submission root: {root}")]
    NormalizationFailed {
        /// Extracted submission directory that was inspected.
        root: PathBuf,
    },

    /// A leaderboard references a metric column absent from the results table.
    #[error("Metric column not present in results table: {name}")]
    MissingMetric {
        /// Name of the absent column.
        name: String,
    },

    /// Failed to load or decode a label mask.
    #[error("Mask load failed: {path}: {reason}")]
    MaskLoad {
        /// Path to the mask that failed to load.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to read a ground-truth annotation spreadsheet.
    #[error("Spreadsheet error: {path}: {reason}")]
    Spreadsheet {
        /// Path to the spreadsheet.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// Failed to extract a submission archive.
    #[error("Archive error: {path}: {reason}")]
    Archive {
        /// Path to the archive.
        path: PathBuf,
        /// Reason for the failure.
        reason: String,
    },

    /// A prediction CSV row could not be parsed.
    #[error("Malformed row {line} in {path}: {reason}")]
    MalformedRow {
        /// Path to the CSV file.
        path: PathBuf,
        /// 1-based line number (header is line 1).
        line: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// I/O error wrapper.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
