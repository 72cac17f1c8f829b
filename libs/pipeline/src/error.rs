//! Error types for the dataset pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures that abort a pipeline call.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A required input was not supplied.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Every line of a source was rejected.
    #[error("No valid rows in {source_name} ({rejected} rejected)")]
    NoValidRows {
        /// Name of the source that was parsed.
        source_name: String,
        /// Number of lines that were rejected.
        rejected: usize,
    },

    /// Tensor shape does not match the expected layout.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        actual: Vec<usize>,
    },

    /// More samples requested than the dataset holds.
    #[error("Cannot sample {requested} items from a dataset of {available}")]
    SampleTooLarge {
        /// Requested sample count.
        requested: usize,
        /// Dataset size.
        available: usize,
    },

    /// Invalid argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// CSV reader errors.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single CSV line was rejected.
///
/// Row errors are recovered locally: the line is skipped and recorded in
/// the parse report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    /// The line did not have exactly one label and 784 pixels.
    #[error("expected 785 fields, found {found}")]
    FieldCount {
        /// Number of fields present.
        found: usize,
    },

    /// The label field is not an integer.
    #[error("label {0:?} is not an integer")]
    Label(String),

    /// The label is an integer outside 0-9.
    #[error("label {0} is outside 0-9")]
    LabelOutOfRange(i64),

    /// A pixel field is not a number in [0, 255].
    #[error("pixel column {column} has invalid value {value:?}")]
    Pixel {
        /// Zero-based pixel index.
        column: usize,
        /// Raw field text.
        value: String,
    },
}
