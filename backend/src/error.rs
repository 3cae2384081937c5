//! Error types for the roamcost redistribution pipeline.
//!
//! This module defines a hierarchy of error types, one per pipeline stage:
//!
//! - [`ReadError`] - input table reading errors
//! - [`NormalizeError`] - raw row normalization errors
//! - [`RenderError`] - spreadsheet rendering errors
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Table Reading Errors
// =============================================================================

/// Errors while reading an input table (workbook or delimited text).
#[derive(Debug, Error)]
pub enum ReadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook could not be opened or parsed.
    #[error("Invalid workbook: {0}")]
    Workbook(#[from] calamine::XlsxError),

    /// Requested sheet does not exist.
    #[error("Sheet not found: {0}")]
    MissingSheet(String),

    /// Workbook has no sheets at all.
    #[error("Workbook contains no sheets")]
    NoSheets,

    /// Sheet ran out of rows before the header row.
    #[error("Sheet '{0}' has no header row to read")]
    EmptySheet(String),

    /// Text content could not be decoded.
    #[error("Failed to decode text: {0}")]
    Encoding(String),
}

// =============================================================================
// Normalization Errors
// =============================================================================

/// Errors while coercing raw rows into billing records.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Row cannot supply the required positional fields.
    #[error("Row {row}: found {found} columns, expected at least 7")]
    Shape { row: usize, found: usize },

    /// A cell could not be parsed as a number (strict mode only).
    #[error("Row {row}, column '{column}': cannot parse '{value}' as a number")]
    Value {
        row: usize,
        column: &'static str,
        value: String,
    },
}

// =============================================================================
// Rendering Errors
// =============================================================================

/// Errors while rendering the output workbook.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Workbook construction or save failed.
    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Destination could not be written.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by the `process_*` entry points.
/// It wraps all lower-level errors and adds pipeline-specific variants.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Table reading error.
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    /// Normalization error.
    #[error("Normalize error: {0}")]
    Normalize(#[from] NormalizeError),

    /// Rendering error.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// No billing rows to process.
    #[error("No billing rows to process")]
    EmptyInput,
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for table reading operations.
pub type ReadResult<T> = Result<T, ReadError>;

/// Result type for normalization operations.
pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ReadError -> PipelineError
        let read_err = ReadError::MissingSheet("Call Gate June".into());
        let pipeline_err: PipelineError = read_err.into();
        assert!(pipeline_err.to_string().contains("Call Gate June"));

        // NormalizeError -> PipelineError
        let shape_err = NormalizeError::Shape { row: 3, found: 5 };
        let pipeline_err: PipelineError = shape_err.into();
        assert!(pipeline_err.to_string().contains("Row 3"));
    }

    #[test]
    fn test_shape_error_format() {
        let err = NormalizeError::Shape { row: 12, found: 4 };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("found 4 columns"));
        assert!(msg.contains("at least 7"));
    }

    #[test]
    fn test_value_error_format() {
        let err = NormalizeError::Value {
            row: 7,
            column: "OldTotal",
            value: "n/a".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("OldTotal"));
        assert!(msg.contains("n/a"));
    }
}
