//! REST API types for the upload endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::OutputRow;
use crate::transform::pipeline::{PipelineReport, ProcessOutcome};

/// Output rows echoed back in the JSON preview.
pub const PREVIEW_ROWS: usize = 20;

/// Response sent after an extract upload and transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" or "error"
    pub status: String,

    /// Run summary
    pub report: PipelineReport,

    /// First rows of the composed table
    pub preview: Vec<OutputRow>,

    /// Metadata about the run
    pub metadata: ResponseMetadata,
}

/// Metadata about the run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// When processing finished
    pub processed_at: DateTime<Utc>,

    /// Cutoff used for this run
    pub cutoff: f64,

    /// Total rows in the composed table
    pub output_rows: usize,

    /// Suggested download file name
    pub download_name: String,
}

impl UploadResponse {
    /// Build a response from a pipeline outcome.
    pub fn from_outcome(outcome: ProcessOutcome, cutoff: f64) -> Self {
        let preview: Vec<OutputRow> = outcome.rows.iter().take(PREVIEW_ROWS).cloned().collect();

        UploadResponse {
            job_id: Uuid::new_v4().to_string(),
            status: "ready".to_string(),
            report: outcome.report,
            preview,
            metadata: ResponseMetadata {
                processed_at: Utc::now(),
                cutoff,
                output_rows: outcome.rows.len(),
                download_name: crate::writer::DOWNLOAD_NAME.to_string(),
            },
        }
    }
}

/// Create an error response body.
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
    })
}
