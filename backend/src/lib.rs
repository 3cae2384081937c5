//! # Roamcost - roaming cost redistribution for fleet billing extracts
//!
//! Roamcost reads a monthly billing extract (one row per phone line/vehicle,
//! grouped by transporter), folds backup-line duplicates, absorbs small
//! per-line totals into larger ones within each transporter group, and
//! renders the adjusted table with per-transporter grand totals.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐     ┌─────────────┐
//! │   Extract   │────▶│   Reader    │────▶│    Transform     │────▶│   Writer    │
//! │ (xlsx/csv)  │     │ (raw rows)  │     │ (merge+absorb)   │     │ (styled xlsx)│
//! └─────────────┘     └─────────────┘     └──────────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roamcost::{process_file, write_workbook, ProcessOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = process_file("extract.xlsx", &ProcessOptions::default())?;
//!     write_workbook(&outcome.rows, "processed_roaming_cost.xlsx")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (BillingRecord, OutputRow, money helpers)
//! - [`reader`] - Workbook/CSV ingestion with auto-detection
//! - [`transform`] - Normalizer, merger, redistributor, totals, composer
//! - [`writer`] - Styled workbook rendering
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Ingestion
pub mod reader;

// Transformation
pub mod transform;

// Rendering
pub mod writer;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{NormalizeError, PipelineError, ReadError, RenderError, ServerError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    floor2, grand_total_label, round2, BillingRecord, OutputRow, RawCell, RawRow, BACKUP_MARKER,
    OUTPUT_HEADERS,
};

// =============================================================================
// Re-exports - Reader
// =============================================================================

pub use reader::{
    detect_delimiter, detect_encoding, read_delimited_bytes, read_table_bytes,
    read_workbook_bytes, read_workbook_file, TableData, TableOrigin,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::pipeline::{
    build_rng, process_bytes, process_file, process_records, PipelineReport, ProcessOptions,
    ProcessOutcome,
};
pub use transform::redistributor::RedistributionStats;
pub use transform::totals::GroupTotals;
pub use transform::{merge_duplicates, normalize_rows, redistribute_group};

// =============================================================================
// Re-exports - Writer
// =============================================================================

pub use writer::{write_workbook, write_workbook_bytes, DOWNLOAD_NAME, OUTPUT_SHEET};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, UploadResponse};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
