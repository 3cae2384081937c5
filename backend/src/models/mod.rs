//! Domain models for the roamcost redistribution pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`RawCell`] / [`RawRow`] - loosely-typed cells as yielded by the reader
//! - [`BillingRecord`] - one normalized billing line
//! - [`OutputRow`] - a row of the final composed table
//! - [`round2`] / [`floor2`] - 2-decimal money helpers

use serde::{Deserialize, Serialize};

/// Trailing token marking a backup/secondary line that shares the
/// underlying vehicle or account (e.g. `"ABC123 BUP"`).
pub const BACKUP_MARKER: &str = "BUP";

/// Column headers of the composed output table, in order.
pub const OUTPUT_HEADERS: [&str; 8] = [
    "MSISDN",
    "Transporter",
    "VehicleReg",
    "CallsRoaming",
    "CallsData",
    "TotalExclVAT",
    "OldTotal",
    "NewTotal",
];

// =============================================================================
// Money Helpers
// =============================================================================

/// Round a monetary value to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Truncate a monetary value downward to 2 decimal places.
///
/// The kept total must never exceed the true amount, so this floors
/// instead of rounding half-up.
pub fn floor2(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

// =============================================================================
// Raw Cells
// =============================================================================

/// A loosely-typed table cell, as yielded by the reader.
///
/// The normalizer validates these once into a [`BillingRecord`]; everything
/// downstream operates on typed fields only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawCell {
    /// Blank cell.
    Empty,
    /// Textual cell content.
    Text(String),
    /// Numeric cell content.
    Number(f64),
    /// Boolean cell content.
    Bool(bool),
}

impl RawCell {
    /// True for blank cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

/// One raw table row: positional cells, header row already consumed.
pub type RawRow = Vec<RawCell>;

// =============================================================================
// Billing Record
// =============================================================================

/// One normalized billing line (phone line / vehicle).
///
/// `new_total` starts equal to `old_total` and is mutated only by the
/// redistributor; `old_total` never changes after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    /// Subscriber phone-number identifier; may be empty.
    pub msisdn: String,
    /// Billed customer / fleet operator, as extracted.
    pub transporter: String,
    /// Transporter with the trailing backup marker stripped.
    pub transporter_group: String,
    /// Vehicle registration, as extracted.
    pub vehicle_reg: String,
    /// Registration with the trailing backup marker stripped.
    pub vehicle_reg_base: String,
    /// Whether the registration carried the backup marker.
    pub has_marker_suffix: bool,
    pub calls_roaming: f64,
    pub calls_data: f64,
    pub total_excl_vat: f64,
    pub old_total: f64,
    pub new_total: f64,
}

// =============================================================================
// Output Rows
// =============================================================================

/// A row of the final composed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutputRow {
    /// A redistributed billing line, rendered as plain cells.
    Data(BillingRecord),
    /// Per-group subtotal row, rendered bold with a background fill.
    #[serde(rename_all = "camelCase")]
    GroupTotal {
        transporter_group: String,
        sum_old: f64,
        sum_new: f64,
    },
    /// Blank presentation row. Carries no numeric payload so external
    /// column sums treat it as blank, never as zero.
    Spacer,
}

/// Label shown in the transporter column of a group's subtotal row.
pub fn grand_total_label(transporter_group: &str) -> String {
    format!("{} - Grand Total", transporter_group)
}
