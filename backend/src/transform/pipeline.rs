//! High-level pipeline API for billing extract processing.
//!
//! This module combines all steps: reading, normalization, duplicate
//! merging, per-group redistribution, totals, and output composition.
//!
//! # Example
//!
//! ```rust,ignore
//! use roamcost::{process_file, ProcessOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = process_file("extract.xlsx", &ProcessOptions::default())?;
//!     println!("{} output rows", outcome.rows.len());
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::api::logs::{log_info, log_success, log_warning};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{BillingRecord, OutputRow, RawRow, BACKUP_MARKER};
use crate::reader::{read_table_bytes, TableOrigin};

use super::composer::{compose_output, FinalizedGroup};
use super::merger::merge_duplicates;
use super::normalizer::normalize_rows;
use super::redistributor::redistribute_group;
use super::totals::finalize_group;

/// Options for the redistribution pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    /// Inclusive lower bound for a "large" total.
    pub cutoff: f64,

    /// Backup-line marker token (case-sensitive).
    pub marker: String,

    /// Workbook sheet to read; first sheet when unset.
    pub sheet: Option<String>,

    /// Leading banner rows to skip before the header row.
    pub skip_rows: usize,

    /// Treat unparseable numeric cells as errors instead of zeroing them.
    pub strict: bool,

    /// Fixed RNG seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            cutoff: 100.0,
            marker: BACKUP_MARKER.to_string(),
            sheet: None,
            skip_rows: 5,
            strict: false,
            seed: None,
        }
    }
}

impl ProcessOptions {
    /// Defaults overridden by `ROAMCOST_*` environment variables.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Some(cutoff) = env_parse::<f64>("ROAMCOST_CUTOFF") {
            options.cutoff = cutoff;
        }
        if let Ok(marker) = std::env::var("ROAMCOST_MARKER") {
            if !marker.trim().is_empty() {
                options.marker = marker.trim().to_string();
            }
        }
        if let Ok(sheet) = std::env::var("ROAMCOST_SHEET") {
            if !sheet.trim().is_empty() {
                options.sheet = Some(sheet.trim().to_string());
            }
        }
        if let Some(skip_rows) = env_parse::<usize>("ROAMCOST_SKIP_ROWS") {
            options.skip_rows = skip_rows;
        }

        options
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    /// Data rows read from the extract.
    pub input_rows: usize,
    /// Records remaining after duplicate merging.
    pub records: usize,
    /// Backup-line duplicates folded away.
    pub merged_duplicates: usize,
    /// Transporter groups seen.
    pub group_count: usize,
    /// Rows whose total was moved onto another row.
    pub redistributed_rows: usize,
    /// Small rows left unmoved for lack of a valid target.
    pub unmoved_rows: usize,
    /// Sum of old totals across all groups.
    pub total_old: f64,
    /// Sum of floored new totals across all groups.
    pub total_new: f64,
}

/// Result of a complete pipeline run.
#[derive(Debug)]
pub struct ProcessOutcome {
    /// The composed output table.
    pub rows: Vec<OutputRow>,
    /// Run summary.
    pub report: PipelineReport,
}

/// Process a billing extract file (workbook or delimited text).
pub fn process_file<P: AsRef<Path>>(
    path: P,
    options: &ProcessOptions,
) -> PipelineResult<ProcessOutcome> {
    let bytes = std::fs::read(path.as_ref()).map_err(crate::error::ReadError::Io)?;
    process_bytes(&bytes, options)
}

/// Process in-memory extract bytes, sniffing the format.
pub fn process_bytes(bytes: &[u8], options: &ProcessOptions) -> PipelineResult<ProcessOutcome> {
    log_info("Reading billing extract...");
    let table = read_table_bytes(bytes, options.sheet.as_deref(), options.skip_rows)?;

    match &table.origin {
        TableOrigin::Workbook { sheet } => log_success(format!("Read sheet '{}'", sheet)),
        TableOrigin::Delimited {
            encoding,
            delimiter,
        } => log_success(format!(
            "Read delimited text (encoding {}, delimiter '{}')",
            encoding, delimiter
        )),
    }
    log_success(format!("{} data rows", table.rows.len()));

    let mut rng = build_rng(options.seed);
    process_records(&table.rows, options, &mut rng)
}

/// Process already-read raw rows with an injected RNG.
///
/// This is the core entry point: given the same rows, options and seeded
/// RNG, the output is fully deterministic.
pub fn process_records<R: Rng + ?Sized>(
    rows: &[RawRow],
    options: &ProcessOptions,
    rng: &mut R,
) -> PipelineResult<ProcessOutcome> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyInput);
    }

    log_info("Normalizing rows...");
    let records = normalize_rows(rows, &options.marker, options.strict)?;
    let input_rows = records.len();

    log_info("Merging backup-line duplicates...");
    let records = merge_duplicates(records);
    let merged_duplicates = input_rows - records.len();
    if merged_duplicates > 0 {
        log_success(format!("Folded {} duplicate line(s)", merged_duplicates));
    }
    let record_count = records.len();

    log_info(format!(
        "Redistributing totals below {:.2} per transporter...",
        options.cutoff
    ));
    let groups = group_by_transporter(records);
    let group_count = groups.len();

    let mut redistributed_rows = 0;
    let mut unmoved_rows = 0;
    let mut total_old = 0.0;
    let mut total_new = 0.0;

    let mut finalized = Vec::with_capacity(group_count);
    for (transporter_group, mut group_records) in groups {
        group_records.sort_by(|a, b| a.vehicle_reg.cmp(&b.vehicle_reg));

        let stats = redistribute_group(&mut group_records, options.cutoff, rng);
        redistributed_rows += stats.moved;
        unmoved_rows += stats.skipped;

        let totals = finalize_group(&mut group_records);
        total_old += totals.sum_old;
        total_new += totals.sum_new;

        finalized.push(FinalizedGroup {
            transporter_group,
            records: group_records,
            totals,
        });
    }

    if unmoved_rows > 0 {
        log_warning(format!(
            "{} small row(s) had no redistribution target and were left unmoved",
            unmoved_rows
        ));
    }
    log_success(format!(
        "{} group(s), {} row(s) redistributed",
        group_count, redistributed_rows
    ));

    let rows = compose_output(finalized);
    log_success(format!("Composed {} output rows", rows.len()));

    Ok(ProcessOutcome {
        rows,
        report: PipelineReport {
            input_rows,
            records: record_count,
            merged_duplicates,
            group_count,
            redistributed_rows,
            unmoved_rows,
            total_old: crate::models::round2(total_old),
            total_new: crate::models::round2(total_new),
        },
    })
}

/// RNG for a run: seeded when requested, otherwise from entropy.
pub fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Partition records by transporter group, preserving first-seen group order.
fn group_by_transporter(records: Vec<BillingRecord>) -> Vec<(String, Vec<BillingRecord>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<BillingRecord>)> = Vec::new();

    for rec in records {
        match index.get(&rec.transporter_group) {
            Some(&slot) => groups[slot].1.push(rec),
            None => {
                index.insert(rec.transporter_group.clone(), groups.len());
                groups.push((rec.transporter_group.clone(), vec![rec]));
            }
        }
    }

    groups
}
