//! Row Normalizer - coerces raw extract rows into canonical [`BillingRecord`]s.
//!
//! Raw rows are positional: MSISDN, Transporter, VehicleReg, CallsRoaming,
//! CallsData, TotalExclVAT, OldTotal. Extra columns are ignored; fewer is a
//! fatal shape error. All validation happens here, once - downstream stages
//! only ever see typed records.

use regex::Regex;

use crate::error::{NormalizeError, NormalizeResult};
use crate::models::{round2, BillingRecord, RawCell, RawRow};

/// Number of positional fields a raw row must supply.
pub const REQUIRED_COLUMNS: usize = 7;

const NUMERIC_COLUMNS: [&str; 4] = ["CallsRoaming", "CallsData", "TotalExclVAT", "OldTotal"];

/// Strips the trailing backup-line marker from transporter and
/// registration labels.
///
/// The marker counts only when preceded by whitespace: `"ABC123 BUP"`
/// carries it, `"ABC123BUP"` does not.
pub struct MarkerStripper {
    re: Regex,
}

impl MarkerStripper {
    pub fn new(marker: &str) -> Self {
        let pattern = format!(r"\s+{}$", regex::escape(marker));
        // The marker is escaped, so the pattern is always valid.
        let re = Regex::new(&pattern).expect("marker pattern");
        Self { re }
    }

    /// Returns the label with the marker removed, and whether it was present.
    pub fn strip(&self, label: &str) -> (String, bool) {
        match self.re.find(label) {
            Some(m) => (label[..m.start()].trim().to_string(), true),
            None => (label.trim().to_string(), false),
        }
    }
}

/// Normalize a whole extract.
///
/// Row numbers in errors are 1-based data-row positions (the header row is
/// consumed by the reader).
pub fn normalize_rows(
    rows: &[RawRow],
    marker: &str,
    strict: bool,
) -> NormalizeResult<Vec<BillingRecord>> {
    let stripper = MarkerStripper::new(marker);
    rows.iter()
        .enumerate()
        .map(|(i, row)| normalize_row(row, i + 1, &stripper, strict))
        .collect()
}

/// Normalize a single raw row into a [`BillingRecord`].
pub fn normalize_row(
    row: &RawRow,
    row_num: usize,
    stripper: &MarkerStripper,
    strict: bool,
) -> NormalizeResult<BillingRecord> {
    if row.len() < REQUIRED_COLUMNS {
        return Err(NormalizeError::Shape {
            row: row_num,
            found: row.len(),
        });
    }

    let msisdn = text_field(&row[0]);
    let transporter = text_field(&row[1]);
    let vehicle_reg = text_field(&row[2]);

    let mut numeric = [0.0f64; 4];
    for (slot, (cell, column)) in numeric
        .iter_mut()
        .zip(row[3..REQUIRED_COLUMNS].iter().zip(NUMERIC_COLUMNS))
    {
        *slot = numeric_field(cell, row_num, column, strict)?;
    }
    let [calls_roaming, calls_data, total_excl_vat, old_total] = numeric;

    let (transporter_group, _) = stripper.strip(&transporter);
    let (vehicle_reg_base, has_marker_suffix) = stripper.strip(&vehicle_reg);

    Ok(BillingRecord {
        msisdn,
        transporter,
        transporter_group,
        vehicle_reg,
        vehicle_reg_base,
        has_marker_suffix,
        calls_roaming,
        calls_data,
        total_excl_vat,
        old_total,
        new_total: old_total,
    })
}

/// String field: missing -> empty, otherwise trimmed.
///
/// Numeric cells are rendered back to text so identifiers read from
/// spreadsheets (where MSISDNs arrive as numbers) survive intact.
fn text_field(cell: &RawCell) -> String {
    match cell {
        RawCell::Empty | RawCell::Bool(_) => String::new(),
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Number(n) => {
            if n.fract() == 0.0 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
    }
}

/// Numeric field: non-numeric coerces to 0, numeric rounds to 2 decimals.
/// In strict mode an unparseable non-blank cell is an error instead.
fn numeric_field(
    cell: &RawCell,
    row_num: usize,
    column: &'static str,
    strict: bool,
) -> NormalizeResult<f64> {
    match cell {
        RawCell::Number(n) => Ok(round2(*n)),
        RawCell::Empty => Ok(0.0),
        RawCell::Text(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            match trimmed.parse::<f64>() {
                Ok(n) => Ok(round2(n)),
                Err(_) if strict => Err(NormalizeError::Value {
                    row: row_num,
                    column,
                    value: trimmed.to_string(),
                }),
                Err(_) => Ok(0.0),
            }
        }
        RawCell::Bool(b) => {
            if strict {
                Err(NormalizeError::Value {
                    row: row_num,
                    column,
                    value: b.to_string(),
                })
            } else {
                Ok(0.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BACKUP_MARKER;

    fn raw(
        msisdn: &str,
        transporter: &str,
        reg: &str,
        roaming: f64,
        data: f64,
        excl: f64,
        total: f64,
    ) -> RawRow {
        vec![
            RawCell::Text(msisdn.into()),
            RawCell::Text(transporter.into()),
            RawCell::Text(reg.into()),
            RawCell::Number(roaming),
            RawCell::Number(data),
            RawCell::Number(excl),
            RawCell::Number(total),
        ]
    }

    #[test]
    fn test_basic_row() {
        let rows = vec![raw("27821234567", " Acme Haulage ", "ABC123", 1.5, 2.25, 3.0, 4.5)];
        let records = normalize_rows(&rows, BACKUP_MARKER, false).unwrap();

        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.transporter, "Acme Haulage");
        assert_eq!(rec.transporter_group, "Acme Haulage");
        assert_eq!(rec.vehicle_reg, "ABC123");
        assert!(!rec.has_marker_suffix);
        assert_eq!(rec.old_total, 4.5);
        assert_eq!(rec.new_total, 4.5);
    }

    #[test]
    fn test_too_few_columns_is_fatal() {
        let rows = vec![vec![RawCell::Text("x".into()); 5]];
        let err = normalize_rows(&rows, BACKUP_MARKER, false).unwrap_err();
        assert!(matches!(err, NormalizeError::Shape { row: 1, found: 5 }));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let mut row = raw("1", "T", "R", 0.0, 0.0, 0.0, 9.0);
        row.push(RawCell::Text("ignored".into()));
        let records = normalize_rows(&[row], BACKUP_MARKER, false).unwrap();
        assert_eq!(records[0].old_total, 9.0);
    }

    #[test]
    fn test_marker_stripping() {
        let rows = vec![raw("1", "Acme BUP", "ABC123 BUP", 0.0, 0.0, 0.0, 1.0)];
        let rec = &normalize_rows(&rows, BACKUP_MARKER, false).unwrap()[0];

        assert_eq!(rec.transporter_group, "Acme");
        assert_eq!(rec.vehicle_reg_base, "ABC123");
        assert!(rec.has_marker_suffix);
    }

    #[test]
    fn test_marker_requires_whitespace() {
        let rows = vec![raw("1", "Acme", "ABC123BUP", 0.0, 0.0, 0.0, 1.0)];
        let rec = &normalize_rows(&rows, BACKUP_MARKER, false).unwrap()[0];

        assert_eq!(rec.vehicle_reg_base, "ABC123BUP");
        assert!(!rec.has_marker_suffix);
    }

    #[test]
    fn test_non_numeric_coerces_to_zero() {
        let rows = vec![vec![
            RawCell::Empty,
            RawCell::Text("Acme".into()),
            RawCell::Text("ABC123".into()),
            RawCell::Text("n/a".into()),
            RawCell::Text("12.5".into()),
            RawCell::Empty,
            RawCell::Text("".into()),
        ]];
        let rec = &normalize_rows(&rows, BACKUP_MARKER, false).unwrap()[0];

        assert_eq!(rec.msisdn, "");
        assert_eq!(rec.calls_roaming, 0.0);
        assert_eq!(rec.calls_data, 12.5);
        assert_eq!(rec.total_excl_vat, 0.0);
        assert_eq!(rec.old_total, 0.0);
    }

    #[test]
    fn test_strict_mode_rejects_bad_numbers() {
        let mut row = raw("1", "Acme", "ABC123", 0.0, 0.0, 0.0, 1.0);
        row[6] = RawCell::Text("n/a".into());
        let err = normalize_rows(&[row], BACKUP_MARKER, true).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::Value { column: "OldTotal", .. }
        ));
    }

    #[test]
    fn test_numeric_msisdn_rendered_as_text() {
        let mut row = raw("", "Acme", "ABC123", 0.0, 0.0, 0.0, 1.0);
        row[0] = RawCell::Number(27821234567.0);
        let rec = &normalize_rows(&[row], BACKUP_MARKER, false).unwrap()[0];
        assert_eq!(rec.msisdn, "27821234567");
    }

    #[test]
    fn test_values_rounded_to_two_decimals() {
        let rows = vec![raw("1", "Acme", "ABC123", 1.005, 2.6789, 3.333, 4.999)];
        let rec = &normalize_rows(&rows, BACKUP_MARKER, false).unwrap()[0];
        assert_eq!(rec.calls_data, 2.68);
        assert_eq!(rec.total_excl_vat, 3.33);
        assert_eq!(rec.old_total, 5.0);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let rows = vec![raw("27821234567", "Acme BUP", "ABC123 BUP", 1.5, 2.25, 3.0, 4.5)];
        let first = normalize_rows(&rows, BACKUP_MARKER, false).unwrap();

        // Re-feed the normalized fields through the normalizer.
        let refed: Vec<RawRow> = first
            .iter()
            .map(|r| {
                vec![
                    RawCell::Text(r.msisdn.clone()),
                    RawCell::Text(r.transporter.clone()),
                    RawCell::Text(r.vehicle_reg.clone()),
                    RawCell::Number(r.calls_roaming),
                    RawCell::Number(r.calls_data),
                    RawCell::Number(r.total_excl_vat),
                    RawCell::Number(r.old_total),
                ]
            })
            .collect();
        let second = normalize_rows(&refed, BACKUP_MARKER, false).unwrap();

        assert_eq!(first, second);
    }
}
