//! Totals & Rounding Pipeline - final money pass over a redistributed group.
//!
//! `new_total` is floored to 2 decimals exactly once, here; the other
//! monetary fields are rounded, never floored. Flooring runs before the
//! subtotal summation, so the displayed group total never exceeds the true
//! redistributed amount.

use crate::models::{floor2, round2, BillingRecord};

/// Subtotals of one finalized transporter group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTotals {
    /// Exact (unfloored) sum of the already-rounded `old_total`s.
    pub sum_old: f64,
    /// Sum of the per-row floored `new_total`s.
    pub sum_new: f64,
}

/// Floor and round one group's records in place, returning its subtotals.
pub fn finalize_group(records: &mut [BillingRecord]) -> GroupTotals {
    let mut sum_old = 0.0;
    let mut sum_new = 0.0;

    for rec in records.iter_mut() {
        rec.new_total = floor2(rec.new_total);
        rec.calls_roaming = round2(rec.calls_roaming);
        rec.calls_data = round2(rec.calls_data);
        rec.total_excl_vat = round2(rec.total_excl_vat);
        rec.old_total = round2(rec.old_total);

        sum_old += rec.old_total;
        sum_new += rec.new_total;
    }

    GroupTotals {
        sum_old: round2(sum_old),
        sum_new: round2(sum_new),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(old: f64, new: f64) -> BillingRecord {
        BillingRecord {
            msisdn: String::new(),
            transporter: "Acme".into(),
            transporter_group: "Acme".into(),
            vehicle_reg: "ABC123".into(),
            vehicle_reg_base: "ABC123".into(),
            has_marker_suffix: false,
            calls_roaming: 1.005,
            calls_data: 2.675000001,
            total_excl_vat: 3.0,
            old_total: old,
            new_total: new,
        }
    }

    #[test]
    fn test_new_total_is_floored() {
        let mut records = vec![record(12.35, 12.349)];
        let totals = finalize_group(&mut records);

        assert_eq!(records[0].new_total, 12.34);
        assert_eq!(totals.sum_new, 12.34);
        assert_eq!(totals.sum_old, 12.35);
    }

    #[test]
    fn test_other_fields_are_rounded_not_floored() {
        let mut records = vec![record(1.0, 1.0)];
        finalize_group(&mut records);

        assert_eq!(records[0].calls_data, 2.68);
    }

    #[test]
    fn test_floor_applies_before_summation() {
        // Two rows at x.349 each: flooring first loses 0.009 per row,
        // so the subtotal reflects both truncations.
        let mut records = vec![record(5.35, 5.349), record(7.35, 7.349)];
        let totals = finalize_group(&mut records);

        assert_eq!(totals.sum_new, 12.68);
        assert_eq!(totals.sum_old, 12.7);
    }

    #[test]
    fn test_floor_error_bounded_per_row() {
        let mut records: Vec<BillingRecord> =
            (0..10).map(|i| record(1.0, 1.0 + 0.009 * i as f64)).collect();
        let totals = finalize_group(&mut records);

        let true_sum: f64 = (0..10).map(|i| 1.0 + 0.009 * i as f64).sum();
        let error = true_sum - totals.sum_new;
        assert!(error >= 0.0);
        assert!(error <= 0.01 * records.len() as f64);
    }

    #[test]
    fn test_empty_group_totals_are_zero() {
        let mut records: Vec<BillingRecord> = Vec::new();
        let totals = finalize_group(&mut records);
        assert_eq!(totals.sum_old, 0.0);
        assert_eq!(totals.sum_new, 0.0);
    }
}
