//! Output Composer - assembles the final ordered table.
//!
//! Groups appear in first-seen order. Each group contributes its data rows,
//! one grand-total row, then two spacer rows.

use crate::models::{BillingRecord, OutputRow};

use super::totals::GroupTotals;

/// One finalized transporter group, ready for composition.
#[derive(Debug)]
pub struct FinalizedGroup {
    pub transporter_group: String,
    pub records: Vec<BillingRecord>,
    pub totals: GroupTotals,
}

/// Concatenate all groups into the final output sequence.
pub fn compose_output(groups: Vec<FinalizedGroup>) -> Vec<OutputRow> {
    let mut rows = Vec::new();

    for group in groups {
        rows.extend(group.records.into_iter().map(OutputRow::Data));
        rows.push(OutputRow::GroupTotal {
            transporter_group: group.transporter_group,
            sum_old: group.totals.sum_old,
            sum_new: group.totals.sum_new,
        });
        rows.push(OutputRow::Spacer);
        rows.push(OutputRow::Spacer);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(group: &str, reg: &str) -> BillingRecord {
        BillingRecord {
            msisdn: String::new(),
            transporter: group.into(),
            transporter_group: group.into(),
            vehicle_reg: reg.into(),
            vehicle_reg_base: reg.into(),
            has_marker_suffix: false,
            calls_roaming: 0.0,
            calls_data: 0.0,
            total_excl_vat: 0.0,
            old_total: 5.0,
            new_total: 5.0,
        }
    }

    #[test]
    fn test_group_layout() {
        let groups = vec![FinalizedGroup {
            transporter_group: "Acme".into(),
            records: vec![record("Acme", "AAA111"), record("Acme", "BBB222")],
            totals: GroupTotals {
                sum_old: 10.0,
                sum_new: 10.0,
            },
        }];
        let rows = compose_output(groups);

        assert_eq!(rows.len(), 5);
        assert!(matches!(rows[0], OutputRow::Data(_)));
        assert!(matches!(rows[1], OutputRow::Data(_)));
        assert!(matches!(
            rows[2],
            OutputRow::GroupTotal { ref transporter_group, .. } if transporter_group == "Acme"
        ));
        assert_eq!(rows[3], OutputRow::Spacer);
        assert_eq!(rows[4], OutputRow::Spacer);
    }

    #[test]
    fn test_groups_concatenate_in_order() {
        let groups = vec![
            FinalizedGroup {
                transporter_group: "Zenith".into(),
                records: vec![record("Zenith", "ZZZ999")],
                totals: GroupTotals {
                    sum_old: 5.0,
                    sum_new: 5.0,
                },
            },
            FinalizedGroup {
                transporter_group: "Acme".into(),
                records: vec![record("Acme", "AAA111")],
                totals: GroupTotals {
                    sum_old: 5.0,
                    sum_new: 5.0,
                },
            },
        ];
        let rows = compose_output(groups);

        // First-seen order is preserved, not alphabetical.
        assert!(matches!(
            rows[1],
            OutputRow::GroupTotal { ref transporter_group, .. } if transporter_group == "Zenith"
        ));
        assert!(matches!(
            rows[5],
            OutputRow::GroupTotal { ref transporter_group, .. } if transporter_group == "Acme"
        ));
    }
}
