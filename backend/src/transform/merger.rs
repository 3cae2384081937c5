//! Duplicate-Registration Merger - folds backup-line duplicates into one record.
//!
//! A vehicle billed twice - once under its plain registration and once under
//! a backup variant (`"ABC123"` and `"ABC123 BUP"`) - represents one physical
//! unit and must be billed once. Partitions are keyed by
//! `(transporter_group, vehicle_reg_base)` and merge only when at least one
//! member actually carries the marker; unrelated same-base rows pass through.

use std::collections::HashMap;

use crate::models::{round2, BillingRecord};

/// Merge backup-line duplicates, preserving first-seen record order.
///
/// Every surviving record has its `transporter` normalized to the group
/// label, merged or not.
pub fn merge_duplicates(records: Vec<BillingRecord>) -> Vec<BillingRecord> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut partitions: Vec<Vec<BillingRecord>> = Vec::new();

    for rec in records {
        let key = (rec.transporter_group.clone(), rec.vehicle_reg_base.clone());
        match index.get(&key) {
            Some(&slot) => partitions[slot].push(rec),
            None => {
                index.insert(key, partitions.len());
                partitions.push(vec![rec]);
            }
        }
    }

    partitions.into_iter().flat_map(merge_partition).collect()
}

/// Collapse one `(group, reg-base)` partition.
fn merge_partition(mut partition: Vec<BillingRecord>) -> Vec<BillingRecord> {
    let merges = partition.len() >= 2 && partition.iter().any(|r| r.has_marker_suffix);
    if !merges {
        for rec in &mut partition {
            rec.transporter = rec.transporter_group.clone();
        }
        return partition;
    }

    // Prefer the plain line's MSISDN; backup lines only as a fallback.
    let msisdn = partition
        .iter()
        .filter(|r| !r.has_marker_suffix)
        .map(|r| r.msisdn.as_str())
        .find(|m| !m.is_empty())
        .or_else(|| {
            partition
                .iter()
                .map(|r| r.msisdn.as_str())
                .find(|m| !m.is_empty())
        })
        .unwrap_or_default()
        .to_string();

    let calls_roaming = round2(partition.iter().map(|r| r.calls_roaming).sum());
    let calls_data = round2(partition.iter().map(|r| r.calls_data).sum());
    let total_excl_vat = round2(partition.iter().map(|r| r.total_excl_vat).sum());
    let old_total = round2(partition.iter().map(|r| r.old_total).sum());
    let new_total = round2(partition.iter().map(|r| r.new_total).sum());

    let group = partition[0].transporter_group.clone();
    let reg_base = partition[0].vehicle_reg_base.clone();

    vec![BillingRecord {
        msisdn,
        transporter: group.clone(),
        transporter_group: group,
        vehicle_reg: reg_base.clone(),
        vehicle_reg_base: reg_base,
        has_marker_suffix: false,
        calls_roaming,
        calls_data,
        total_excl_vat,
        old_total,
        new_total,
    }]
}
