//! Group Redistributor - absorbs small per-line totals into larger ones.
//!
//! Runs once per transporter group, records already sorted by registration.
//! Classification is by `old_total` against an inclusive cutoff: `>= cutoff`
//! is large, `0 < total < cutoff` is small, non-positive totals are never
//! touched. Target choice is uniformly random, so the caller injects the RNG;
//! seeding it makes a run reproducible.

use rand::Rng;

use crate::models::BillingRecord;

/// What the redistributor did to one group.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RedistributionStats {
    /// Rows whose total was moved onto another row.
    pub moved: usize,
    /// Small rows left in place because no valid target remained.
    pub skipped: usize,
}

/// Redistribute one transporter group in place.
///
/// Conservation holds per group: the sum of `new_total` afterwards equals
/// the sum of `old_total`, whichever branch ran.
pub fn redistribute_group<R: Rng + ?Sized>(
    records: &mut [BillingRecord],
    cutoff: f64,
    rng: &mut R,
) -> RedistributionStats {
    let mut stats = RedistributionStats::default();
    if records.is_empty() {
        return stats;
    }

    let large: Vec<usize> = (0..records.len())
        .filter(|&i| records[i].old_total >= cutoff)
        .collect();

    if large.is_empty() {
        // No line reaches the cutoff: one random collector absorbs the group.
        let collector = rng.gen_range(0..records.len());
        let group_sum: f64 = records.iter().map(|r| r.old_total).sum();
        for (i, rec) in records.iter_mut().enumerate() {
            if i == collector {
                rec.new_total = group_sum;
            } else {
                if rec.old_total != 0.0 {
                    stats.moved += 1;
                }
                rec.new_total = 0.0;
            }
        }
        return stats;
    }

    for i in 0..records.len() {
        let amount = records[i].old_total;
        if amount <= 0.0 || amount >= cutoff {
            continue;
        }

        // A row must never receive its own contribution, even if it somehow
        // appears among the candidates.
        let candidates: Vec<usize> = large.iter().copied().filter(|&t| t != i).collect();
        if candidates.is_empty() {
            stats.skipped += 1;
            continue;
        }

        let target = candidates[rng.gen_range(0..candidates.len())];
        records[target].new_total += amount;
        records[i].new_total = 0.0;
        stats.moved += 1;
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn record(reg: &str, total: f64) -> BillingRecord {
        BillingRecord {
            msisdn: String::new(),
            transporter: "Acme".into(),
            transporter_group: "Acme".into(),
            vehicle_reg: reg.into(),
            vehicle_reg_base: reg.into(),
            has_marker_suffix: false,
            calls_roaming: 0.0,
            calls_data: 0.0,
            total_excl_vat: 0.0,
            old_total: total,
            new_total: total,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn new_totals(records: &[BillingRecord]) -> Vec<f64> {
        records.iter().map(|r| r.new_total).collect()
    }

    #[test]
    fn test_single_large_target_is_deterministic() {
        // [5, 30] with cutoff 10: the 5 has exactly one place to go.
        let mut records = vec![record("AAA", 5.0), record("BBB", 30.0)];
        let stats = redistribute_group(&mut records, 10.0, &mut rng());

        assert_eq!(new_totals(&records), vec![0.0, 35.0]);
        assert_eq!(stats.moved, 1);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn test_no_large_consolidates_into_collector() {
        // [5, 8] with cutoff 10: one row ends up holding 13, the other 0.
        let mut records = vec![record("AAA", 5.0), record("BBB", 8.0)];
        redistribute_group(&mut records, 10.0, &mut rng());

        let totals = new_totals(&records);
        assert!(totals.contains(&13.0));
        assert!(totals.contains(&0.0));
    }

    #[test]
    fn test_all_large_untouched() {
        // [15, 20] with cutoff 10: nothing to move.
        let mut records = vec![record("AAA", 15.0), record("BBB", 20.0)];
        let stats = redistribute_group(&mut records, 10.0, &mut rng());

        assert_eq!(new_totals(&records), vec![15.0, 20.0]);
        assert_eq!(stats, RedistributionStats::default());
    }

    #[test]
    fn test_single_small_record_collects_itself() {
        // A lone record below the cutoff becomes its own collector.
        let mut records = vec![record("AAA", 3.0)];
        let stats = redistribute_group(&mut records, 10.0, &mut rng());

        assert_eq!(records[0].new_total, 3.0);
        assert_eq!(stats.moved, 0);
    }

    #[test]
    fn test_single_large_record_untouched() {
        let mut records = vec![record("AAA", 50.0)];
        redistribute_group(&mut records, 10.0, &mut rng());
        assert_eq!(records[0].new_total, 50.0);
    }

    #[test]
    fn test_cutoff_boundary_is_large() {
        // A record exactly at the cutoff is large, not small.
        let mut records = vec![record("AAA", 10.0), record("BBB", 5.0)];
        redistribute_group(&mut records, 10.0, &mut rng());

        assert_eq!(new_totals(&records), vec![15.0, 0.0]);
    }

    #[test]
    fn test_non_positive_totals_left_alone_with_large_present() {
        let mut records = vec![record("AAA", -2.0), record("BBB", 0.0), record("CCC", 40.0)];
        redistribute_group(&mut records, 10.0, &mut rng());

        assert_eq!(new_totals(&records), vec![-2.0, 0.0, 40.0]);
    }

    #[test]
    fn test_all_zero_group_is_a_noop_sum() {
        let mut records = vec![record("AAA", 0.0), record("BBB", 0.0)];
        redistribute_group(&mut records, 10.0, &mut rng());

        let total: f64 = records.iter().map(|r| r.new_total).sum();
        assert_eq!(total, 0.0);
    }

    #[test]
    fn test_conservation_with_many_smalls() {
        let mut records = vec![
            record("AAA", 1.25),
            record("BBB", 2.5),
            record("CCC", 7.75),
            record("DDD", 60.0),
            record("EEE", 90.0),
        ];
        let before: f64 = records.iter().map(|r| r.old_total).sum();
        let stats = redistribute_group(&mut records, 10.0, &mut rng());
        let after: f64 = records.iter().map(|r| r.new_total).sum();

        assert!((before - after).abs() < 1e-9);
        assert_eq!(stats.moved, 3);
        // Every redistributed small row went to zero.
        assert_eq!(records[0].new_total, 0.0);
        assert_eq!(records[1].new_total, 0.0);
        assert_eq!(records[2].new_total, 0.0);
        // Large rows only ever accumulate.
        assert!(records[3].new_total >= 60.0);
        assert!(records[4].new_total >= 90.0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let build = || {
            vec![
                record("AAA", 1.0),
                record("BBB", 2.0),
                record("CCC", 50.0),
                record("DDD", 60.0),
            ]
        };

        let mut first = build();
        redistribute_group(&mut first, 10.0, &mut StdRng::seed_from_u64(7));
        let mut second = build();
        redistribute_group(&mut second, 10.0, &mut StdRng::seed_from_u64(7));

        assert_eq!(new_totals(&first), new_totals(&second));
    }

    #[test]
    fn test_empty_group_skipped() {
        let mut records: Vec<BillingRecord> = Vec::new();
        let stats = redistribute_group(&mut records, 10.0, &mut rng());
        assert_eq!(stats, RedistributionStats::default());
    }
}
