//! Shelter Aggregator: collapses raw occupancy report rows into one row
//! per physical shelter location.
//!
//! Grouping is by exact (name, address) after trimming. Per-group means
//! exclude absent values rather than counting them as zero. The derived
//! occupancy rate prefers the source-reported mean rate and falls back to
//! occupied/capacity; the fallback for a shelter with zero/unknown
//! capacity and no reported rate is profile-dependent (0 under
//! `EncampmentsOnly`, unknown under `ShelterWeighted`).

use std::collections::BTreeMap;

use shelter_map_models::{AggregatedShelter, PipelineProfile, ShelterRecord};

/// Running sums for one (name, address) group.
#[derive(Default)]
struct GroupAccumulator {
    capacity_sum: f64,
    capacity_n: usize,
    occupied_sum: f64,
    occupied_n: usize,
    rate_sum: f64,
    rate_n: usize,
}

impl GroupAccumulator {
    fn push(&mut self, record: &ShelterRecord) {
        if let Some(capacity) = record.capacity_funding_bed {
            self.capacity_sum += capacity;
            self.capacity_n += 1;
        }
        if let Some(occupied) = record.occupied_beds {
            self.occupied_sum += occupied;
            self.occupied_n += 1;
        }
        if let Some(rate) = record.occupancy_rate_beds {
            self.rate_sum += rate;
            self.rate_n += 1;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(sum: f64, n: usize) -> Option<f64> {
        (n > 0).then(|| sum / n as f64)
    }
}

/// Aggregates raw shelter report rows into one row per (name, address).
///
/// Under [`PipelineProfile::EncampmentsOnly`], rows missing both the
/// capacity and occupied-beds fields are dropped before grouping and the
/// retained fraction is logged; under [`PipelineProfile::ShelterWeighted`]
/// every row participates.
#[must_use]
pub fn aggregate_shelters(
    records: &[ShelterRecord],
    profile: PipelineProfile,
) -> Vec<AggregatedShelter> {
    let total = records.len();

    let usable: Vec<&ShelterRecord> = if profile.drops_bedless_rows() {
        records
            .iter()
            .filter(|r| r.capacity_funding_bed.is_some() && r.occupied_beds.is_some())
            .collect()
    } else {
        records.iter().collect()
    };

    if profile.drops_bedless_rows() && total > 0 {
        #[allow(clippy::cast_precision_loss)]
        let pct = usable.len() as f64 / total as f64 * 100.0;
        log::info!(
            "Rows with valid bed data: {}/{total} ({pct:.1}%)",
            usable.len()
        );
    }

    let mut groups: BTreeMap<(String, String), GroupAccumulator> = BTreeMap::new();
    for record in usable {
        groups
            .entry((record.name.clone(), record.address.clone()))
            .or_default()
            .push(record);
    }

    let shelters: Vec<AggregatedShelter> = groups
        .into_iter()
        .map(|((name, address), acc)| {
            let avg_capacity_beds = GroupAccumulator::mean(acc.capacity_sum, acc.capacity_n);
            let avg_occupied_beds = GroupAccumulator::mean(acc.occupied_sum, acc.occupied_n);
            let avg_reported_rate = GroupAccumulator::mean(acc.rate_sum, acc.rate_n);

            let occ_rate = derive_occ_rate(
                avg_reported_rate,
                avg_occupied_beds,
                avg_capacity_beds,
                profile,
            );

            AggregatedShelter {
                name,
                address,
                avg_capacity_beds,
                avg_occupied_beds,
                avg_reported_rate,
                occ_rate,
            }
        })
        .collect();

    log::info!("Unique shelter locations: {}", shelters.len());
    shelters
}

/// Derives the occupancy rate for one aggregated shelter.
///
/// Reported mean rate wins when present; otherwise occupied/capacity x 100
/// with capacity `> 0`. Either path clips to [0, 100]. With neither
/// available the result is 0 under profile A and unknown under profile B.
fn derive_occ_rate(
    reported: Option<f64>,
    occupied: Option<f64>,
    capacity: Option<f64>,
    profile: PipelineProfile,
) -> Option<f64> {
    let computed = reported.or_else(|| match (occupied, capacity) {
        (Some(o), Some(c)) if c > 0.0 => Some(o / c * 100.0),
        _ => None,
    });

    match computed {
        Some(rate) => Some(rate.clamp(0.0, 100.0)),
        None if profile.drops_bedless_rows() => Some(0.0),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        name: &str,
        capacity: Option<f64>,
        occupied: Option<f64>,
        rate: Option<f64>,
    ) -> ShelterRecord {
        ShelterRecord {
            name: name.to_string(),
            address: format!("{name} address"),
            capacity_funding_bed: capacity,
            occupied_beds: occupied,
            occupancy_rate_beds: rate,
        }
    }

    #[test]
    fn groups_by_name_and_address() {
        let records = vec![
            record("A", Some(40.0), Some(30.0), None),
            record("A", Some(60.0), Some(50.0), None),
            record("B", Some(20.0), Some(10.0), None),
        ];
        let agg = aggregate_shelters(&records, PipelineProfile::EncampmentsOnly);
        assert_eq!(agg.len(), 2);

        let a = agg.iter().find(|s| s.name == "A").unwrap();
        assert_eq!(a.avg_capacity_beds, Some(50.0));
        assert_eq!(a.avg_occupied_beds, Some(40.0));
        assert_eq!(a.occ_rate, Some(80.0));
    }

    #[test]
    fn means_exclude_missing_values() {
        let records = vec![
            record("A", Some(40.0), Some(30.0), None),
            record("A", None, Some(50.0), None),
        ];
        // Profile B keeps the half-empty row.
        let agg = aggregate_shelters(&records, PipelineProfile::ShelterWeighted);
        let a = &agg[0];
        assert_eq!(a.avg_capacity_beds, Some(40.0));
        assert_eq!(a.avg_occupied_beds, Some(40.0));
    }

    #[test]
    fn profile_a_drops_bedless_rows() {
        let records = vec![
            record("A", Some(40.0), Some(30.0), None),
            record("Ghost", None, None, Some(85.0)),
        ];
        let agg = aggregate_shelters(&records, PipelineProfile::EncampmentsOnly);
        assert_eq!(agg.len(), 1);
        assert_eq!(agg[0].name, "A");
    }

    #[test]
    fn profile_b_keeps_bedless_rows() {
        let records = vec![
            record("A", Some(40.0), Some(30.0), None),
            record("Ghost", None, None, Some(85.0)),
        ];
        let agg = aggregate_shelters(&records, PipelineProfile::ShelterWeighted);
        assert_eq!(agg.len(), 2);
        let ghost = agg.iter().find(|s| s.name == "Ghost").unwrap();
        assert_eq!(ghost.occ_rate, Some(85.0));
    }

    #[test]
    fn reported_rate_wins_over_computed() {
        let records = vec![record("A", Some(100.0), Some(50.0), Some(75.0))];
        let agg = aggregate_shelters(&records, PipelineProfile::EncampmentsOnly);
        assert_eq!(agg[0].occ_rate, Some(75.0));
    }

    #[test]
    fn occupancy_clips_to_hundred() {
        let records = vec![record("A", Some(10.0), Some(15.0), None)];
        let agg = aggregate_shelters(&records, PipelineProfile::EncampmentsOnly);
        assert_eq!(agg[0].occ_rate, Some(100.0));
    }

    #[test]
    fn zero_capacity_yields_zero_not_nan() {
        // capacity=0, occupied=5, no reported rate.
        let records = vec![record("A", Some(0.0), Some(5.0), None)];
        let agg = aggregate_shelters(&records, PipelineProfile::EncampmentsOnly);
        let rate = agg[0].occ_rate.unwrap();
        assert!(rate.abs() < f64::EPSILON);
        assert!(!rate.is_nan());
    }

    #[test]
    fn zero_capacity_stays_unknown_under_profile_b() {
        let records = vec![record("A", Some(0.0), Some(5.0), None)];
        let agg = aggregate_shelters(&records, PipelineProfile::ShelterWeighted);
        assert_eq!(agg[0].occ_rate, None);
    }

    #[test]
    fn occupancy_in_range_whenever_capacity_known() {
        let records = vec![
            record("A", Some(40.0), Some(30.0), None),
            record("B", Some(10.0), Some(25.0), None),
            record("C", Some(50.0), Some(0.0), None),
        ];
        for shelter in aggregate_shelters(&records, PipelineProfile::EncampmentsOnly) {
            let rate = shelter.occ_rate.unwrap();
            assert!((0.0..=100.0).contains(&rate));
        }
    }
}
