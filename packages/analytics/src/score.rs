//! Need scoring and priority ranking for demand clusters.
//!
//! For each cluster: aggregate severity (mean member weight under profile
//! A, summed weight under profile B), geodesic distance to the nearest
//! geocoded shelter (999.0 km sentinel when no shelters exist), raw need
//! = severity x distance, and a need score normalized to [0, 100] across
//! the run. Clusters are ranked descending by need score and priority
//! labels assigned in rank order.

use shelter_map_models::{ClusterSummary, DemandPoint, PipelineProfile, Priority};
use shelter_map_spatial::nearest_shelter_km;

use crate::kmeans::ClusteringOutcome;

/// Scores every cluster and returns the summaries ranked by descending
/// need score (the order the clusters table is written in).
#[must_use]
pub fn score_clusters(
    outcome: &ClusteringOutcome,
    points: &[DemandPoint],
    shelter_coords: &[(f64, f64)],
    profile: PipelineProfile,
) -> Vec<ClusterSummary> {
    let mut summaries: Vec<ClusterSummary> = outcome
        .centroids
        .iter()
        .enumerate()
        .map(|(cluster_id, &(centroid_lat, centroid_lon))| {
            let severity = aggregate_severity(cluster_id, outcome, points, profile);
            let distance = nearest_shelter_km(centroid_lat, centroid_lon, shelter_coords);

            ClusterSummary {
                cluster_id,
                centroid_lat,
                centroid_lon,
                severity,
                nearest_shelter_km: distance,
                need_score_raw: severity * distance,
                need_score: 0.0,
                priority: None,
            }
        })
        .collect();

    let max_raw = summaries
        .iter()
        .map(|s| s.need_score_raw)
        .fold(0.0f64, f64::max);

    // Guard the all-zero case so normalization never divides by zero.
    if max_raw > 0.0 {
        for summary in &mut summaries {
            summary.need_score = summary.need_score_raw / max_raw * 100.0;
        }
    }

    summaries.sort_by(|a, b| b.need_score.total_cmp(&a.need_score));

    for (rank, summary) in summaries.iter_mut().enumerate() {
        summary.priority = Priority::ranked().get(rank).copied();
    }

    log_report(&summaries);
    summaries
}

/// Aggregate severity of one cluster's member points: mean weight under
/// profile A, summed weight under profile B. 0 for an empty cluster.
fn aggregate_severity(
    cluster_id: usize,
    outcome: &ClusteringOutcome,
    points: &[DemandPoint],
    profile: PipelineProfile,
) -> f64 {
    let weights: Vec<f64> = outcome
        .assignments
        .iter()
        .zip(points)
        .filter(|&(&cid, _)| cid == cluster_id)
        .map(|(_, p)| p.weight)
        .collect();

    if weights.is_empty() {
        return 0.0;
    }

    let sum: f64 = weights.iter().sum();
    if profile.severity_is_mean() {
        #[allow(clippy::cast_precision_loss)]
        let count = weights.len() as f64;
        sum / count
    } else {
        sum
    }
}

/// Logs the ranked recommendation report.
fn log_report(summaries: &[ClusterSummary]) {
    log::info!("Shelter recommendation analysis:");
    for s in summaries {
        let label = s.priority.map_or_else(String::new, |p| p.to_string());
        log::info!(
            "[{label}] Cluster {}: location ({:.6}, {:.6}), severity {:.1}, \
             nearest shelter {:.2} km, need score {:.1}/100",
            s.cluster_id,
            s.centroid_lat,
            s.centroid_lon,
            s.severity,
            s.nearest_shelter_km,
            s.need_score
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmeans::{ClusterConfig, cluster_demand};
    use shelter_map_models::DemandSource;

    fn point(lat: f64, lon: f64, weight: f64) -> DemandPoint {
        DemandPoint {
            name: String::new(),
            lat,
            lon,
            weight,
            source: DemandSource::Encampment,
        }
    }

    fn outcome_for(points: &[DemandPoint], k: usize) -> ClusteringOutcome {
        cluster_demand(points, ClusterConfig { k, seed: 42 }).unwrap()
    }

    #[test]
    fn max_need_score_is_100_when_any_positive() {
        let points = vec![
            point(43.70, -79.40, 2.0),
            point(43.71, -79.41, 1.0),
            point(43.90, -79.20, 0.5),
        ];
        let outcome = outcome_for(&points, 2);
        let shelters = vec![(43.65, -79.38)];
        let summaries = score_clusters(
            &outcome,
            &points,
            &shelters,
            PipelineProfile::EncampmentsOnly,
        );

        let max = summaries
            .iter()
            .map(|s| s.need_score)
            .fold(0.0f64, f64::max);
        assert!((max - 100.0).abs() < 1e-9);
    }

    #[test]
    fn all_scores_zero_when_raw_need_is_zero() {
        let points = vec![point(43.70, -79.40, 0.0), point(43.90, -79.20, 0.0)];
        let outcome = outcome_for(&points, 2);
        let shelters = vec![(43.65, -79.38)];
        let summaries = score_clusters(
            &outcome,
            &points,
            &shelters,
            PipelineProfile::EncampmentsOnly,
        );

        for s in &summaries {
            assert!(s.need_score.abs() < f64::EPSILON);
        }
    }

    #[test]
    fn sentinel_distance_when_no_shelters() {
        let points = vec![point(43.70, -79.40, 1.0)];
        let outcome = outcome_for(&points, 1);
        let summaries =
            score_clusters(&outcome, &points, &[], PipelineProfile::EncampmentsOnly);
        assert!((summaries[0].nearest_shelter_km - 999.0).abs() < f64::EPSILON);
    }

    #[test]
    fn severity_mean_vs_sum_by_profile() {
        let points = vec![point(43.70, -79.40, 2.0), point(43.701, -79.401, 1.0)];
        let outcome = outcome_for(&points, 1);
        let shelters = vec![(43.65, -79.38)];

        let mean = score_clusters(
            &outcome,
            &points,
            &shelters,
            PipelineProfile::EncampmentsOnly,
        );
        assert!((mean[0].severity - 1.5).abs() < 1e-9);

        let sum = score_clusters(
            &outcome,
            &points,
            &shelters,
            PipelineProfile::ShelterWeighted,
        );
        assert!((sum[0].severity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn priorities_descend_without_repeats() {
        let points = vec![
            point(43.70, -79.40, 2.0),
            point(43.75, -79.30, 1.0),
            point(43.80, -79.25, 3.0),
            point(43.66, -79.50, 0.5),
            point(43.90, -79.20, 1.5),
        ];
        let outcome = outcome_for(&points, 5);
        let shelters = vec![(43.65, -79.38)];
        let summaries = score_clusters(
            &outcome,
            &points,
            &shelters,
            PipelineProfile::EncampmentsOnly,
        );

        let labels: Vec<Priority> = summaries.iter().filter_map(|s| s.priority).collect();
        assert_eq!(labels.len(), 5);

        let mut deduped = labels.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), 5, "no label repeats");

        for pair in summaries.windows(2) {
            assert!(pair[0].need_score >= pair[1].need_score);
        }
        assert_eq!(summaries[0].priority, Some(Priority::High));
        assert_eq!(summaries[4].priority, Some(Priority::Low));
    }

    #[test]
    fn empty_clusters_score_without_crashing() {
        // Three distinct locations into five clusters leaves empties.
        let points = vec![
            point(43.70, -79.40, 1.0),
            point(43.71, -79.41, 1.0),
            point(43.90, -79.20, 1.0),
        ];
        let outcome = outcome_for(&points, 5);
        let shelters = vec![(43.65, -79.38)];
        let summaries = score_clusters(
            &outcome,
            &points,
            &shelters,
            PipelineProfile::EncampmentsOnly,
        );

        assert_eq!(summaries.len(), 5);
        let empties = summaries
            .iter()
            .filter(|s| s.severity.abs() < f64::EPSILON)
            .count();
        assert!(empties >= 2);
    }

    #[test]
    fn clusters_beyond_label_list_stay_unlabeled() {
        let points: Vec<DemandPoint> = (0..7)
            .map(|i| point(43.60 + f64::from(i) * 0.05, -79.40, 1.0 + f64::from(i)))
            .collect();
        let outcome = outcome_for(&points, 7);
        let shelters = vec![(43.65, -79.38)];
        let summaries = score_clusters(
            &outcome,
            &points,
            &shelters,
            PipelineProfile::EncampmentsOnly,
        );

        assert_eq!(summaries.len(), 7);
        assert!(summaries[5].priority.is_none());
        assert!(summaries[6].priority.is_none());
    }
}
