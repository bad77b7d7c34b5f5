//! Weighted fixed-k clustering of demand points.
//!
//! Each demand point is replicated `max(1, round(weight * 10))` times and
//! k-means runs over the replicated set in raw (lat, lon) degree space.
//! Degree-space clustering distorts east-west distances away from the
//! equator; that approximation is part of the contract, not a bug to fix.
//! Original (non-replicated) points are then assigned to the centroid
//! nearest by *geodesic* distance -- the metric asymmetry between
//! clustering and assignment is deliberate and preserved.
//!
//! Initial centers: the first is drawn from the seeded RNG, the rest by
//! farthest-point (maximin) selection over the expanded set. The whole
//! procedure is deterministic for a fixed input and seed.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use shelter_map_models::DemandPoint;
use shelter_map_spatial::haversine_km;

use crate::ClusterError;

/// Default cluster count.
pub const DEFAULT_K: usize = 5;

/// Default clustering seed.
pub const DEFAULT_SEED: u64 = 42;

/// Replication factor applied to weights before rounding.
const WEIGHT_REPLICATION: f64 = 10.0;

/// Lloyd iteration cap. Assignments converge long before this on any
/// realistic input; the cap only bounds degenerate cycling.
const MAX_ITERATIONS: usize = 100;

/// Clustering parameters.
#[derive(Debug, Clone, Copy)]
pub struct ClusterConfig {
    /// Number of clusters to produce.
    pub k: usize,
    /// RNG seed for initial center selection.
    pub seed: u64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            seed: DEFAULT_SEED,
        }
    }
}

/// Result of clustering a demand table.
#[derive(Debug, Clone)]
pub struct ClusteringOutcome {
    /// Exactly `k` centroids in (lat, lon) degree space. A centroid may
    /// own no original points; empty clusters are valid.
    pub centroids: Vec<(f64, f64)>,
    /// Cluster id for each *original* demand point, parallel to the
    /// input slice. Assigned by geodesic distance to the centroids.
    pub assignments: Vec<usize>,
}

/// Replication count for a demand weight: `max(1, round(weight * 10))`.
///
/// Floors at 1 so every point still influences the clustering, even at
/// zero weight. Non-finite weights count as zero before rounding.
#[must_use]
pub fn expansion_count(weight: f64) -> usize {
    let w = if weight.is_finite() { weight } else { 0.0 };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let reps = (w * WEIGHT_REPLICATION).round() as usize;
    reps.max(1)
}

/// Clusters the demand table into exactly `config.k` geographic clusters.
///
/// # Errors
///
/// Returns [`ClusterError`] when the input is empty, `k` is zero, or the
/// expanded set is smaller than `k`. These abort the pipeline run.
pub fn cluster_demand(
    points: &[DemandPoint],
    config: ClusterConfig,
) -> Result<ClusteringOutcome, ClusterError> {
    if points.is_empty() {
        return Err(ClusterError::EmptyInput);
    }
    if config.k == 0 {
        return Err(ClusterError::ZeroClusters);
    }

    let expanded: Vec<(f64, f64)> = points
        .iter()
        .flat_map(|p| std::iter::repeat_n((p.lat, p.lon), expansion_count(p.weight)))
        .collect();

    if expanded.len() < config.k {
        return Err(ClusterError::NotEnoughPoints {
            points: expanded.len(),
            k: config.k,
        });
    }

    log::info!(
        "Clustering {} demand points ({} after weight expansion) into {} clusters",
        points.len(),
        expanded.len(),
        config.k
    );

    let centroids = lloyd(&expanded, config);

    let assignments = points
        .iter()
        .map(|p| nearest_centroid_geodesic(p.lat, p.lon, &centroids))
        .collect();

    Ok(ClusteringOutcome {
        centroids,
        assignments,
    })
}

/// Runs seeded initialization plus Lloyd iterations over the expanded set.
fn lloyd(expanded: &[(f64, f64)], config: ClusterConfig) -> Vec<(f64, f64)> {
    let mut centroids = initial_centers(expanded, config);
    let mut labels = vec![usize::MAX; expanded.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, &(lat, lon)) in expanded.iter().enumerate() {
            let label = nearest_centroid_euclidean(lat, lon, &centroids);
            if labels[i] != label {
                labels[i] = label;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        // Recompute centroids as member means; an emptied centroid keeps
        // its previous position so exactly k clusters always come out.
        let mut sums = vec![(0.0f64, 0.0f64, 0usize); centroids.len()];
        for (i, &(lat, lon)) in expanded.iter().enumerate() {
            let (s_lat, s_lon, n) = &mut sums[labels[i]];
            *s_lat += lat;
            *s_lon += lon;
            *n += 1;
        }
        for (centroid, (s_lat, s_lon, n)) in centroids.iter_mut().zip(&sums) {
            if *n > 0 {
                #[allow(clippy::cast_precision_loss)]
                let count = *n as f64;
                *centroid = (s_lat / count, s_lon / count);
            }
        }
    }

    centroids
}

/// Picks the initial k centers: one seeded-random draw, then repeated
/// farthest-point selection.
fn initial_centers(expanded: &[(f64, f64)], config: ClusterConfig) -> Vec<(f64, f64)> {
    let mut rng = SmallRng::seed_from_u64(config.seed);
    let first = rng.gen_range(0..expanded.len());

    let mut centers = Vec::with_capacity(config.k);
    centers.push(expanded[first]);

    let mut min_d2: Vec<f64> = expanded
        .iter()
        .map(|&(lat, lon)| squared_degree_distance(lat, lon, expanded[first]))
        .collect();

    while centers.len() < config.k {
        let next = min_d2
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map_or(0, |(i, _)| i);
        let center = expanded[next];
        centers.push(center);

        for (d2, &(lat, lon)) in min_d2.iter_mut().zip(expanded) {
            *d2 = d2.min(squared_degree_distance(lat, lon, center));
        }
    }

    centers
}

fn squared_degree_distance(lat: f64, lon: f64, (c_lat, c_lon): (f64, f64)) -> f64 {
    let dlat = lat - c_lat;
    let dlon = lon - c_lon;
    dlat.mul_add(dlat, dlon * dlon)
}

/// Nearest centroid by squared Euclidean degree distance (clustering
/// metric).
fn nearest_centroid_euclidean(lat: f64, lon: f64, centroids: &[(f64, f64)]) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|&(_, &a), &(_, &b)| {
            squared_degree_distance(lat, lon, a).total_cmp(&squared_degree_distance(lat, lon, b))
        })
        .map_or(0, |(i, _)| i)
}

/// Nearest centroid by haversine distance (assignment metric).
fn nearest_centroid_geodesic(lat: f64, lon: f64, centroids: &[(f64, f64)]) -> usize {
    centroids
        .iter()
        .enumerate()
        .min_by(|&(_, &(a_lat, a_lon)), &(_, &(b_lat, b_lon))| {
            haversine_km(lat, lon, a_lat, a_lon).total_cmp(&haversine_km(lat, lon, b_lat, b_lon))
        })
        .map_or(0, |(i, _)| i)
}
