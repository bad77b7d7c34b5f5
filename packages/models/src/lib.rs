#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Shared domain types for the shelter map pipeline.
//!
//! This crate defines the canonical row and summary types that flow through
//! the pipeline: raw and aggregated shelter records, weighted demand points,
//! cluster summaries, and the serialized output-table rows consumed by the
//! API server and the warehouse sink.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Intervention priority for a cluster, assigned by need-score rank.
///
/// Labels are assigned in rank order, highest need first. With the default
/// cluster count of 5 every label is used exactly once; with a larger
/// cluster count the lowest-ranked clusters stay unlabeled.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Priority {
    /// Highest unmet need.
    #[serde(rename = "HIGH")]
    #[strum(serialize = "HIGH")]
    High,
    /// Second-highest unmet need.
    #[serde(rename = "MEDIUM-HIGH")]
    #[strum(serialize = "MEDIUM-HIGH")]
    MediumHigh,
    /// Middle of the ranking.
    #[serde(rename = "MEDIUM")]
    #[strum(serialize = "MEDIUM")]
    Medium,
    /// Second-lowest unmet need.
    #[serde(rename = "MEDIUM-LOW")]
    #[strum(serialize = "MEDIUM-LOW")]
    MediumLow,
    /// Lowest unmet need.
    #[serde(rename = "LOW")]
    #[strum(serialize = "LOW")]
    Low,
}

impl Priority {
    /// All labels in rank order, highest priority first.
    #[must_use]
    pub const fn ranked() -> &'static [Self] {
        &[
            Self::High,
            Self::MediumHigh,
            Self::Medium,
            Self::MediumLow,
            Self::Low,
        ]
    }
}

/// Where a demand point came from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DemandSource {
    /// An encampment location record.
    Encampment,
    /// A shelter folded into the demand table by its occupancy pressure
    /// (only under [`PipelineProfile::ShelterWeighted`]).
    Shelter,
}

/// Named configuration profile selecting one of the two pipeline variants.
///
/// The variants disagree on population-weight semantics and on whether
/// shelters contribute to clustering input, so the choice is explicit
/// configuration rather than inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum PipelineProfile {
    /// Authoritative default. Only encampments are clustered; cluster
    /// severity is the mean member weight (keeps the 0-100 scale); shelter
    /// rows missing both bed fields are dropped before aggregation and
    /// unknown occupancy falls back to 0.
    #[strum(serialize = "encampments-only")]
    EncampmentsOnly,
    /// Shelters are folded into the demand table weighted by occupancy
    /// pressure; cluster severity is the summed member weight; all shelter
    /// rows are kept and unknown occupancy stays unknown.
    #[strum(serialize = "shelter-weighted")]
    ShelterWeighted,
}

impl PipelineProfile {
    /// Whether geocoded shelters are folded into the demand table.
    #[must_use]
    pub const fn includes_shelter_demand(self) -> bool {
        matches!(self, Self::ShelterWeighted)
    }

    /// Whether cluster severity is the mean member weight (vs. the sum).
    #[must_use]
    pub const fn severity_is_mean(self) -> bool {
        matches!(self, Self::EncampmentsOnly)
    }

    /// Whether shelter rows missing both bed fields are dropped before
    /// aggregation.
    #[must_use]
    pub const fn drops_bedless_rows(self) -> bool {
        matches!(self, Self::EncampmentsOnly)
    }
}

/// A raw shelter occupancy report row as loaded from the input CSV.
///
/// Any numeric field may be absent or non-numeric in the source data; those
/// load as `None` and are excluded from per-shelter means.
#[derive(Debug, Clone, PartialEq)]
pub struct ShelterRecord {
    /// Shelter location name, trimmed.
    pub name: String,
    /// Street address, trimmed.
    pub address: String,
    /// Funded bed capacity.
    pub capacity_funding_bed: Option<f64>,
    /// Beds occupied on the report date.
    pub occupied_beds: Option<f64>,
    /// Occupancy rate as reported by the source, percent.
    pub occupancy_rate_beds: Option<f64>,
}

/// One physical shelter location: per-(name, address) means over all of its
/// report rows, plus the derived occupancy rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedShelter {
    /// Shelter location name.
    pub name: String,
    /// Street address (geocoding key).
    pub address: String,
    /// Mean funded bed capacity over rows where it was present.
    pub avg_capacity_beds: Option<f64>,
    /// Mean occupied beds over rows where it was present.
    pub avg_occupied_beds: Option<f64>,
    /// Mean of the source-reported occupancy rates, when any were present.
    pub avg_reported_rate: Option<f64>,
    /// Derived occupancy rate, percent. Clipped to [0, 100] when computable;
    /// `None` when capacity is zero/unknown and no reported rate exists
    /// (profile A substitutes 0 at derivation time, so under profile A this
    /// is always `Some`).
    pub occ_rate: Option<f64>,
}

/// A shelter location with resolved coordinates.
///
/// Serializes directly as one row of the shelters output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedShelter {
    /// Shelter location name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
    /// Mean funded bed capacity.
    pub avg_capacity_beds: Option<f64>,
    /// Mean occupied beds.
    pub avg_occupied_beds: Option<f64>,
    /// Derived occupancy rate, percent.
    pub occ_rate: Option<f64>,
}

/// A weighted geographic location representing unmet shelter need.
///
/// Invariants: coordinates are always present (rows lacking them are
/// excluded at load) and `weight` is finite and `>= 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandPoint {
    /// Point name from the source record.
    pub name: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lon: f64,
    /// Demand weight. Encampments default to 1.0 when the source value is
    /// missing or non-numeric; shelter-derived points carry their occupancy
    /// pressure in [0, 1].
    pub weight: f64,
    /// Which input produced this point.
    pub source: DemandSource,
}

/// Summary of one geographic demand cluster after scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    /// Cluster id in `[0, k)`.
    pub cluster_id: usize,
    /// Centroid latitude from the clustering algorithm.
    pub centroid_lat: f64,
    /// Centroid longitude from the clustering algorithm.
    pub centroid_lon: f64,
    /// Aggregate severity: mean member weight under profile A, summed
    /// member weight under profile B. 0 for an empty cluster.
    pub severity: f64,
    /// Great-circle distance from the centroid to the nearest geocoded
    /// shelter, km. 999.0 when no shelters exist.
    pub nearest_shelter_km: f64,
    /// Unnormalized need: severity x distance.
    pub need_score_raw: f64,
    /// Need normalized to [0, 100] across all clusters in the run.
    pub need_score: f64,
    /// Rank-assigned priority label; `None` for clusters ranked beyond the
    /// label list.
    pub priority: Option<Priority>,
}

/// One row of the demand output table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRow {
    /// Point name.
    pub point_name: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
    /// Demand weight.
    pub weight: f64,
    /// Source tag.
    pub source: DemandSource,
    /// Assigned cluster id.
    pub cluster_id: usize,
}

/// One row of the clusters output table under profile A
/// ([`PipelineProfile::EncampmentsOnly`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRowA {
    /// Cluster id.
    pub cluster_id: usize,
    /// Recommended intervention latitude (the cluster centroid).
    pub recommended_lat: f64,
    /// Recommended intervention longitude.
    pub recommended_lon: f64,
    /// Mean member weight.
    pub avg_severity_index: f64,
    /// Distance to the nearest existing shelter, km.
    pub distance_to_nearest_shelter_km: f64,
    /// Normalized need score, [0, 100].
    pub need_score: f64,
    /// Rank-assigned priority label; empty for unlabeled clusters.
    pub priority: Option<Priority>,
}

/// One row of the clusters output table under profile B
/// ([`PipelineProfile::ShelterWeighted`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRowB {
    /// Cluster id.
    pub cluster_id: usize,
    /// Cluster centroid latitude.
    pub centroid_lat: f64,
    /// Cluster centroid longitude.
    pub centroid_lon: f64,
    /// Summed member weight.
    pub population_weighted: f64,
    /// Distance to the nearest existing shelter, km.
    pub avg_shelter_distance_km: f64,
}

impl ClusterSummary {
    /// Converts this summary into a profile A output row.
    #[must_use]
    pub fn into_row_a(self) -> ClusterRowA {
        ClusterRowA {
            cluster_id: self.cluster_id,
            recommended_lat: self.centroid_lat,
            recommended_lon: self.centroid_lon,
            avg_severity_index: self.severity,
            distance_to_nearest_shelter_km: self.nearest_shelter_km,
            need_score: self.need_score,
            priority: self.priority,
        }
    }

    /// Converts this summary into a profile B output row.
    #[must_use]
    pub fn into_row_b(self) -> ClusterRowB {
        ClusterRowB {
            cluster_id: self.cluster_id,
            centroid_lat: self.centroid_lat,
            centroid_lon: self.centroid_lon,
            population_weighted: self.severity,
            avg_shelter_distance_km: self.nearest_shelter_km,
        }
    }
}
