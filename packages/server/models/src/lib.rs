#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! API response types for the shelter map server.
//!
//! The three table endpoints serve the output CSVs verbatim, so their row
//! type is a dynamic column map rather than a fixed struct -- the clusters
//! schema differs by pipeline profile and the API contract is "whatever
//! the pipeline wrote". Only the synthesized additions are typed here.

use serde::{Deserialize, Serialize};

/// Radius of the synthesized cluster boundary circle, km.
pub const BOUNDARY_RADIUS_KM: f64 = 1.2;

/// One row of a served table: column name to JSON value.
pub type TableRow = serde_json::Map<String, serde_json::Value>;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// A cluster row augmented with its map boundary polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCluster {
    /// The cluster row exactly as the pipeline wrote it.
    #[serde(flatten)]
    pub row: TableRow,
    /// 24-vertex circle around the cluster's representative point, each
    /// vertex `[lat, lon]`.
    pub boundary: Vec<[f64; 2]>,
}
