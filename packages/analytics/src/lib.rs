#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Weighted demand clustering and need scoring.
//!
//! [`kmeans`] partitions the demand table into a fixed number of
//! geographic clusters, replicating points by weight so clusters reflect
//! concentration of *weighted* demand rather than raw point count.
//! [`score`] then rates each cluster's unmet need against the geocoded
//! shelter set and assigns rank-ordered priority labels.

pub mod kmeans;
pub mod score;

use thiserror::Error;

/// Errors from the clustering stage. All of these are fatal to a pipeline
/// run: there is no partial-output recovery from a failed clustering.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The demand table was empty.
    #[error("no demand points to cluster")]
    EmptyInput,

    /// A cluster count of zero was requested.
    #[error("cluster count must be at least 1")]
    ZeroClusters,

    /// Fewer expanded points than requested clusters.
    #[error("{points} expanded demand points cannot seed {k} clusters")]
    NotEnoughPoints {
        /// Size of the expanded (replicated) coordinate set.
        points: usize,
        /// Requested cluster count.
        k: usize,
    },
}
