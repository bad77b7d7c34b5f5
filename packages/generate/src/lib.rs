#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Output materializer for the shelter map pipeline.
//!
//! Produces the three flat tables the API layer serves -- demand points,
//! shelters, and cluster summaries -- as local CSV files, and mirrors
//! them to the warehouse when a sink client can be constructed.
//!
//! Local writes are the guaranteed phase: they execute after the upload
//! attempt regardless of its outcome, so a warehouse failure never costs
//! the run its outputs. Warehouse construction and per-table upload
//! failures are logged, never raised.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use shelter_map_models::{ClusterRowA, ClusterRowB, DemandRow, GeocodedShelter};
use shelter_map_warehouse::WarehouseClient;
use thiserror::Error;

/// Local file name of the demand table.
pub const DEMAND_CSV: &str = "demand_out.csv";
/// Local file name of the shelters table.
pub const SHELTERS_CSV: &str = "shelters_out.csv";
/// Local file name of the clusters table.
pub const CLUSTERS_CSV: &str = "clusters_out.csv";

/// Warehouse table receiving demand rows.
pub const DEMAND_TABLE: &str = "homeless_points";
/// Warehouse table receiving shelter rows.
pub const SHELTERS_TABLE: &str = "shelters";
/// Warehouse table receiving cluster rows.
pub const CLUSTERS_TABLE: &str = "clusters";

/// Errors from local materialization. These are fatal: losing the local
/// outputs means the run produced nothing the API can serve.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// Output directory or file could not be created/written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A row failed to serialize as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// The clusters table, whose schema depends on the pipeline profile.
#[derive(Debug, Clone)]
pub enum ClusterTable {
    /// Profile A rows (`recommended_*` columns with need score and
    /// priority).
    ProfileA(Vec<ClusterRowA>),
    /// Profile B rows (`centroid_*` columns with population weight).
    ProfileB(Vec<ClusterRowB>),
}

impl ClusterTable {
    /// Number of cluster rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::ProfileA(rows) => rows.len(),
            Self::ProfileB(rows) => rows.len(),
        }
    }

    /// Whether the table holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything one pipeline run materializes.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Demand points with cluster assignments.
    pub demand: Vec<DemandRow>,
    /// Geocoded aggregated shelters.
    pub shelters: Vec<GeocodedShelter>,
    /// Ranked cluster summaries.
    pub clusters: ClusterTable,
}

/// Materializes a run: warehouse mirror attempt first, then the
/// unconditional local CSV writes.
///
/// # Errors
///
/// Returns [`MaterializeError`] only for local write failures. Warehouse
/// problems are absorbed and logged.
pub async fn materialize(output: &PipelineOutput, dir: &Path) -> Result<(), MaterializeError> {
    match WarehouseClient::from_env() {
        Ok(client) => upload_all(&client, output).await,
        Err(e) => {
            log::warn!("Could not create warehouse client; continuing without upload: {e}");
        }
    }

    // Guaranteed phase: local CSVs are written no matter what happened
    // above.
    write_outputs(output, dir)
}

/// Uploads all three tables, logging (not raising) per-table failures.
async fn upload_all(client: &WarehouseClient, output: &PipelineOutput) {
    if let Err(e) = client.upload_table(DEMAND_TABLE, &output.demand).await {
        log::error!("Upload failed for {DEMAND_TABLE}: {e}");
    }
    if let Err(e) = client.upload_table(SHELTERS_TABLE, &output.shelters).await {
        log::error!("Upload failed for {SHELTERS_TABLE}: {e}");
    }
    let clusters_result = match &output.clusters {
        ClusterTable::ProfileA(rows) => client.upload_table(CLUSTERS_TABLE, rows).await,
        ClusterTable::ProfileB(rows) => client.upload_table(CLUSTERS_TABLE, rows).await,
    };
    if let Err(e) = clusters_result {
        log::error!("Upload failed for {CLUSTERS_TABLE}: {e}");
    }
}

/// Writes the three output CSVs into `dir`, creating it if needed.
///
/// # Errors
///
/// Returns [`MaterializeError`] if the directory or any file cannot be
/// written.
pub fn write_outputs(output: &PipelineOutput, dir: &Path) -> Result<(), MaterializeError> {
    fs::create_dir_all(dir)?;

    write_table(&dir.join(DEMAND_CSV), &output.demand)?;
    write_table(&dir.join(SHELTERS_CSV), &output.shelters)?;
    match &output.clusters {
        ClusterTable::ProfileA(rows) => write_table(&dir.join(CLUSTERS_CSV), rows)?,
        ClusterTable::ProfileB(rows) => write_table(&dir.join(CLUSTERS_CSV), rows)?,
    }

    log::info!(
        "Wrote local CSVs to {}: {DEMAND_CSV} ({} rows), {SHELTERS_CSV} ({} rows), {CLUSTERS_CSV} ({} rows)",
        dir.display(),
        output.demand.len(),
        output.shelters.len(),
        output.clusters.len()
    );
    Ok(())
}

/// Writes one table of serializable rows to `path`.
fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), MaterializeError> {
    let file = fs::File::create(path)?;
    write_table_to(file, rows)
}

/// Writes one table of serializable rows to any writer.
fn write_table_to<W: io::Write, T: Serialize>(
    writer: W,
    rows: &[T],
) -> Result<(), MaterializeError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelter_map_models::{DemandSource, Priority};

    #[test]
    fn demand_rows_serialize_with_expected_columns() {
        let rows = vec![DemandRow {
            point_name: "Moss Park".to_string(),
            lat: 43.655,
            lon: -79.367,
            weight: 2.0,
            source: DemandSource::Encampment,
            cluster_id: 3,
        }];

        let mut buffer = Vec::new();
        write_table_to(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "point_name,lat,lon,weight,source,cluster_id"
        );
        assert_eq!(lines.next().unwrap(), "Moss Park,43.655,-79.367,2.0,encampment,3");
    }

    #[test]
    fn cluster_rows_a_serialize_priority_label() {
        let rows = vec![
            ClusterRowA {
                cluster_id: 0,
                recommended_lat: 43.65,
                recommended_lon: -79.38,
                avg_severity_index: 1.5,
                distance_to_nearest_shelter_km: 3.2,
                need_score: 100.0,
                priority: Some(Priority::High),
            },
            ClusterRowA {
                cluster_id: 1,
                recommended_lat: 43.70,
                recommended_lon: -79.30,
                avg_severity_index: 0.0,
                distance_to_nearest_shelter_km: 1.0,
                need_score: 0.0,
                priority: None,
            },
        ];

        let mut buffer = Vec::new();
        write_table_to(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("cluster_id,recommended_lat"));
        assert!(lines.next().unwrap().ends_with(",HIGH"));
        // Unlabeled clusters leave the priority cell blank.
        assert!(lines.next().unwrap().ends_with(","));
    }

    #[test]
    fn shelter_rows_leave_unknown_occupancy_blank() {
        let rows = vec![GeocodedShelter {
            name: "Seaton House".to_string(),
            address: "339 George St".to_string(),
            lat: 43.6596,
            lon: -79.3712,
            avg_capacity_beds: Some(40.0),
            avg_occupied_beds: None,
            occ_rate: None,
        }];

        let mut buffer = Vec::new();
        write_table_to(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.lines().nth(1).unwrap().ends_with("40.0,,"));
    }
}
