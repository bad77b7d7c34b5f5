#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! CSV ingestion for the shelter map pipeline.
//!
//! Loads the two heterogeneous input tables -- shelter occupancy reports
//! and encampment locations -- into typed rows, normalizing missing and
//! malformed cells at the boundary. Also hosts the Shelter Aggregator and
//! the Demand Point Builder, which turn those rows into the tables the
//! clustering stage consumes.
//!
//! Input files are required: a missing or unreadable file is a fatal
//! pipeline error. Malformed *cells* are not -- they collapse to the null
//! sentinel (or a field-specific default) via [`parsing`].

pub mod aggregate;
pub mod demand;
pub mod parsing;

use std::fs::File;
use std::io;
use std::path::Path;

use shelter_map_models::{DemandPoint, DemandSource, ShelterRecord};
use thiserror::Error;

/// Errors from loading input tables.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input file could not be opened or read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV structure was unreadable (not a per-cell value problem).
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Column names expected in the shelter occupancy CSV.
const SHELTER_NAME_COL: &str = "LOCATION_NAME";
const SHELTER_ADDRESS_COL: &str = "LOCATION_ADDRESS";
const SHELTER_CAPACITY_COL: &str = "CAPACITY_FUNDING_BED";
const SHELTER_OCCUPIED_COL: &str = "OCCUPIED_BEDS";
const SHELTER_RATE_COL: &str = "OCCUPANCY_RATE_BEDS";

/// Loads raw shelter occupancy rows from `path`.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened or the CSV
/// structure is unreadable. Missing columns and malformed cells are not
/// errors; they load as `None`.
pub fn load_shelter_records(path: &Path) -> Result<Vec<ShelterRecord>, IngestError> {
    let records = shelter_records_from_reader(File::open(path)?)?;
    log::info!(
        "Loaded {} shelter report rows from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Parses shelter occupancy rows from any reader.
///
/// # Errors
///
/// Returns [`IngestError`] if the CSV structure is unreadable.
pub fn shelter_records_from_reader<R: io::Read>(
    reader: R,
) -> Result<Vec<ShelterRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let name_idx = column_index(&headers, SHELTER_NAME_COL);
    let address_idx = column_index(&headers, SHELTER_ADDRESS_COL);
    let capacity_idx = column_index(&headers, SHELTER_CAPACITY_COL);
    let occupied_idx = column_index(&headers, SHELTER_OCCUPIED_COL);
    let rate_idx = column_index(&headers, SHELTER_RATE_COL);

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        records.push(ShelterRecord {
            name: cell(&row, name_idx).unwrap_or_default().trim().to_string(),
            address: cell(&row, address_idx)
                .unwrap_or_default()
                .trim()
                .to_string(),
            capacity_funding_bed: parsing::parse_f64_opt(cell(&row, capacity_idx)),
            occupied_beds: parsing::parse_f64_opt(cell(&row, occupied_idx)),
            occupancy_rate_beds: parsing::parse_f64_opt(cell(&row, rate_idx)),
        });
    }

    Ok(records)
}

/// Loads encampment rows from `path` as weighted demand points.
///
/// Rows without a usable coordinate pair are dropped (and counted in the
/// log); weights default to 1.0 when missing or non-numeric.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened or the CSV
/// structure is unreadable.
pub fn load_encampments(path: &Path) -> Result<Vec<DemandPoint>, IngestError> {
    let points = encampments_from_reader(File::open(path)?)?;
    log::info!(
        "Loaded {} encampment demand points from {}",
        points.len(),
        path.display()
    );
    Ok(points)
}

/// Parses encampment rows from any reader.
///
/// # Errors
///
/// Returns [`IngestError`] if the CSV structure is unreadable.
pub fn encampments_from_reader<R: io::Read>(reader: R) -> Result<Vec<DemandPoint>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let name_idx = column_index(&headers, "name");
    let lat_idx = column_index(&headers, "lat");
    let lon_idx = column_index(&headers, "lon");
    let weight_idx = column_index(&headers, "weight");

    let mut points = Vec::new();
    let mut dropped = 0usize;

    for row in csv_reader.records() {
        let row = row?;
        let Some((lat, lon)) = parsing::parse_lat_lon(cell(&row, lat_idx), cell(&row, lon_idx))
        else {
            dropped += 1;
            continue;
        };

        points.push(DemandPoint {
            name: cell(&row, name_idx).unwrap_or_default().trim().to_string(),
            lat,
            lon,
            weight: parsing::parse_weight(cell(&row, weight_idx)),
            source: DemandSource::Encampment,
        });
    }

    if dropped > 0 {
        log::warn!("Dropped {dropped} encampment rows without usable coordinates");
    }

    Ok(points)
}

/// Finds a column's position by exact header name.
fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Fetches a cell by optional column index, treating empty as absent.
fn cell<'r>(row: &'r csv::StringRecord, idx: Option<usize>) -> Option<&'r str> {
    let value = row.get(idx?)?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
