//! HTTP handler functions for the shelter map API.

use std::path::Path;

use actix_web::{HttpResponse, web};
use shelter_map_server_models::{ApiCluster, ApiHealth, BOUNDARY_RADIUS_KM, TableRow};
use shelter_map_spatial::boundary_circle;

use crate::AppState;

/// Output file names produced by the pipeline. Duplicated here rather than
/// imported so the read-only server doesn't depend on the pipeline crates.
const DEMAND_CSV: &str = "demand_out.csv";
const SHELTERS_CSV: &str = "shelters_out.csv";
const CLUSTERS_CSV: &str = "clusters_out.csv";

/// `GET /`
pub async fn index() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Shelter Map API is running"
    }))
}

/// `GET /health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /shelters`
///
/// Returns the shelters output table as a list of records.
pub async fn shelters(state: web::Data<AppState>) -> HttpResponse {
    let rows = read_table(&state.data_dir.join(SHELTERS_CSV));
    HttpResponse::Ok().json(rows)
}

/// `GET /homeless`
///
/// Returns the demand-point output table as a list of records.
pub async fn homeless(state: web::Data<AppState>) -> HttpResponse {
    let rows = read_table(&state.data_dir.join(DEMAND_CSV));
    HttpResponse::Ok().json(rows)
}

/// `GET /clusters`
///
/// Returns the cluster summary table, each row augmented with a circular
/// `boundary` polygon around its representative point for map display.
pub async fn clusters(state: web::Data<AppState>) -> HttpResponse {
    let rows = read_table(&state.data_dir.join(CLUSTERS_CSV));

    let augmented: Vec<ApiCluster> = rows
        .into_iter()
        .map(|row| {
            let boundary = representative_point(&row)
                .map(|(lat, lon)| boundary_circle(lat, lon, BOUNDARY_RADIUS_KM))
                .unwrap_or_default();
            ApiCluster { row, boundary }
        })
        .collect();

    HttpResponse::Ok().json(augmented)
}

/// Extracts a cluster row's representative point. Profile A writes
/// `recommended_lat`/`recommended_lon`, profile B `centroid_lat`/
/// `centroid_lon`; either is accepted.
fn representative_point(row: &TableRow) -> Option<(f64, f64)> {
    let coord = |key: &str| row.get(key).and_then(serde_json::Value::as_f64);

    coord("recommended_lat")
        .zip(coord("recommended_lon"))
        .or_else(|| coord("centroid_lat").zip(coord("centroid_lon")))
}

/// Reads an output CSV into JSON rows.
///
/// A missing or malformed file yields an empty table rather than an
/// error response; the API stays up between pipeline runs.
fn read_table(path: &Path) -> Vec<TableRow> {
    match std::fs::File::open(path) {
        Ok(file) => match table_from_reader(file) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!("Failed to parse {}: {e}", path.display());
                Vec::new()
            }
        },
        Err(e) => {
            log::warn!("Failed to open {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Parses CSV rows from any reader into header-keyed JSON objects.
fn table_from_reader<R: std::io::Read>(reader: R) -> Result<Vec<TableRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let row: TableRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), cell_value(cell)))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Converts one CSV cell to a JSON value.
///
/// Numeric cells become numbers; empty and non-finite cells become 0 so
/// every row is JSON-serializable; anything else stays a string.
fn cell_value(raw: &str) -> serde_json::Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return serde_json::json!(0);
    }

    if let Ok(int) = trimmed.parse::<i64>() {
        return serde_json::json!(int);
    }

    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            return serde_json::json!(float);
        }
        return serde_json::json!(0);
    }

    serde_json::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_empty_table() {
        let rows = read_table(Path::new("/definitely/not/here.csv"));
        assert!(rows.is_empty());
    }

    #[test]
    fn parses_rows_with_numeric_coercion() {
        let csv = "name,lat,occ_rate\nSeaton House,43.6596,\n";
        let rows = table_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], serde_json::json!("Seaton House"));
        assert_eq!(rows[0]["lat"], serde_json::json!(43.6596));
        // Empty numeric cell is substituted with 0, not null.
        assert_eq!(rows[0]["occ_rate"], serde_json::json!(0));
    }

    #[test]
    fn non_finite_cells_become_zero() {
        let csv = "a,b\nNaN,inf\n";
        let rows = table_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows[0]["a"], serde_json::json!(0));
        assert_eq!(rows[0]["b"], serde_json::json!(0));
    }

    #[test]
    fn integers_stay_integers() {
        let csv = "cluster_id\n3\n";
        let rows = table_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(rows[0]["cluster_id"], serde_json::json!(3));
    }

    #[test]
    fn representative_point_reads_either_schema() {
        let a: TableRow = serde_json::from_value(serde_json::json!({
            "recommended_lat": 43.65, "recommended_lon": -79.38
        }))
        .unwrap();
        assert_eq!(representative_point(&a), Some((43.65, -79.38)));

        let b: TableRow = serde_json::from_value(serde_json::json!({
            "centroid_lat": 43.70, "centroid_lon": -79.40
        }))
        .unwrap();
        assert_eq!(representative_point(&b), Some((43.70, -79.40)));

        let neither: TableRow =
            serde_json::from_value(serde_json::json!({"cluster_id": 1})).unwrap();
        assert_eq!(representative_point(&neither), None);
    }

    #[test]
    fn cluster_boundary_has_24_vertices() {
        let row: TableRow = serde_json::from_value(serde_json::json!({
            "recommended_lat": 43.65, "recommended_lon": -79.38
        }))
        .unwrap();
        let (lat, lon) = representative_point(&row).unwrap();
        let boundary = boundary_circle(lat, lon, BOUNDARY_RADIUS_KM);
        assert_eq!(boundary.len(), 24);
    }
}
