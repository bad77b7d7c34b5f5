//! Full pipeline orchestrator.
//!
//! Chains load -> aggregate -> geocode -> build demand -> cluster ->
//! score -> materialize in one batch run. No step retries; an unhandled
//! step failure aborts the run with no partial-output guarantee. The two
//! exceptions are absorbed lower down: per-address geocoding failures
//! (shelter dropped from the geocoded set) and warehouse upload failures
//! (outputs still written locally).

use std::path::PathBuf;
use std::time::Instant;

use shelter_map_analytics::kmeans::{ClusterConfig, cluster_demand};
use shelter_map_analytics::score::score_clusters;
use shelter_map_cli_utils::{IndicatifProgress, MultiProgress};
use shelter_map_generate::{ClusterTable, PipelineOutput, materialize};
use shelter_map_geocoder::cache::GeocodeCache;
use shelter_map_geocoder::{DEFAULT_NOMINATIM_URL, DEFAULT_QUERY_SUFFIX, Resolver};
use shelter_map_ingest::aggregate::aggregate_shelters;
use shelter_map_ingest::demand::build_demand;
use shelter_map_ingest::{load_encampments, load_shelter_records};
use shelter_map_models::{ClusterSummary, DemandRow, GeocodedShelter, PipelineProfile};

/// Total number of pipeline steps, for `[n/7]` log prefixes.
const TOTAL_STEPS: usize = 7;

/// Configuration for one pipeline run.
pub struct PipelineArgs {
    /// Shelter occupancy report CSV.
    pub shelters: PathBuf,
    /// Encampment locations CSV.
    pub encampments: PathBuf,
    /// Geocode cache CSV.
    pub cache: PathBuf,
    /// Output directory for the three tables.
    pub out_dir: PathBuf,
    /// Pipeline profile.
    pub profile: PipelineProfile,
    /// Number of demand clusters.
    pub k: usize,
    /// Clustering seed.
    pub seed: u64,
    /// Minimum delay between geocoder calls, ms.
    pub rate_limit_ms: u64,
}

/// Runs the full pipeline.
///
/// # Errors
///
/// Returns an error when a required input file is missing or unreadable,
/// when clustering fails internally, or when the local outputs cannot be
/// written.
pub async fn run(
    args: &PipelineArgs,
    multi: &MultiProgress,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline_start = Instant::now();
    let profile = args.profile;

    log::info!("[1/{TOTAL_STEPS}] Loading input tables ({profile} profile)...");
    let shelter_records = load_shelter_records(&args.shelters)?;
    let encampments = load_encampments(&args.encampments)?;

    log::info!("[2/{TOTAL_STEPS}] Aggregating shelter data...");
    let aggregated = aggregate_shelters(&shelter_records, profile);

    log::info!("[3/{TOTAL_STEPS}] Geocoding shelter addresses...");
    let mut cache = GeocodeCache::load(&args.cache)?;
    let resolver = Resolver::new(
        std::env::var("SHELTER_MAP_NOMINATIM_URL")
            .unwrap_or_else(|_| DEFAULT_NOMINATIM_URL.to_string()),
        DEFAULT_QUERY_SUFFIX,
        args.rate_limit_ms,
    )?;

    let bar = IndicatifProgress::records_bar(multi, &format!("[3/{TOTAL_STEPS}] Geocoding"));
    bar.set_total(aggregated.len() as u64);

    let mut geocoded: Vec<GeocodedShelter> = Vec::new();
    for shelter in &aggregated {
        if let Some((lat, lon)) = resolver.resolve(&mut cache, &shelter.address).await {
            geocoded.push(GeocodedShelter {
                name: shelter.name.clone(),
                address: shelter.address.clone(),
                lat,
                lon,
                avg_capacity_beds: shelter.avg_capacity_beds,
                avg_occupied_beds: shelter.avg_occupied_beds,
                occ_rate: shelter.occ_rate,
            });
        }
        bar.inc(1);
    }
    bar.finish(format!(
        "[3/{TOTAL_STEPS}] Geocoded {}/{} shelters",
        geocoded.len(),
        aggregated.len()
    ));

    // The cache is rewritten wholesale exactly once per run.
    cache.persist(&args.cache)?;
    log::info!(
        "Shelters with valid geocoded locations: {}/{}",
        geocoded.len(),
        aggregated.len()
    );

    log::info!("[4/{TOTAL_STEPS}] Building demand table...");
    let demand = build_demand(encampments, &geocoded, profile);

    log::info!("[5/{TOTAL_STEPS}] Clustering demand points...");
    let outcome = cluster_demand(
        &demand,
        ClusterConfig {
            k: args.k,
            seed: args.seed,
        },
    )?;

    log::info!("[6/{TOTAL_STEPS}] Scoring cluster need...");
    let shelter_coords: Vec<(f64, f64)> = geocoded.iter().map(|s| (s.lat, s.lon)).collect();
    let summaries = score_clusters(&outcome, &demand, &shelter_coords, profile);

    log::info!("[7/{TOTAL_STEPS}] Materializing outputs...");
    let demand_rows: Vec<DemandRow> = demand
        .iter()
        .zip(&outcome.assignments)
        .map(|(point, &cluster_id)| DemandRow {
            point_name: point.name.clone(),
            lat: point.lat,
            lon: point.lon,
            weight: point.weight,
            source: point.source,
            cluster_id,
        })
        .collect();

    let output = PipelineOutput {
        demand: demand_rows,
        shelters: geocoded,
        clusters: cluster_table(summaries, profile),
    };
    materialize(&output, &args.out_dir).await?;

    let elapsed = pipeline_start.elapsed();
    log::info!("Pipeline complete in {:.1}s", elapsed.as_secs_f64());

    Ok(())
}

/// Packs ranked summaries into the profile's clusters-table schema.
fn cluster_table(summaries: Vec<ClusterSummary>, profile: PipelineProfile) -> ClusterTable {
    match profile {
        PipelineProfile::EncampmentsOnly => {
            ClusterTable::ProfileA(summaries.into_iter().map(ClusterSummary::into_row_a).collect())
        }
        PipelineProfile::ShelterWeighted => {
            ClusterTable::ProfileB(summaries.into_iter().map(ClusterSummary::into_row_b).collect())
        }
    }
}
