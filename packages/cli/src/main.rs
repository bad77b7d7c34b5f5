#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the shelter map toolchain.
//!
//! `shelter_map pipeline` runs the full batch pipeline (load, aggregate,
//! geocode, build demand, cluster, score, materialize); `shelter_map
//! server` starts the read-only API over a previous run's outputs.

mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "shelter_map", about = "Shelter need analysis toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis pipeline over the input CSVs
    Pipeline {
        /// Shelter occupancy report CSV
        #[arg(long, default_value = "shelters.csv")]
        shelters: PathBuf,
        /// Encampment locations CSV
        #[arg(long, default_value = "encampments.csv")]
        encampments: PathBuf,
        /// Geocode cache CSV (created on first run)
        #[arg(long, default_value = "geocode_cache.csv")]
        cache: PathBuf,
        /// Directory receiving the three output tables
        #[arg(long, default_value = "data/out")]
        out_dir: PathBuf,
        /// Pipeline profile: `encampments-only` or `shelter-weighted`
        #[arg(long, default_value = "encampments-only")]
        profile: String,
        /// Number of demand clusters
        #[arg(long, default_value = "5")]
        k: usize,
        /// Clustering seed
        #[arg(long, default_value = "42")]
        seed: u64,
        /// Minimum delay between geocoder calls, ms
        #[arg(long, default_value = "1000")]
        rate_limit_ms: u64,
    },
    /// Serve a previous run's output tables over HTTP
    Server {
        /// Directory holding the output tables
        #[arg(long, default_value = "data/out")]
        data_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = shelter_map_cli_utils::init_logger();

    match Cli::parse().command {
        Commands::Pipeline {
            shelters,
            encampments,
            cache,
            out_dir,
            profile,
            k,
            seed,
            rate_limit_ms,
        } => {
            let profile = profile
                .parse()
                .map_err(|_| format!("Unknown profile: {profile}"))?;

            let args = pipeline::PipelineArgs {
                shelters,
                encampments,
                cache,
                out_dir,
                profile,
                k,
                seed,
                rate_limit_ms,
            };
            pipeline::run(&args, &multi).await?;
        }
        Commands::Server { data_dir } => {
            // The server uses actix-web's runtime, so run it in a blocking
            // task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(shelter_map_server::run_server(data_dir))
            })
            .await??;
        }
    }

    Ok(())
}
