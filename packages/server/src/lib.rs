#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web read-only API server for the shelter map.
//!
//! Serves the three pipeline output tables to the mapping frontend:
//! shelters, demand points, and cluster summaries (the last augmented
//! with a circular boundary polygon per cluster). The server holds no
//! state beyond the output directory path -- every request re-reads the
//! CSVs, so a fresh pipeline run is visible immediately and concurrent
//! reads are safe.
//!
//! CORS is permissive: the API is a dev-facing read-only surface for the
//! map frontend, as in the original deployment.

mod handlers;

use std::path::PathBuf;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};

/// Shared application state.
pub struct AppState {
    /// Directory holding the pipeline's output CSVs.
    pub data_dir: PathBuf,
}

/// Starts the shelter map API server.
///
/// Binds to `BIND_ADDR`/`PORT` (default `127.0.0.1:8080`) and serves the
/// output tables found in `data_dir`. This is a regular async function --
/// the caller provides the runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an error if the HTTP server fails to bind or encounters a
/// runtime error.
pub async fn run_server(data_dir: PathBuf) -> std::io::Result<()> {
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!(
        "Starting server on {bind_addr}:{port}, serving tables from {}",
        data_dir.display()
    );

    let state = web::Data::new(AppState { data_dir });

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .route("/", web::get().to(handlers::index))
            .route("/health", web::get().to(handlers::health))
            .route("/shelters", web::get().to(handlers::shelters))
            .route("/homeless", web::get().to(handlers::homeless))
            .route("/clusters", web::get().to(handlers::clusters))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
