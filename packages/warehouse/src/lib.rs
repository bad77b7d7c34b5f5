#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! `BigQuery` warehouse sink for the three output tables.
//!
//! Mirrors the pipeline's local CSV outputs to a `BigQuery` dataset over
//! the REST API: each upload truncates the destination table, then streams
//! the rows via `insertAll`. Write disposition therefore matches the
//! truncate-and-replace semantics the rest of the pipeline assumes.
//!
//! The sink is strictly optional. Construction fails when credentials are
//! absent from the environment, and the materializer logs that and moves
//! on -- a warehouse problem never aborts a pipeline run.
//!
//! # Environment Variables
//!
//! | Variable | Required | Description |
//! |---|---|---|
//! | `BIGQUERY_PROJECT_ID` | Yes | GCP project owning the dataset |
//! | `BIGQUERY_DATASET` | Yes | Dataset receiving the three tables |
//! | `BIGQUERY_ACCESS_TOKEN` | Yes | OAuth2 bearer token for the REST API |

use serde::Serialize;
use thiserror::Error;

/// `BigQuery` REST API root.
const API_BASE: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Errors from warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Missing required environment variable.
    #[error("Missing environment variable: {name}")]
    MissingEnv {
        /// Name of the missing environment variable.
        name: String,
    },

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Row serialization failure.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The API accepted the request but rejected the payload.
    #[error("Upload to {table} rejected: {message}")]
    Rejected {
        /// Fully-qualified table id.
        table: String,
        /// Error detail from the API response.
        message: String,
    },
}

/// Client for mirroring output tables to `BigQuery`.
#[derive(Debug)]
pub struct WarehouseClient {
    client: reqwest::Client,
    project_id: String,
    dataset: String,
    access_token: String,
}

impl WarehouseClient {
    /// Creates a warehouse client from environment variables.
    ///
    /// Reads `BIGQUERY_PROJECT_ID`, `BIGQUERY_DATASET`, and
    /// `BIGQUERY_ACCESS_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError::MissingEnv`] if any required variable is
    /// unset, or [`WarehouseError::Http`] if the HTTP client cannot be
    /// built.
    pub fn from_env() -> Result<Self, WarehouseError> {
        let project_id = require_env("BIGQUERY_PROJECT_ID")?;
        let dataset = require_env("BIGQUERY_DATASET")?;
        let access_token = require_env("BIGQUERY_ACCESS_TOKEN")?;

        let client = reqwest::Client::builder()
            .user_agent("shelter-map/0.1")
            .build()?;

        Ok(Self {
            client,
            project_id,
            dataset,
            access_token,
        })
    }

    /// Fully-qualified id of a table in the configured dataset.
    #[must_use]
    pub fn table_id(&self, table: &str) -> String {
        format!("{}.{}.{table}", self.project_id, self.dataset)
    }

    /// Replaces `table` with `rows`: truncate, then stream-insert.
    ///
    /// # Errors
    ///
    /// Returns [`WarehouseError`] if the truncate query or the insert is
    /// rejected, or on transport failure.
    pub async fn upload_table<T: Serialize>(
        &self,
        table: &str,
        rows: &[T],
    ) -> Result<(), WarehouseError> {
        let table_id = self.table_id(table);
        log::info!("Uploading {} rows to {table_id}...", rows.len());

        self.truncate(&table_id).await?;

        if rows.is_empty() {
            log::info!("  {table_id} truncated (no rows to insert)");
            return Ok(());
        }

        let json_rows = rows
            .iter()
            .map(|row| Ok(serde_json::json!({ "json": serde_json::to_value(row)? })))
            .collect::<Result<Vec<serde_json::Value>, serde_json::Error>>()?;

        let payload = serde_json::json!({
            "kind": "bigquery#tableDataInsertAllRequest",
            "rows": json_rows,
        });

        let url = format!(
            "{API_BASE}/projects/{}/datasets/{}/tables/{table}/insertAll",
            self.project_id, self.dataset
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        // insertAll reports per-row problems in a 200 body.
        let body: serde_json::Value = response.json().await?;
        if let Some(errors) = body.get("insertErrors").and_then(|e| e.as_array())
            && !errors.is_empty()
        {
            return Err(WarehouseError::Rejected {
                table: table_id,
                message: format!("{} rows rejected", errors.len()),
            });
        }

        log::info!("  uploaded {table_id}");
        Ok(())
    }

    /// Truncates the destination table via a query job.
    async fn truncate(&self, table_id: &str) -> Result<(), WarehouseError> {
        let url = format!("{API_BASE}/projects/{}/queries", self.project_id);
        let payload = serde_json::json!({
            "query": format!("TRUNCATE TABLE `{table_id}`"),
            "useLegacySql": false,
        });

        self.client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Reads a required environment variable.
fn require_env(name: &str) -> Result<String, WarehouseError> {
    std::env::var(name).map_err(|_| WarehouseError::MissingEnv {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_reports_variable_name() {
        // Ensure the variable is absent regardless of the outer environment.
        unsafe {
            std::env::remove_var("BIGQUERY_PROJECT_ID");
        }
        let err = WarehouseClient::from_env().unwrap_err();
        match err {
            WarehouseError::MissingEnv { name } => assert_eq!(name, "BIGQUERY_PROJECT_ID"),
            other => panic!("expected MissingEnv, got {other}"),
        }
    }
}
