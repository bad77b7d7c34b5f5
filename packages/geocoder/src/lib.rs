#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Address resolution for the shelter map.
//!
//! Converts shelter street addresses to latitude/longitude coordinates
//! via Nominatim / OpenStreetMap, fronted by a persistent CSV-backed
//! cache ([`cache::GeocodeCache`]) so that only never-tried addresses hit
//! the network. Lookups are serial and paced by a minimum enforced delay
//! (the public Nominatim instance allows 1 request per second).
//!
//! A failed lookup is never a pipeline error: the address resolves to
//! "unresolved" and the caller drops that shelter from the geocoded set.

pub mod address;
pub mod cache;
pub mod nominatim;

use std::time::Duration;

use cache::{CacheLookup, GeocodeCache};
use thiserror::Error;

/// Default Nominatim endpoint (public OpenStreetMap instance).
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Default suffix appended to every query to anchor it to the city.
pub const DEFAULT_QUERY_SUFFIX: &str = ", Toronto, ON, Canada";

/// Default minimum delay between network lookups, ms.
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// Extra wait after Nominatim reports a rate-limit violation.
const RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

/// A geocoding result with coordinates and metadata.
#[derive(Debug, Clone)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The matched/canonical address returned by the geocoder.
    pub matched_address: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Cache file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache file CSV structure was unreadable.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Serial, cache-fronted, rate-limited address resolver.
pub struct Resolver {
    client: reqwest::Client,
    base_url: String,
    query_suffix: String,
    rate_limit: Duration,
}

impl Resolver {
    /// Creates a resolver against the given Nominatim endpoint.
    ///
    /// `query_suffix` is appended verbatim to every address before lookup
    /// (e.g. `", Toronto, ON, Canada"`); `rate_limit_ms` is the minimum
    /// delay enforced before each network call. Cache hits don't sleep.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        query_suffix: impl Into<String>,
        rate_limit_ms: u64,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .user_agent("shelter-map/0.1")
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            query_suffix: query_suffix.into(),
            rate_limit: Duration::from_millis(rate_limit_ms),
        })
    }

    /// Resolves one address: screening, then cache, then network.
    ///
    /// Returns `None` for unresolvable addresses of any kind -- screened
    /// out, known miss, no match, or transport error. No-match results are
    /// written to the cache; transport errors are not, so a rerun can
    /// retry them.
    pub async fn resolve(&self, cache: &mut GeocodeCache, addr: &str) -> Option<(f64, f64)> {
        if !address::is_geocodable(addr) {
            return None;
        }

        match cache.get(addr) {
            CacheLookup::Hit(lat, lon) => return Some((lat, lon)),
            CacheLookup::KnownMiss => return None,
            CacheLookup::Untried => {}
        }

        tokio::time::sleep(self.rate_limit).await;

        let query = format!("{addr}{}", self.query_suffix);
        match nominatim::geocode_freeform(&self.client, &self.base_url, &query).await {
            Ok(Some(geocoded)) => {
                cache.insert_hit(addr, geocoded.latitude, geocoded.longitude);
                Some((geocoded.latitude, geocoded.longitude))
            }
            Ok(None) => {
                log::debug!("Nominatim: no match for '{addr}'");
                cache.insert_miss(addr);
                None
            }
            Err(e) => {
                log::warn!("Nominatim error for '{addr}': {e}");
                if matches!(e, GeocodeError::RateLimited) {
                    log::warn!("Rate limited by Nominatim, waiting 60s...");
                    tokio::time::sleep(RATE_LIMIT_BACKOFF).await;
                }
                None
            }
        }
    }
}
