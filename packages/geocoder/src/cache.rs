//! Persistent geocode cache.
//!
//! An explicit key-value store keyed by the exact address string (case-
//! and whitespace-sensitive as provided). Both successful lookups and
//! confirmed no-match misses are stored so reruns never re-query the same
//! address; misses persist with empty coordinate cells.
//!
//! The backing file is `(address, lat, lon)` CSV rows: loaded once at
//! pipeline start, rewritten wholesale at pipeline end. Concurrent runs
//! against one cache file are unsafe and must be serialized externally.

use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

use crate::GeocodeError;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheLookup {
    /// The address resolved to these coordinates on a previous run.
    Hit(f64, f64),
    /// The address was tried before and did not resolve.
    KnownMiss,
    /// The address has never been tried.
    Untried,
}

/// In-memory geocode cache with CSV persistence.
#[derive(Debug, Default)]
pub struct GeocodeCache {
    entries: BTreeMap<String, Option<(f64, f64)>>,
}

impl GeocodeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the cache from `path`. A missing file yields an empty cache
    /// (first run); an unreadable or malformed file is an error.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the file exists but cannot be read or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self, GeocodeError> {
        match File::open(path) {
            Ok(file) => {
                let cache = Self::from_reader(file)?;
                log::info!(
                    "Loaded {} cached geocode entries from {}",
                    cache.len(),
                    path.display()
                );
                Ok(cache)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No geocode cache at {} (first run?)", path.display());
                Ok(Self::new())
            }
            Err(e) => Err(GeocodeError::Io(e)),
        }
    }

    /// Parses cache entries from any reader.
    ///
    /// Rows whose coordinate cells are empty or unparseable load as known
    /// misses.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the CSV structure is unreadable.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, GeocodeError> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let mut entries = BTreeMap::new();

        for row in csv_reader.records() {
            let row = row?;
            let Some(address) = row.get(0) else {
                continue;
            };
            if address.is_empty() {
                continue;
            }

            let lat = row.get(1).and_then(|v| v.parse::<f64>().ok());
            let lon = row.get(2).and_then(|v| v.parse::<f64>().ok());

            let coords = match (lat, lon) {
                (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
                _ => None,
            };

            entries.insert(address.to_string(), coords);
        }

        Ok(Self { entries })
    }

    /// Looks up an address by exact string.
    #[must_use]
    pub fn get(&self, address: &str) -> CacheLookup {
        match self.entries.get(address) {
            Some(Some((lat, lon))) => CacheLookup::Hit(*lat, *lon),
            Some(None) => CacheLookup::KnownMiss,
            None => CacheLookup::Untried,
        }
    }

    /// Records a successful resolution.
    pub fn insert_hit(&mut self, address: &str, lat: f64, lon: f64) {
        self.entries.insert(address.to_string(), Some((lat, lon)));
    }

    /// Records a confirmed no-match so reruns skip the lookup.
    pub fn insert_miss(&mut self, address: &str) {
        self.entries.insert(address.to_string(), None);
    }

    /// Number of cached addresses (hits and misses).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites the whole cache to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the file cannot be created or written.
    pub fn persist(&self, path: &Path) -> Result<(), GeocodeError> {
        self.write_to(File::create(path)?)?;
        log::info!(
            "Wrote {} geocode cache entries to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    /// Writes all cache entries to any writer.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if a row fails to serialize.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), GeocodeError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(["address", "lat", "lon"])?;

        for (address, coords) in &self.entries {
            match coords {
                Some((lat, lon)) => {
                    csv_writer.write_record([
                        address.as_str(),
                        &lat.to_string(),
                        &lon.to_string(),
                    ])?;
                }
                None => csv_writer.write_record([address.as_str(), "", ""])?,
            }
        }

        csv_writer.flush().map_err(GeocodeError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_hits_and_misses() {
        let mut cache = GeocodeCache::new();
        cache.insert_hit("339 George St", 43.6596, -79.3712);
        cache.insert_miss("nowhere at all");

        let mut buffer = Vec::new();
        cache.write_to(&mut buffer).unwrap();

        let reloaded = GeocodeCache::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get("339 George St"),
            CacheLookup::Hit(43.6596, -79.3712)
        );
        assert_eq!(reloaded.get("nowhere at all"), CacheLookup::KnownMiss);
        assert_eq!(reloaded.get("129 Peter St"), CacheLookup::Untried);
    }

    #[test]
    fn keys_are_exact_strings() {
        let mut cache = GeocodeCache::new();
        cache.insert_hit("339 George St", 43.6596, -79.3712);
        assert_eq!(cache.get("339 george st"), CacheLookup::Untried);
        assert_eq!(cache.get(" 339 George St"), CacheLookup::Untried);
    }

    #[test]
    fn malformed_coordinates_load_as_misses() {
        let csv = "address,lat,lon\n339 George St,not-a-lat,-79.37\n";
        let cache = GeocodeCache::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(cache.get("339 George St"), CacheLookup::KnownMiss);
    }

    #[test]
    fn empty_input_yields_empty_cache() {
        let cache = GeocodeCache::from_reader("address,lat,lon\n".as_bytes()).unwrap();
        assert!(cache.is_empty());
    }
}
