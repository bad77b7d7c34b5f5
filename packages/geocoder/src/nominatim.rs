//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance enforces a strict rate limit (1 request per
//! second); the caller is responsible for pacing via the resolver's
//! configured delay.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use crate::{GeocodeError, GeocodedAddress};

/// Geocodes a free-form query using the Nominatim search endpoint.
///
/// Returns `Ok(None)` when Nominatim has no match for the query.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails,
/// or [`GeocodeError::RateLimited`] on a 429 response.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let resp = client
        .get(base_url)
        .query(&[("q", query), ("format", "jsonv2"), ("limit", "1")])
        .send()
        .await?;

    if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }

    let body: serde_json::Value = resp.json().await?;
    parse_response(&body)
}

/// Parses a Nominatim JSON response body.
fn parse_response(body: &serde_json::Value) -> Result<Option<GeocodedAddress>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    let display_name = first["display_name"].as_str().map(String::from);

    Ok(Some(GeocodedAddress {
        latitude: lat,
        longitude: lon,
        matched_address: display_name,
    }))
}
