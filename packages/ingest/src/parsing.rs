//! Safe numeric parsing for ingestion boundaries.
//!
//! Source CSVs carry missing cells, stray whitespace, and non-numeric
//! garbage in numeric columns. Every coercion goes through this module so
//! each field's fallback is stated once instead of ad hoc per call site.

/// Parses an optional cell into a finite `f64`.
///
/// Empty, missing, non-numeric, NaN, and infinite values all collapse to
/// `None`.
#[must_use]
pub fn parse_f64_opt(raw: Option<&str>) -> Option<f64> {
    let value: f64 = raw?.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parses a demand weight cell.
///
/// Missing or non-numeric weights default to 1.0; negative weights clamp
/// to 0.0. The result is always finite and `>= 0`.
#[must_use]
pub fn parse_weight(raw: Option<&str>) -> f64 {
    parse_f64_opt(raw).map_or(1.0, |w| w.max(0.0))
}

/// Parses a lat/lon cell pair. Returns `None` if either is missing,
/// unparseable, or zero (a null-island placeholder, not a real location).
#[must_use]
pub fn parse_lat_lon(lat: Option<&str>, lon: Option<&str>) -> Option<(f64, f64)> {
    let latitude = parse_f64_opt(lat)?;
    let longitude = parse_f64_opt(lon)?;
    if latitude == 0.0 || longitude == 0.0 {
        return None;
    }
    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(parse_f64_opt(Some("12.5")), Some(12.5));
        assert_eq!(parse_f64_opt(Some("  40 ")), Some(40.0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_f64_opt(Some("n/a")), None);
        assert_eq!(parse_f64_opt(Some("")), None);
        assert_eq!(parse_f64_opt(None), None);
    }

    #[test]
    fn rejects_non_finite() {
        assert_eq!(parse_f64_opt(Some("NaN")), None);
        assert_eq!(parse_f64_opt(Some("inf")), None);
    }

    #[test]
    fn weight_defaults_to_one() {
        assert!((parse_weight(None) - 1.0).abs() < f64::EPSILON);
        assert!((parse_weight(Some("not-a-number")) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn weight_clamps_negative_to_zero() {
        assert!(parse_weight(Some("-3.5")).abs() < f64::EPSILON);
    }

    #[test]
    fn weight_passes_through_valid() {
        assert!((parse_weight(Some("2.0")) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn lat_lon_requires_both() {
        assert_eq!(parse_lat_lon(Some("43.7"), None), None);
        assert_eq!(parse_lat_lon(None, Some("-79.4")), None);
        assert_eq!(parse_lat_lon(Some("43.7"), Some("-79.4")), Some((43.7, -79.4)));
    }

    #[test]
    fn lat_lon_rejects_null_island() {
        assert_eq!(parse_lat_lon(Some("0.0"), Some("-79.4")), None);
        assert_eq!(parse_lat_lon(Some("43.7"), Some("0")), None);
    }
}
