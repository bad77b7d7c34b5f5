//! Demand Point Builder: assembles the unclustered demand table.
//!
//! Encampments always contribute. Under
//! [`PipelineProfile::ShelterWeighted`] geocoded shelters are folded in as
//! demand points too, weighted by occupancy pressure in [0, 1]; a shelter
//! with unknown occupancy contributes at weight 0 but still participates
//! in clustering (its replication count floors at 1).

use shelter_map_models::{DemandPoint, DemandSource, GeocodedShelter, PipelineProfile};

/// Builds the full demand table for clustering.
#[must_use]
pub fn build_demand(
    encampments: Vec<DemandPoint>,
    shelters: &[GeocodedShelter],
    profile: PipelineProfile,
) -> Vec<DemandPoint> {
    let mut demand = encampments;

    if profile.includes_shelter_demand() {
        demand.extend(shelters.iter().map(|shelter| DemandPoint {
            name: shelter.name.clone(),
            lat: shelter.lat,
            lon: shelter.lon,
            weight: shelter_pressure(shelter.occ_rate),
            source: DemandSource::Shelter,
        }));
    }

    log::info!("Demand table: {} points", demand.len());
    demand
}

/// Occupancy pressure for a shelter-as-demand-point:
/// `clip(occ_rate / 100, 0, 1)`, 0 when occupancy is unknown.
fn shelter_pressure(occ_rate: Option<f64>) -> f64 {
    occ_rate.map_or(0.0, |rate| (rate / 100.0).clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encampment(name: &str, weight: f64) -> DemandPoint {
        DemandPoint {
            name: name.to_string(),
            lat: 43.65,
            lon: -79.38,
            weight,
            source: DemandSource::Encampment,
        }
    }

    fn shelter(name: &str, occ_rate: Option<f64>) -> GeocodedShelter {
        GeocodedShelter {
            name: name.to_string(),
            address: format!("{name} address"),
            lat: 43.70,
            lon: -79.40,
            avg_capacity_beds: Some(40.0),
            avg_occupied_beds: Some(30.0),
            occ_rate,
        }
    }

    #[test]
    fn profile_a_ignores_shelters() {
        let demand = build_demand(
            vec![encampment("Moss Park", 2.0)],
            &[shelter("Seaton House", Some(95.0))],
            PipelineProfile::EncampmentsOnly,
        );
        assert_eq!(demand.len(), 1);
        assert_eq!(demand[0].source, DemandSource::Encampment);
    }

    #[test]
    fn profile_b_folds_in_shelters() {
        let demand = build_demand(
            vec![encampment("Moss Park", 2.0)],
            &[shelter("Seaton House", Some(95.0))],
            PipelineProfile::ShelterWeighted,
        );
        assert_eq!(demand.len(), 2);

        let s = demand
            .iter()
            .find(|p| p.source == DemandSource::Shelter)
            .unwrap();
        assert!((s.weight - 0.95).abs() < 1e-9);
    }

    #[test]
    fn unknown_occupancy_contributes_zero_weight() {
        let demand = build_demand(
            Vec::new(),
            &[shelter("Unknown", None)],
            PipelineProfile::ShelterWeighted,
        );
        assert_eq!(demand.len(), 1);
        assert!(demand[0].weight.abs() < f64::EPSILON);
    }

    #[test]
    fn pressure_clips_to_unit_interval() {
        let demand = build_demand(
            Vec::new(),
            &[shelter("Over", Some(140.0))],
            PipelineProfile::ShelterWeighted,
        );
        assert!((demand[0].weight - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_weights_finite_and_non_negative() {
        let demand = build_demand(
            vec![encampment("A", 0.0), encampment("B", 3.5)],
            &[shelter("S", Some(50.0)), shelter("T", None)],
            PipelineProfile::ShelterWeighted,
        );
        for point in &demand {
            assert!(point.weight.is_finite() && point.weight >= 0.0);
        }
    }
}
