use crate::config::catalog::{City, MaterialCatalog};
use crate::error::ScoringError;

const EARTH_RADIUS_KM: f64 = 6371.0;

pub fn haversine_km(from: &City, to: &City) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Resolve a served city by name
pub fn locate<'a>(catalog: &'a MaterialCatalog, name: &str) -> Result<&'a City, ScoringError> {
    catalog
        .city(name)
        .ok_or_else(|| ScoringError::UnknownLocation {
            name: name.trim().to_string(),
            known: catalog.city_names().join(", "),
        })
}

pub fn distance_km(catalog: &MaterialCatalog, from: &str, to: &str) -> Result<f64, ScoringError> {
    let from = locate(catalog, from)?;
    let to = locate(catalog, to)?;
    Ok(haversine_km(from, to))
}

fn volume_discount(quantity: f64) -> f64 {
    if quantity >= 500.0 {
        0.8
    } else if quantity >= 200.0 {
        0.9
    } else {
        1.0
    }
}

pub fn logistics_cost(catalog: &MaterialCatalog, distance_km: f64, quantity: f64) -> u64 {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return 0;
    }
    let cost = distance_km * catalog.pricing.logistics_rate_per_km * volume_discount(quantity);
    cost.round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mumbai_chennai_fixture() {
        let catalog = MaterialCatalog::default();
        let d = distance_km(&catalog, "mumbai", "chennai").unwrap();
        assert!((d - 1033.10).abs() < 0.01, "got {d}");
    }

    #[test]
    fn test_other_pairs() {
        let catalog = MaterialCatalog::default();
        let pune = distance_km(&catalog, "Mumbai", " PUNE ").unwrap();
        assert!((pune - 120.15).abs() < 0.01, "got {pune}");
        let kolkata = distance_km(&catalog, "delhi", "kolkata").unwrap();
        assert!((kolkata - 1317.75).abs() < 0.01, "got {kolkata}");
    }

    #[test]
    fn test_symmetric_and_zero_on_self() {
        let catalog = MaterialCatalog::default();
        let ab = distance_km(&catalog, "Bangalore", "Delhi").unwrap();
        let ba = distance_km(&catalog, "Delhi", "Bangalore").unwrap();
        assert!((ab - ba).abs() < 1e-9);
        assert_eq!(distance_km(&catalog, "Pune", "pune").unwrap(), 0.0);
    }

    #[test]
    fn test_unknown_city_is_error() {
        let catalog = MaterialCatalog::default();
        let err = distance_km(&catalog, "Mumbai", "Atlantis").unwrap_err();
        match err {
            ScoringError::UnknownLocation { name, known } => {
                assert_eq!(name, "Atlantis");
                assert!(known.contains("Chennai"));
            }
        }
    }

    #[test]
    fn test_logistics_fixture() {
        let catalog = MaterialCatalog::default();
        let d = distance_km(&catalog, "mumbai", "chennai").unwrap();
        assert_eq!(logistics_cost(&catalog, d, 500.0), 37_192);
    }

    #[test]
    fn test_logistics_discounts() {
        let catalog = MaterialCatalog::default();
        assert_eq!(logistics_cost(&catalog, 100.0, 10.0), 4_500);
        assert_eq!(logistics_cost(&catalog, 100.0, 200.0), 4_050);
        assert_eq!(logistics_cost(&catalog, 100.0, 800.0), 3_600);
        assert_eq!(logistics_cost(&catalog, 0.0, 800.0), 0);
    }
}
