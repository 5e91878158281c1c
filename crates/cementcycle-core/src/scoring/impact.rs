use crate::config::catalog::MaterialCatalog;
use serde::{Deserialize, Serialize};

const TREES_PER_TON_CO2: f64 = 1.2;
const CEMENT_OFFSET_PER_TON: f64 = 0.85;
const WATER_SAVED_PER_TON: f64 = 2.5;
const ENERGY_PER_TON_CO2: f64 = 2.1;
const AIR_QUALITY_PER_TON: f64 = 0.3;

/// Environmental effect of diverting `quantity` tonnes of a material into cement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Co2Impact {
    pub material: String,
    pub display_name: String,
    pub mechanism: String,
    pub quantity: f64,
    pub co2_per_ton: f64,
    pub co2_saved: f64,
    pub trees_equivalent: u64,
    pub carbon_credits: u64,
    pub cement_offset: f64,
    pub water_saved: f64,
    pub energy_offset: f64,
    pub air_quality_improvement: f64,
}

pub fn calculate(catalog: &MaterialCatalog, material: &str, quantity: f64) -> Co2Impact {
    let quantity = if quantity.is_finite() { quantity.max(0.0) } else { 0.0 };
    let profile = catalog.material(material);
    let display_name = match catalog.known_material(material) {
        Some(known) => known.display_name.clone(),
        None => material.trim().to_string(),
    };
    let co2_saved = quantity * profile.co2_per_ton;

    Co2Impact {
        material: material.trim().to_string(),
        display_name,
        mechanism: profile.mechanism.clone(),
        quantity,
        co2_per_ton: profile.co2_per_ton,
        co2_saved,
        trees_equivalent: (co2_saved * TREES_PER_TON_CO2).round() as u64,
        carbon_credits: (co2_saved * catalog.pricing.carbon_credit_price_per_ton).round() as u64,
        cement_offset: quantity * CEMENT_OFFSET_PER_TON,
        water_saved: quantity * WATER_SAVED_PER_TON,
        energy_offset: co2_saved * ENERGY_PER_TON_CO2,
        air_quality_improvement: quantity * AIR_QUALITY_PER_TON,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fly_ash_fixture() {
        let catalog = MaterialCatalog::default();
        let impact = calculate(&catalog, "fly_ash", 500.0);

        assert_eq!(impact.co2_saved, 400.0);
        assert_eq!(impact.trees_equivalent, 480);
        assert_eq!(impact.carbon_credits, 480_000);
        assert_eq!(impact.display_name, "Fly Ash");
        assert!((impact.cement_offset - 425.0).abs() < 1e-9);
        assert!((impact.water_saved - 1250.0).abs() < 1e-9);
        assert!((impact.energy_offset - 840.0).abs() < 1e-9);
        assert!((impact.air_quality_improvement - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_in_quantity() {
        let catalog = MaterialCatalog::default();
        for material in ["fly_ash", "steel_slag", "silica_fume", "bottom_ash", "glass_cullet"] {
            for quantity in [1.0, 37.5, 250.0, 999.0] {
                let single = calculate(&catalog, material, quantity).co2_saved;
                let double = calculate(&catalog, material, quantity * 2.0).co2_saved;
                assert_eq!(double, single * 2.0, "{material} @ {quantity}");
            }
        }
    }

    #[test]
    fn test_unknown_material_uses_fallback() {
        let catalog = MaterialCatalog::default();
        let impact = calculate(&catalog, "Glass Cullet", 100.0);
        assert_eq!(impact.co2_per_ton, 0.5);
        assert_eq!(impact.co2_saved, 50.0);
        assert_eq!(impact.display_name, "Glass Cullet");
        assert_eq!(impact.mechanism, catalog.fallback.mechanism);
    }

    #[test]
    fn test_negative_quantity_is_zero() {
        let catalog = MaterialCatalog::default();
        let impact = calculate(&catalog, "fly_ash", -10.0);
        assert_eq!(impact.co2_saved, 0.0);
        assert_eq!(impact.carbon_credits, 0);
    }

    #[test]
    fn test_serializes_camel_case() {
        let catalog = MaterialCatalog::default();
        let json = serde_json::to_value(calculate(&catalog, "fly_ash", 10.0)).unwrap();
        assert!(json.get("co2Saved").is_some());
        assert!(json.get("treesEquivalent").is_some());
        assert!(json.get("airQualityImprovement").is_some());
    }
}
