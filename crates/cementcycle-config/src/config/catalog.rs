//! Material catalog
//!
//! Every coefficient table the scoring engine and the assistant prompt rely on
//! lives here, so both read the same numbers. The defaults can be overridden
//! from the `[catalog]` section of the config file.

use crate::types::PricePoint;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Per-material coefficients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MaterialProfile {
    /// Normalised lookup key (e.g. `fly_ash`)
    pub key: String,
    /// Human-readable name
    pub display_name: String,
    /// Tons of CO2 avoided per ton used in cement production
    pub co2_per_ton: f64,
    /// How the material avoids emissions
    pub mechanism: String,
    /// Reference market price in ₹ per ton
    pub base_price: f64,
    /// Current market trend multiplier applied to the base price
    pub trend: f64,
    /// Observed price volatility (fraction of base price)
    pub volatility: f64,
}

impl MaterialProfile {
    fn new(
        key: &str,
        display_name: &str,
        co2_per_ton: f64,
        mechanism: &str,
        base_price: f64,
        trend: f64,
        volatility: f64,
    ) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            co2_per_ton,
            mechanism: mechanism.to_string(),
            base_price,
            trend,
            volatility,
        }
    }
}

/// Quality grade of an offered material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityGrade {
    Unknown,
    Standard,
    #[serde(rename = "grade_1")]
    Grade1,
    GradeA,
    Premium,
}

impl QualityGrade {
    /// Parse a grade label. Unrecognised or missing labels map to `Unknown`.
    pub fn parse(label: Option<&str>) -> Self {
        match label.map(normalize_key).as_deref() {
            Some("premium") => Self::Premium,
            Some("grade_a") => Self::GradeA,
            Some("grade_1") => Self::Grade1,
            Some("standard") => Self::Standard,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premium => "premium",
            Self::GradeA => "grade_a",
            Self::Grade1 => "grade_1",
            Self::Standard => "standard",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bonus and multiplier attached to a quality grade
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GradeProfile {
    /// Points added to a compatibility score
    pub compatibility_bonus: u32,
    /// Multiplier applied to prices and revenue estimates
    pub price_multiplier: f64,
}

/// Grade table keyed by [`QualityGrade`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeTable {
    pub premium: GradeProfile,
    pub grade_a: GradeProfile,
    pub grade_1: GradeProfile,
    pub standard: GradeProfile,
    pub unknown: GradeProfile,
}

impl Default for GradeTable {
    fn default() -> Self {
        Self {
            premium: GradeProfile {
                compatibility_bonus: 15,
                price_multiplier: 1.15,
            },
            grade_a: GradeProfile {
                compatibility_bonus: 12,
                price_multiplier: 1.10,
            },
            grade_1: GradeProfile {
                compatibility_bonus: 12,
                price_multiplier: 1.10,
            },
            standard: GradeProfile {
                compatibility_bonus: 8,
                price_multiplier: 1.0,
            },
            unknown: GradeProfile {
                compatibility_bonus: 5,
                price_multiplier: 1.0,
            },
        }
    }
}

/// A city with known coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct City {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    fn new(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.to_string(),
            latitude,
            longitude,
        }
    }
}

/// Commercial constants shared by pricing, logistics and the assistant prompt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PricingPolicy {
    /// Transport cost in ₹ per km per shipment
    pub logistics_rate_per_km: f64,
    /// Surcharge for express delivery, in percent
    pub express_premium_percent: f64,
    /// Bonus for carbon-credit certified supply, in percent
    pub carbon_credit_bonus_percent: f64,
    /// Value of one ton of avoided CO2 in ₹
    pub carbon_credit_price_per_ton: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            logistics_rate_per_km: 45.0,
            express_premium_percent: 15.0,
            carbon_credit_bonus_percent: 5.0,
            carbon_credit_price_per_ton: 1200.0,
        }
    }
}

/// Shared coefficient tables for scoring and prompting
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaterialCatalog {
    pub materials: Vec<MaterialProfile>,
    /// Used for any material not listed in `materials`
    pub fallback: MaterialProfile,
    pub grades: GradeTable,
    pub cities: Vec<City>,
    pub pricing: PricingPolicy,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self {
            materials: vec![
                MaterialProfile::new(
                    "fly_ash",
                    "Fly Ash",
                    0.8,
                    "Replaces clinker in blended (PPC) cement, avoiding limestone calcination",
                    2800.0,
                    1.05,
                    0.08,
                ),
                MaterialProfile::new(
                    "steel_slag",
                    "Steel Slag",
                    0.7,
                    "Substitutes clinker in slag (PSC) cement and lowers kiln fuel demand",
                    2200.0,
                    1.02,
                    0.10,
                ),
                MaterialProfile::new(
                    "silica_fume",
                    "Silica Fume",
                    1.2,
                    "Raises concrete strength so mixes need less cement per cubic metre",
                    4500.0,
                    1.08,
                    0.12,
                ),
                MaterialProfile::new(
                    "bottom_ash",
                    "Bottom Ash",
                    0.6,
                    "Replaces natural aggregate and raw-meal feedstock",
                    1800.0,
                    0.98,
                    0.06,
                ),
            ],
            fallback: MaterialProfile::new(
                "other",
                "Other Material",
                0.5,
                "General supplementary-material substitution",
                2500.0,
                1.0,
                0.10,
            ),
            grades: GradeTable::default(),
            cities: vec![
                City::new("Mumbai", 19.0760, 72.8777),
                City::new("Chennai", 13.0827, 80.2707),
                City::new("Bangalore", 12.9716, 77.5946),
                City::new("Pune", 18.5204, 73.8567),
                City::new("Delhi", 28.7041, 77.1025),
                City::new("Kolkata", 22.5726, 88.3639),
            ],
            pricing: PricingPolicy::default(),
        }
    }
}

impl MaterialCatalog {
    /// Look up a material, falling back to the default profile
    pub fn material(&self, key: &str) -> &MaterialProfile {
        self.known_material(key).unwrap_or(&self.fallback)
    }

    /// Look up a material only if it is listed
    pub fn known_material(&self, key: &str) -> Option<&MaterialProfile> {
        let key = normalize_key(key);
        self.materials.iter().find(|m| normalize_key(&m.key) == key)
    }

    pub fn grade(&self, grade: QualityGrade) -> &GradeProfile {
        match grade {
            QualityGrade::Premium => &self.grades.premium,
            QualityGrade::GradeA => &self.grades.grade_a,
            QualityGrade::Grade1 => &self.grades.grade_1,
            QualityGrade::Standard => &self.grades.standard,
            QualityGrade::Unknown => &self.grades.unknown,
        }
    }

    /// Case-insensitive city lookup
    pub fn city(&self, name: &str) -> Option<&City> {
        let name = name.trim();
        self.cities
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn city_names(&self) -> Vec<&str> {
        self.cities.iter().map(|c| c.name.as_str()).collect()
    }

    /// Derive each listed material's trend from its latest observed price.
    /// Returns how many materials were updated.
    pub fn apply_observed_prices(&mut self, latest: &[PricePoint]) -> usize {
        let mut updated = 0;
        for profile in &mut self.materials {
            let key = normalize_key(&profile.key);
            let observed = latest
                .iter()
                .find(|p| normalize_key(&p.material) == key)
                .map(|p| p.price_per_ton)
                .filter(|price| price.is_finite() && *price > 0.0);
            if let Some(price) = observed.filter(|_| profile.base_price > 0.0) {
                profile.trend = price / profile.base_price;
                updated += 1;
            }
        }
        updated
    }
}

impl MaterialCatalog {
    /// Reject tables the engine cannot score with
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for m in self.materials.iter().chain(std::iter::once(&self.fallback)) {
            check_non_negative(&m.key, "co2_per_ton", m.co2_per_ton)?;
            check_non_negative(&m.key, "base_price", m.base_price)?;
            check_non_negative(&m.key, "volatility", m.volatility)?;
            if !m.trend.is_finite() || m.trend <= 0.0 {
                bail!("Material '{}' has invalid trend {}", m.key, m.trend);
            }
        }
        for m in &self.materials {
            if !seen.insert(normalize_key(&m.key)) {
                bail!("Material '{}' is listed more than once", m.key);
            }
        }

        let grades = &self.grades;
        for (name, grade) in [
            ("premium", &grades.premium),
            ("grade_a", &grades.grade_a),
            ("grade_1", &grades.grade_1),
            ("standard", &grades.standard),
            ("unknown", &grades.unknown),
        ] {
            check_non_negative(name, "price_multiplier", grade.price_multiplier)?;
        }

        let pricing = &self.pricing;
        check_non_negative("pricing", "logistics_rate_per_km", pricing.logistics_rate_per_km)?;
        check_non_negative(
            "pricing",
            "carbon_credit_price_per_ton",
            pricing.carbon_credit_price_per_ton,
        )?;

        if self.cities.is_empty() {
            bail!("Catalog must define at least one city");
        }
        for city in &self.cities {
            if !(-90.0..=90.0).contains(&city.latitude) || !(-180.0..=180.0).contains(&city.longitude) {
                bail!("City '{}' has out-of-range coordinates", city.name);
            }
        }
        Ok(())
    }
}

fn check_non_negative(owner: &str, field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        bail!("{} of '{}' must be a finite non-negative number, got {}", field, owner, value);
    }
    Ok(())
}

/// Normalise a material or grade label: lowercase, spaces and hyphens to `_`
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_lookup_is_case_insensitive() {
        let catalog = MaterialCatalog::default();
        assert_eq!(catalog.material("Fly Ash").key, "fly_ash");
        assert_eq!(catalog.material("SILICA-FUME").co2_per_ton, 1.2);
    }

    #[test]
    fn test_unknown_material_uses_fallback() {
        let catalog = MaterialCatalog::default();
        assert!(catalog.known_material("rice_husk").is_none());
        assert_eq!(catalog.material("rice_husk").co2_per_ton, 0.5);
        assert_eq!(catalog.material("rice_husk").base_price, 2500.0);
    }

    #[test]
    fn test_grade_parsing() {
        assert_eq!(QualityGrade::parse(Some("Premium")), QualityGrade::Premium);
        assert_eq!(QualityGrade::parse(Some("grade_a")), QualityGrade::GradeA);
        assert_eq!(QualityGrade::parse(Some("Grade 1")), QualityGrade::Grade1);
        assert_eq!(QualityGrade::parse(Some("standard")), QualityGrade::Standard);
        assert_eq!(QualityGrade::parse(Some("b-minus")), QualityGrade::Unknown);
        assert_eq!(QualityGrade::parse(None), QualityGrade::Unknown);
    }

    #[test]
    fn test_grade_table_ordering() {
        let catalog = MaterialCatalog::default();
        let ranked = [
            QualityGrade::Unknown,
            QualityGrade::Standard,
            QualityGrade::Grade1,
            QualityGrade::GradeA,
            QualityGrade::Premium,
        ];
        for pair in ranked.windows(2) {
            assert!(
                catalog.grade(pair[0]).compatibility_bonus
                    <= catalog.grade(pair[1]).compatibility_bonus
            );
        }
    }

    #[test]
    fn test_city_lookup() {
        let catalog = MaterialCatalog::default();
        assert_eq!(catalog.city(" mumbai ").map(|c| c.name.as_str()), Some("Mumbai"));
        assert!(catalog.city("Atlantis").is_none());
        assert_eq!(catalog.city_names().len(), 6);
    }

    #[test]
    fn test_override_with_display_style_key() {
        let catalog: MaterialCatalog = toml::from_str(
            r#"
            [[materials]]
            key = "Fly Ash"
            display_name = "Fly Ash"
            co2_per_ton = 0.9
            mechanism = "Clinker replacement"
            base_price = 2900.0
            trend = 1.0
            volatility = 0.05
            "#,
        )
        .unwrap();

        assert!(catalog.validate().is_ok());
        assert_eq!(catalog.material("fly_ash").co2_per_ton, 0.9);
        assert_eq!(catalog.material("FLY-ASH").base_price, 2900.0);
        assert!(catalog.known_material("steel_slag").is_none());
    }

    #[test]
    fn test_validate_rejects_bad_coefficients() {
        let mut catalog = MaterialCatalog::default();
        catalog.materials[1].co2_per_ton = -0.7;
        assert!(catalog.validate().is_err());

        let mut catalog = MaterialCatalog::default();
        catalog.fallback.base_price = f64::NAN;
        assert!(catalog.validate().is_err());

        let mut catalog = MaterialCatalog::default();
        catalog.materials[0].trend = 0.0;
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_keys() {
        let mut catalog = MaterialCatalog::default();
        catalog.materials[1].key = "Fly-Ash".to_string();
        let err = catalog.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_apply_observed_prices() {
        use crate::types::MarketCondition;
        let observed = |material: &str, price: f64| PricePoint {
            id: format!("p-{material}"),
            material: material.to_string(),
            price_per_ton: price,
            region: "national_average".to_string(),
            quality_grade: "standard".to_string(),
            market_conditions: MarketCondition::Stable,
            timestamp: chrono::Utc::now(),
        };

        let mut catalog = MaterialCatalog::default();
        let updated = catalog.apply_observed_prices(&[
            observed("fly_ash", 3080.0),
            observed("steel_slag", 0.0),
            observed("glass_cullet", 900.0),
        ]);

        assert_eq!(updated, 1);
        assert!((catalog.material("fly_ash").trend - 1.10).abs() < 1e-9);
        assert_eq!(catalog.material("steel_slag").trend, 1.02);
    }

    #[test]
    fn test_partial_toml_override_keeps_defaults() {
        let catalog: MaterialCatalog = toml::from_str(
            r#"
            [pricing]
            logistics_rate_per_km = 50.0
            "#,
        )
        .unwrap();

        assert_eq!(catalog.pricing.logistics_rate_per_km, 50.0);
        assert_eq!(catalog.pricing.express_premium_percent, 15.0);
        assert_eq!(catalog.materials.len(), 4);
    }
}
