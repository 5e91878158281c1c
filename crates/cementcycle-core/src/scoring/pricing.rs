use super::positive;
use crate::config::catalog::{MaterialCatalog, QualityGrade};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantity band used for list pricing. Bands never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeTier {
    Bulk,
    Large,
    Standard,
    SmallLot,
}

impl VolumeTier {
    pub fn for_quantity(quantity: Option<f64>) -> Self {
        match positive(quantity) {
            Some(q) if q >= 1000.0 => Self::Bulk,
            Some(q) if q >= 500.0 => Self::Large,
            Some(q) if q < 100.0 => Self::SmallLot,
            _ => Self::Standard,
        }
    }

    /// Signed percent adjustment applied to the unit price
    pub fn percent(&self) -> f64 {
        match self {
            Self::Bulk => 12.0,
            Self::Large => 8.0,
            Self::Standard => 0.0,
            Self::SmallLot => -5.0,
        }
    }

    pub fn multiplier(&self) -> f64 {
        1.0 + self.percent() / 100.0
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bulk => "+12% bulk premium",
            Self::Large => "+8% volume premium",
            Self::Standard => "standard rate",
            Self::SmallLot => "-5% small lot adjustment",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::Large => "large",
            Self::Standard => "standard",
            Self::SmallLot => "small_lot",
        }
    }
}

impl fmt::Display for VolumeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceEstimate {
    pub material: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub quality_grade: QualityGrade,
    pub base_price: f64,
    pub trend_multiplier: f64,
    pub volatility: f64,
    pub quality_multiplier: f64,
    pub volume_tier: VolumeTier,
    pub volume_adjustment_label: String,
    pub location_premium_percent: f64,
    pub final_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    pub quality_bonus: f64,
    pub bulk_premium_percent: f64,
    pub express_premium: f64,
    pub carbon_credit_bonus_percent: f64,
}

/// Regional premium. Every city currently prices at par.
pub fn location_premium_percent(_catalog: &MaterialCatalog, _location: Option<&str>) -> f64 {
    0.0
}

pub fn estimate(
    catalog: &MaterialCatalog,
    material: &str,
    location: Option<&str>,
    quantity: Option<f64>,
    quality_grade: Option<&str>,
) -> PriceEstimate {
    let profile = catalog.material(material);
    let grade = QualityGrade::parse(quality_grade);
    let quality_multiplier = catalog.grade(grade).price_multiplier;
    let quantity = positive(quantity);
    let tier = VolumeTier::for_quantity(quantity);
    let location_premium = location_premium_percent(catalog, location);

    let final_price = profile.base_price
        * profile.trend
        * quality_multiplier
        * tier.multiplier()
        * (1.0 + location_premium / 100.0);

    PriceEstimate {
        material: material.trim().to_string(),
        location: location.map(|l| l.trim().to_string()),
        quality_grade: grade,
        base_price: profile.base_price,
        trend_multiplier: profile.trend,
        volatility: profile.volatility,
        quality_multiplier,
        volume_tier: tier,
        volume_adjustment_label: tier.label().to_string(),
        location_premium_percent: location_premium,
        final_price,
        total_value: quantity.map(|q| final_price * q),
        quality_bonus: (quality_multiplier - 1.0) * profile.base_price,
        bulk_premium_percent: tier.percent(),
        express_premium: catalog.pricing.express_premium_percent,
        carbon_credit_bonus_percent: catalog.pricing.carbon_credit_bonus_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(VolumeTier::for_quantity(Some(1500.0)), VolumeTier::Bulk);
        assert_eq!(VolumeTier::for_quantity(Some(1000.0)), VolumeTier::Bulk);
        assert_eq!(VolumeTier::for_quantity(Some(999.0)), VolumeTier::Large);
        assert_eq!(VolumeTier::for_quantity(Some(500.0)), VolumeTier::Large);
        assert_eq!(VolumeTier::for_quantity(Some(499.0)), VolumeTier::Standard);
        assert_eq!(VolumeTier::for_quantity(Some(100.0)), VolumeTier::Standard);
        assert_eq!(VolumeTier::for_quantity(Some(99.0)), VolumeTier::SmallLot);
        assert_eq!(VolumeTier::for_quantity(None), VolumeTier::Standard);
    }

    #[test]
    fn test_bulk_label_at_1500() {
        let catalog = MaterialCatalog::default();
        let price = estimate(&catalog, "fly_ash", Some("Mumbai"), Some(1500.0), None);
        assert_eq!(price.volume_tier, VolumeTier::Bulk);
        assert_eq!(price.volume_adjustment_label, "+12% bulk premium");
        assert_eq!(price.bulk_premium_percent, 12.0);
    }

    #[test]
    fn test_final_price_composition() {
        let catalog = MaterialCatalog::default();
        let price = estimate(&catalog, "fly_ash", None, Some(600.0), Some("grade_a"));
        let expected = 2800.0 * 1.05 * 1.10 * 1.08;
        assert!(close(price.final_price, expected));
        assert!(close(price.total_value.unwrap(), expected * 600.0));
        assert!(close(price.quality_bonus, 280.0));
        assert_eq!(price.location_premium_percent, 0.0);
    }

    #[test]
    fn test_no_quantity_has_no_total() {
        let catalog = MaterialCatalog::default();
        let price = estimate(&catalog, "silica_fume", Some("Pune"), None, Some("premium"));
        assert_eq!(price.volume_tier, VolumeTier::Standard);
        assert_eq!(price.volume_adjustment_label, "standard rate");
        assert!(price.total_value.is_none());
        assert!(close(price.final_price, 4500.0 * 1.08 * 1.15));
    }

    #[test]
    fn test_small_lot_discount() {
        let catalog = MaterialCatalog::default();
        let price = estimate(&catalog, "bottom_ash", None, Some(50.0), None);
        assert_eq!(price.bulk_premium_percent, -5.0);
        assert!(close(price.final_price, 1800.0 * 0.98 * 0.95));
    }

    #[test]
    fn test_policy_values_reported() {
        let catalog = MaterialCatalog::default();
        let price = estimate(&catalog, "unobtainium", None, None, None);
        assert_eq!(price.base_price, 2500.0);
        assert_eq!(price.express_premium, 15.0);
        assert_eq!(price.carbon_credit_bonus_percent, 5.0);
    }

    #[test]
    fn test_serialized_tier_name() {
        let catalog = MaterialCatalog::default();
        let json = serde_json::to_value(estimate(&catalog, "fly_ash", None, Some(20.0), None)).unwrap();
        assert_eq!(json["volumeTier"], "small_lot");
        assert!(json.get("totalValue").is_some());
    }
}
