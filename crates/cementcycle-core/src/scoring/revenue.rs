use super::positive;
use crate::config::catalog::{MaterialCatalog, QualityGrade};

/// Volume multiplier for sale revenue. Unlike list pricing there is no small-lot tier.
pub fn volume_multiplier(quantity: f64) -> f64 {
    if quantity >= 1000.0 {
        1.12
    } else if quantity >= 500.0 {
        1.08
    } else {
        1.0
    }
}

pub fn estimate(
    catalog: &MaterialCatalog,
    quantity: Option<f64>,
    price_per_ton: Option<f64>,
    quality_grade: Option<&str>,
) -> u64 {
    let (Some(quantity), Some(price)) = (positive(quantity), positive(price_per_ton)) else {
        return 0;
    };

    let quality = catalog
        .grade(QualityGrade::parse(quality_grade))
        .price_multiplier;
    let value = quantity * price * quality * volume_multiplier(quantity);
    value.round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_bulk_revenue() {
        let catalog = MaterialCatalog::default();
        assert_eq!(
            estimate(&catalog, Some(1000.0), Some(3000.0), Some("premium")),
            3_864_000
        );
    }

    #[test]
    fn test_zero_or_missing_inputs() {
        let catalog = MaterialCatalog::default();
        assert_eq!(estimate(&catalog, Some(0.0), Some(3000.0), None), 0);
        assert_eq!(estimate(&catalog, Some(500.0), Some(0.0), None), 0);
        assert_eq!(estimate(&catalog, None, Some(3000.0), None), 0);
        assert_eq!(estimate(&catalog, Some(500.0), None, None), 0);
        assert_eq!(estimate(&catalog, Some(-5.0), Some(3000.0), None), 0);
    }

    #[test]
    fn test_unknown_grade_has_no_multiplier() {
        let catalog = MaterialCatalog::default();
        assert_eq!(estimate(&catalog, Some(100.0), Some(2000.0), Some("??")), 200_000);
        assert_eq!(estimate(&catalog, Some(100.0), Some(2000.0), None), 200_000);
    }

    #[test]
    fn test_monotonic_in_quantity() {
        let catalog = MaterialCatalog::default();
        let mut previous = 0;
        for quantity in (1..=1500).map(f64::from) {
            let revenue = estimate(&catalog, Some(quantity), Some(2800.0), Some("grade_a"));
            assert!(revenue >= previous, "revenue dropped at {quantity}");
            previous = revenue;
        }
    }

    #[test]
    fn test_volume_tiers() {
        assert_eq!(volume_multiplier(499.9), 1.0);
        assert_eq!(volume_multiplier(500.0), 1.08);
        assert_eq!(volume_multiplier(1500.0), 1.12);
    }
}
