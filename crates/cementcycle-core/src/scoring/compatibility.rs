use crate::config::catalog::{normalize_key, MaterialCatalog, QualityGrade};
use crate::types::CementRequirement;
use serde::{Deserialize, Serialize};

const BASE_SCORE: u32 = 50;
const MATERIAL_MATCH_BONUS: u32 = 25;
const FULL_CAPACITY_BONUS: u32 = 15;
const PARTIAL_CAPACITY_BONUS: u32 = 10;
const PARTIAL_CAPACITY_RATIO: f64 = 0.7;
const HIGH_URGENCY_BONUS: u32 = 8;
pub const MAX_SCORE: u8 = 98;

/// The parts of a buyer requirement that affect the match score
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequirementProfile {
    #[serde(default)]
    pub materials_needed: Vec<String>,
    pub capacity: Option<f64>,
    pub urgency: Option<String>,
}

impl From<&CementRequirement> for RequirementProfile {
    fn from(req: &CementRequirement) -> Self {
        Self {
            materials_needed: req.materials_needed.clone(),
            capacity: Some(req.capacity),
            urgency: Some(req.urgency.clone()),
        }
    }
}

pub fn score(
    catalog: &MaterialCatalog,
    material: &str,
    quantity: f64,
    quality_grade: Option<&str>,
    requirement: &RequirementProfile,
) -> u8 {
    let mut total = BASE_SCORE;

    let material = normalize_key(material);
    if requirement
        .materials_needed
        .iter()
        .any(|m| normalize_key(m) == material)
    {
        total += MATERIAL_MATCH_BONUS;
    }

    if let Some(capacity) = requirement.capacity.filter(|c| c.is_finite()) {
        if capacity >= quantity {
            total += FULL_CAPACITY_BONUS;
        } else if capacity >= quantity * PARTIAL_CAPACITY_RATIO {
            total += PARTIAL_CAPACITY_BONUS;
        }
    }

    total += catalog
        .grade(QualityGrade::parse(quality_grade))
        .compatibility_bonus;

    if requirement
        .urgency
        .as_deref()
        .is_some_and(|u| u.trim().eq_ignore_ascii_case("high"))
    {
        total += HIGH_URGENCY_BONUS;
    }

    total.min(u32::from(MAX_SCORE)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement(materials: &[&str], capacity: Option<f64>, urgency: Option<&str>) -> RequirementProfile {
        RequirementProfile {
            materials_needed: materials.iter().map(|m| m.to_string()).collect(),
            capacity,
            urgency: urgency.map(str::to_string),
        }
    }

    #[test]
    fn test_best_case_is_capped() {
        let catalog = MaterialCatalog::default();
        let req = requirement(&["fly_ash"], Some(600.0), Some("high"));
        // 50 + 25 + 15 + 15 + 8 = 113, capped
        assert_eq!(score(&catalog, "fly_ash", 500.0, Some("premium"), &req), 98);
    }

    #[test]
    fn test_empty_requirement_gets_base_and_grade_only() {
        let catalog = MaterialCatalog::default();
        let req = RequirementProfile::default();
        assert_eq!(score(&catalog, "fly_ash", 500.0, None, &req), 55);
        assert_eq!(score(&catalog, "fly_ash", 500.0, Some("standard"), &req), 58);
    }

    #[test]
    fn test_material_match_is_case_insensitive() {
        let catalog = MaterialCatalog::default();
        let req = requirement(&["Fly_Ash"], None, None);
        assert_eq!(score(&catalog, "FLY_ASH", 10.0, None, &req), 80);
    }

    #[test]
    fn test_capacity_tiers() {
        let catalog = MaterialCatalog::default();
        let at = |capacity| {
            score(
                &catalog,
                "steel_slag",
                1000.0,
                Some("standard"),
                &requirement(&[], Some(capacity), None),
            )
        };
        assert_eq!(at(1000.0), 50 + 15 + 8);
        assert_eq!(at(700.0), 50 + 10 + 8);
        assert_eq!(at(699.0), 50 + 8);
    }

    #[test]
    fn test_monotonic_in_capacity_ratio() {
        let catalog = MaterialCatalog::default();
        let mut previous = 0;
        for capacity in (0..=200).map(|c| f64::from(c) * 10.0) {
            let s = score(
                &catalog,
                "fly_ash",
                1000.0,
                Some("grade_a"),
                &requirement(&["fly_ash"], Some(capacity), Some("low")),
            );
            assert!(s >= previous, "score dropped at capacity {capacity}");
            assert!(s <= MAX_SCORE);
            previous = s;
        }
    }

    #[test]
    fn test_monotonic_in_grade_rank() {
        let catalog = MaterialCatalog::default();
        let req = requirement(&["silica_fume"], Some(50.0), None);
        let scores: Vec<u8> = ["mystery", "standard", "grade_1", "grade_a", "premium"]
            .iter()
            .map(|g| score(&catalog, "silica_fume", 100.0, Some(g), &req))
            .collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
    }

    #[test]
    fn test_urgency_bonus_only_for_high() {
        let catalog = MaterialCatalog::default();
        let high = score(&catalog, "x", 1.0, None, &requirement(&[], None, Some("HIGH")));
        let medium = score(&catalog, "x", 1.0, None, &requirement(&[], None, Some("medium")));
        assert_eq!(high - medium, 8);
    }

    #[test]
    fn test_profile_from_stored_requirement() {
        let req = CementRequirement {
            id: "c001".into(),
            company: "PQR".into(),
            location: "Mumbai".into(),
            materials_needed: vec!["fly_ash".into()],
            capacity: 1000.0,
            price_offered: 3200.0,
            urgency: "high".into(),
            active: true,
            created_at: chrono::Utc::now(),
        };
        let profile = RequirementProfile::from(&req);
        assert_eq!(profile.capacity, Some(1000.0));
        assert_eq!(profile.urgency.as_deref(), Some("high"));
    }
}
