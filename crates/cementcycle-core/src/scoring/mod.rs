//! Deterministic matching, pricing and impact scoring
//!
//! Every function here is pure: no I/O, no shared mutable state. The engine
//! only carries the injected [`MaterialCatalog`], so it can be cloned freely
//! into request handlers.

pub mod compatibility;
pub mod geo;
pub mod impact;
pub mod pricing;
pub mod revenue;

pub use compatibility::RequirementProfile;
pub use impact::Co2Impact;
pub use pricing::{PriceEstimate, VolumeTier};

use crate::config::catalog::{City, MaterialCatalog};
use crate::error::ScoringError;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    catalog: Arc<MaterialCatalog>,
}

impl ScoringEngine {
    pub fn new(catalog: MaterialCatalog) -> Self {
        Self::with_shared(Arc::new(catalog))
    }

    /// Build an engine over a catalog that is also handed to other components
    pub fn with_shared(catalog: Arc<MaterialCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn shared_catalog(&self) -> Arc<MaterialCatalog> {
        Arc::clone(&self.catalog)
    }

    pub fn city(&self, name: &str) -> Result<&City, ScoringError> {
        geo::locate(&self.catalog, name)
    }

    /// Great-circle distance in km between two known cities
    pub fn distance(&self, from: &str, to: &str) -> Result<f64, ScoringError> {
        geo::distance_km(&self.catalog, from, to)
    }

    /// Match score in `[0, 98]`
    pub fn compatibility(
        &self,
        material: &str,
        quantity: f64,
        quality_grade: Option<&str>,
        requirement: &RequirementProfile,
    ) -> u8 {
        compatibility::score(&self.catalog, material, quantity, quality_grade, requirement)
    }

    /// Estimated sale value in ₹, zero when quantity or price is missing
    pub fn revenue(
        &self,
        quantity: Option<f64>,
        price_per_ton: Option<f64>,
        quality_grade: Option<&str>,
    ) -> u64 {
        revenue::estimate(&self.catalog, quantity, price_per_ton, quality_grade)
    }

    pub fn co2_impact(&self, material: &str, quantity: f64) -> Co2Impact {
        impact::calculate(&self.catalog, material, quantity)
    }

    pub fn dynamic_price(
        &self,
        material: &str,
        location: Option<&str>,
        quantity: Option<f64>,
        quality_grade: Option<&str>,
    ) -> PriceEstimate {
        pricing::estimate(&self.catalog, material, location, quantity, quality_grade)
    }

    /// Transport cost in ₹ for a shipment
    pub fn logistics_cost(&self, distance_km: f64, quantity: f64) -> u64 {
        geo::logistics_cost(&self.catalog, distance_km, quantity)
    }
}

/// Positive finite quantities pass through; anything else counts as absent.
pub(crate) fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}
