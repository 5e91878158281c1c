//! Sample marketplace data for demos and local development.

use super::Persistence;
use crate::config::catalog::MaterialCatalog;
use crate::types::{
    CementRequirement, ListingStatus, MarketCondition, MarketIntelligence, Match, MatchStatus,
    PlatformMetrics, PricePoint, UserProfile, WasteListing,
};
use anyhow::Result;
use chrono::{Duration, Utc};

/// Seeded monthly prices relative to today's price, oldest first
const PRICE_PATH: [f64; 6] = [0.94, 0.97, 0.95, 0.99, 1.02, 1.0];
const PRICE_INTERVAL_DAYS: i64 = 30;

/// Counts of rows actually written by [`Persistence::seed_sample_data`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub listings: usize,
    pub requirements: usize,
    pub matches: usize,
    pub users: usize,
    pub price_points: usize,
    pub metrics_initialized: bool,
    pub market_initialized: bool,
}

pub fn sample_listings() -> Vec<WasteListing> {
    let now = Utc::now();
    let listing = |id: &str, material: &str, quantity: f64, location: &str, grade: &str, price: f64, status: ListingStatus, company: &str| {
        WasteListing {
            id: id.to_string(),
            material_type: material.to_string(),
            quantity,
            location: location.to_string(),
            quality_grade: grade.to_string(),
            price_per_ton: price,
            status,
            company: company.to_string(),
            created_at: now,
        }
    };

    vec![
        listing("w001", "fly_ash", 500.0, "Mumbai", "grade_a", 3200.0, ListingStatus::Available, "ABC Power Plant Ltd"),
        listing("w002", "steel_slag", 300.0, "Chennai", "grade_1", 2800.0, ListingStatus::Available, "XYZ Steel Mills Pvt Ltd"),
        listing("w003", "silica_fume", 150.0, "Bangalore", "premium", 5200.0, ListingStatus::LimitedStock, "Tech Industries Corp"),
        listing("w004", "bottom_ash", 800.0, "Pune", "standard", 2000.0, ListingStatus::Available, "Green Energy Solutions"),
    ]
}

pub fn sample_requirements() -> Vec<CementRequirement> {
    let now = Utc::now();
    vec![
        CementRequirement {
            id: "c001".to_string(),
            company: "PQR Cement Industries Ltd".to_string(),
            location: "Mumbai".to_string(),
            materials_needed: vec!["fly_ash".to_string(), "bottom_ash".to_string()],
            capacity: 1000.0,
            price_offered: 3200.0,
            urgency: "high".to_string(),
            active: true,
            created_at: now,
        },
        CementRequirement {
            id: "c002".to_string(),
            company: "LMN Cement Corporation".to_string(),
            location: "Chennai".to_string(),
            materials_needed: vec!["steel_slag".to_string(), "silica_fume".to_string()],
            capacity: 800.0,
            price_offered: 2750.0,
            urgency: "medium".to_string(),
            active: true,
            created_at: now,
        },
    ]
}

/// A completed deal between w001 and c001 (400 t at ₹3200/t)
pub fn sample_matches() -> Vec<Match> {
    let created_at = Utc::now() - Duration::days(30);
    let mut completed = Match::pending("w001", "c001", 92, 1_280_000, 320.0);
    completed.id = "m001".to_string();
    completed.status = MatchStatus::Completed;
    completed.created_at = created_at;
    completed.expires_at = created_at + Duration::days(crate::types::MATCH_TTL_DAYS);
    completed.completed_at = Some(created_at + Duration::days(10));
    vec![completed]
}

pub fn sample_users() -> Vec<UserProfile> {
    vec![UserProfile {
        id: "u001".to_string(),
        email: "rajesh.kumar@abcpower.com".to_string(),
        name: "Rajesh Kumar".to_string(),
        role: "waste_supplier".to_string(),
        company: "ABC Power Plant Ltd".to_string(),
        phone: Some("+91-9876543210".to_string()),
        location: "Mumbai".to_string(),
        verification_status: "verified".to_string(),
        joined_at: Utc::now() - Duration::days(180),
    }]
}

/// Six monthly national-average observations per catalog material. The latest
/// equals `base_price * trend`, so trends derived from it match the catalog.
pub fn sample_price_history(catalog: &MaterialCatalog) -> Vec<PricePoint> {
    let now = Utc::now();
    let mut points = Vec::new();
    for profile in &catalog.materials {
        let current = profile.base_price * profile.trend;
        let mut previous: Option<f64> = None;
        for (i, factor) in PRICE_PATH.iter().enumerate() {
            let months_ago = (PRICE_PATH.len() - 1 - i) as i64;
            let price = (current * factor).round();
            let market_conditions = match previous {
                Some(prev) if price > prev * 1.02 => MarketCondition::HighDemand,
                Some(prev) if price < prev * 0.98 => MarketCondition::LowDemand,
                _ => MarketCondition::Stable,
            };
            points.push(PricePoint {
                id: format!("ph-{}-{}", profile.key, months_ago),
                material: profile.key.clone(),
                price_per_ton: price,
                region: "national_average".to_string(),
                quality_grade: "standard".to_string(),
                market_conditions,
                timestamp: now - Duration::days(PRICE_INTERVAL_DAYS * months_ago),
            });
            previous = Some(price);
        }
    }
    points
}

pub fn sample_market_intelligence() -> MarketIntelligence {
    MarketIntelligence {
        growth_rate: 12.5,
        market_sentiment: "positive".to_string(),
        demand_level: "high".to_string(),
        supply_constraints: "moderate".to_string(),
        updated_at: Utc::now(),
    }
}

pub fn sample_metrics() -> PlatformMetrics {
    PlatformMetrics {
        total_co2_saved: 12_500.0,
        total_waste_processed: 8_750.0,
        total_revenue_generated: 2_300_000.0,
        total_matches_created: 156,
        updated_at: Some(Utc::now()),
    }
}

impl Persistence {
    /// Insert the sample marketplace, price history, market outlook and metrics
    /// snapshot. Rows whose ids already exist are left untouched.
    pub fn seed_sample_data(&self, catalog: &MaterialCatalog) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for listing in sample_listings() {
            if self.insert_listing(&listing)? {
                tracing::info!(id = %listing.id, material = %listing.material_type, "Seeded waste listing");
                report.listings += 1;
            }
        }

        for requirement in sample_requirements() {
            if self.insert_requirement(&requirement)? {
                tracing::info!(id = %requirement.id, company = %requirement.company, "Seeded cement requirement");
                report.requirements += 1;
            }
        }

        for record in sample_matches() {
            if self.get_match(&record.id)?.is_none() {
                self.insert_match(&record)?;
                tracing::info!(id = %record.id, status = record.status.as_str(), "Seeded match");
                report.matches += 1;
            }
        }

        for user in sample_users() {
            if self.insert_user(&user)? {
                tracing::info!(id = %user.id, role = %user.role, "Seeded user");
                report.users += 1;
            }
        }

        for point in sample_price_history(catalog) {
            if self.insert_price_point(&point)? {
                report.price_points += 1;
            }
        }
        tracing::info!(points = report.price_points, "Seeded price history");

        report.market_initialized = self.init_market_intelligence(&sample_market_intelligence())?;
        report.metrics_initialized = self.init_metrics(&sample_metrics())?;
        Ok(report)
    }
}
