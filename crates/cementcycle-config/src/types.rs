//! Marketplace records stored in the document store and exchanged over the API.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Days a proposed match stays open before it expires
pub const MATCH_TTL_DAYS: i64 = 7;

/// Availability of a waste listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Available,
    LimitedStock,
    Reserved,
    Sold,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::LimitedStock => "limited_stock",
            Self::Reserved => "reserved",
            Self::Sold => "sold",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "available" => Some(Self::Available),
            "limited_stock" => Some(Self::LimitedStock),
            "reserved" => Some(Self::Reserved),
            "sold" => Some(Self::Sold),
            _ => None,
        }
    }

    /// Whether buyers can still be matched against the listing
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Available | Self::LimitedStock)
    }
}

/// A producer's offer of a waste material
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WasteListing {
    pub id: String,
    #[serde(rename = "type")]
    pub material_type: String,
    pub quantity: f64,
    pub location: String,
    pub quality_grade: String,
    pub price_per_ton: f64,
    pub status: ListingStatus,
    pub company: String,
    pub created_at: DateTime<Utc>,
}

/// A cement plant's standing demand
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CementRequirement {
    pub id: String,
    pub company: String,
    pub location: String,
    pub materials_needed: Vec<String>,
    /// Monthly intake capacity in tons
    pub capacity: f64,
    pub price_offered: f64,
    pub urgency: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl CementRequirement {
    /// Case-insensitive membership test on the materials list
    pub fn needs(&self, material: &str) -> bool {
        let material = crate::config::catalog::normalize_key(material);
        self.materials_needed
            .iter()
            .any(|m| crate::config::catalog::normalize_key(m) == material)
    }
}

/// Lifecycle state of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    PendingContact,
    Contacted,
    Completed,
    Expired,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PendingContact => "pending_contact",
            Self::Contacted => "contacted",
            Self::Completed => "completed",
            Self::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending_contact" => Some(Self::PendingContact),
            "contacted" => Some(Self::Contacted),
            "completed" => Some(Self::Completed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// A proposed pairing of one listing and one requirement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub waste_id: String,
    pub requirement_id: String,
    pub score: u8,
    pub estimated_revenue: u64,
    #[serde(rename = "estimatedCO2")]
    pub estimated_co2: f64,
    pub status: MatchStatus,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_preference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Match {
    /// New pending match created now, expiring after [`MATCH_TTL_DAYS`]
    pub fn pending(
        waste_id: impl Into<String>,
        requirement_id: impl Into<String>,
        score: u8,
        estimated_revenue: u64,
        estimated_co2: f64,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            waste_id: waste_id.into(),
            requirement_id: requirement_id.into(),
            score,
            estimated_revenue,
            estimated_co2,
            status: MatchStatus::PendingContact,
            contact_name: None,
            contact_email: None,
            contact_preference: None,
            created_at,
            expires_at: created_at + Duration::days(MATCH_TTL_DAYS),
            completed_at: None,
        }
    }
}

/// Demand signal attached to a price observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketCondition {
    HighDemand,
    Stable,
    LowDemand,
}

impl MarketCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighDemand => "high_demand",
            Self::Stable => "stable",
            Self::LowDemand => "low_demand",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "high_demand" => Some(Self::HighDemand),
            "stable" => Some(Self::Stable),
            "low_demand" => Some(Self::LowDemand),
            _ => None,
        }
    }
}

/// One observed market price for a material
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub id: String,
    pub material: String,
    pub price_per_ton: f64,
    pub region: String,
    pub quality_grade: String,
    pub market_conditions: MarketCondition,
    pub timestamp: DateTime<Utc>,
}

/// Overall market outlook shown to the assistant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketIntelligence {
    /// Year-on-year market growth, in percent
    pub growth_rate: f64,
    pub market_sentiment: String,
    pub demand_level: String,
    pub supply_constraints: String,
    pub updated_at: DateTime<Utc>,
}

/// A registered platform user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    /// `waste_supplier` or `cement_buyer`
    pub role: String,
    pub company: String,
    pub phone: Option<String>,
    pub location: String,
    pub verification_status: String,
    pub joined_at: DateTime<Utc>,
}

/// Append-only record of a CO2 calculation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImpactMetric {
    pub id: String,
    pub waste_type: String,
    pub quantity: f64,
    pub co2_saved: f64,
    pub carbon_credits_value: u64,
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of an assistant exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatLog {
    pub id: String,
    pub user_message: String,
    pub ai_response: String,
    pub context: JsonValue,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Cumulative platform totals kept in a single counter row
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetrics {
    pub total_co2_saved: f64,
    pub total_waste_processed: f64,
    pub total_revenue_generated: f64,
    pub total_matches_created: i64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Amounts to add to [`PlatformMetrics`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsDelta {
    pub co2_saved: f64,
    pub waste_processed: f64,
    pub revenue_generated: f64,
    pub matches_created: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_match_expires_after_ttl() {
        let m = Match::pending("w001", "c001", 92, 1_000, 400.0);
        assert_eq!(m.status, MatchStatus::PendingContact);
        assert_eq!(m.expires_at - m.created_at, Duration::days(7));
    }

    #[test]
    fn test_requirement_needs_is_case_insensitive() {
        let req = CementRequirement {
            id: "c001".into(),
            company: "PQR Cement".into(),
            location: "Mumbai".into(),
            materials_needed: vec!["Fly_Ash".into(), "bottom ash".into()],
            capacity: 1000.0,
            price_offered: 3200.0,
            urgency: "high".into(),
            active: true,
            created_at: Utc::now(),
        };
        assert!(req.needs("fly_ash"));
        assert!(req.needs("Bottom_Ash"));
        assert!(!req.needs("silica_fume"));
    }

    #[test]
    fn test_match_wire_names() {
        let m = Match::pending("w001", "c001", 90, 10, 1.5);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["wasteId"], "w001");
        assert_eq!(json["estimatedCO2"], 1.5);
        assert_eq!(json["status"], "pending_contact");
    }

    #[test]
    fn test_listing_status_round_trip_names() {
        for status in [
            ListingStatus::Available,
            ListingStatus::LimitedStock,
            ListingStatus::Reserved,
            ListingStatus::Sold,
        ] {
            assert_eq!(ListingStatus::from_str(status.as_str()), Some(status));
        }
        assert!(ListingStatus::LimitedStock.is_open());
        assert!(!ListingStatus::Sold.is_open());
    }
}
