//! Prompt assembly for the marketplace assistant
//!
//! The coefficient tables are rendered from the same [`MaterialCatalog`] the
//! scoring engine reads, so the assistant never quotes numbers the engine
//! would not produce. The persona is sent separately as the provider's
//! system instruction.

use crate::config::catalog::MaterialCatalog;
use crate::types::{CementRequirement, MarketIntelligence, PlatformMetrics, PricePoint, WasteListing};
use serde_json::Value as JsonValue;
use std::sync::Arc;

pub const ASSISTANT_PERSONA: &str = "You are CementCycle AI, an expert in connecting industrial waste \
generators with cement plants in India. You help users match by-products with buyers, \
estimate CO2 savings, and quote fair market prices. Be helpful and professional, keep \
answers short, quote figures in ₹ and tonnes, and point out the environmental benefit.";

/// Live marketplace data included in a prompt
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub listings: Vec<WasteListing>,
    pub requirements: Vec<CementRequirement>,
    pub metrics: PlatformMetrics,
    pub market: Option<MarketIntelligence>,
    /// Latest observation per material
    pub latest_prices: Vec<PricePoint>,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    catalog: Arc<MaterialCatalog>,
}

impl PromptBuilder {
    pub fn new(catalog: Arc<MaterialCatalog>) -> Self {
        Self { catalog }
    }

    pub fn build(&self, snapshot: &MarketSnapshot, context: Option<&JsonValue>, message: &str) -> String {
        let mut prompt = String::with_capacity(2048);
        prompt.push_str(&self.render_catalog());
        prompt.push_str(&render_snapshot(snapshot));

        if let Some(context) = context.filter(|c| !c.is_null()) {
            prompt.push_str("## Conversation context\n");
            prompt.push_str(&context.to_string());
            prompt.push_str("\n\n");
        }

        prompt.push_str("User: ");
        prompt.push_str(message.trim());
        prompt.push('\n');
        prompt
    }

    fn render_catalog(&self) -> String {
        let catalog = &self.catalog;
        let mut out = String::from("## CO2 savings and market prices\n");
        for m in &catalog.materials {
            out.push_str(&format!(
                "- {}: {} t CO2 saved per t used; base price ₹{:.0}/t (trend x{:.2}, volatility {:.0}%). {}\n",
                m.display_name,
                m.co2_per_ton,
                m.base_price,
                m.trend,
                m.volatility * 100.0,
                m.mechanism
            ));
        }
        out.push_str(&format!(
            "- Other materials: {} t CO2 per t; base price ₹{:.0}/t\n",
            catalog.fallback.co2_per_ton, catalog.fallback.base_price
        ));

        let grades = &catalog.grades;
        out.push_str(&format!(
            "Quality multipliers: premium x{:.2}, grade_a/grade_1 x{:.2}, standard x{:.2}.\n",
            grades.premium.price_multiplier, grades.grade_a.price_multiplier, grades.standard.price_multiplier
        ));
        out.push_str(&format!(
            "Logistics: ₹{:.0} per km. Carbon credits trade at ₹{:.0} per t CO2.\n",
            catalog.pricing.logistics_rate_per_km, catalog.pricing.carbon_credit_price_per_ton
        ));
        out.push_str(&format!("Served cities: {}.\n\n", catalog.city_names().join(", ")));
        out
    }
}

fn render_snapshot(snapshot: &MarketSnapshot) -> String {
    let mut out = String::from("## Available waste listings\n");
    if snapshot.listings.is_empty() {
        out.push_str("(none)\n");
    }
    for l in &snapshot.listings {
        out.push_str(&format!(
            "- {} {}: {} t in {}, {}, ₹{:.0}/t, {} ({})\n",
            l.id,
            l.material_type,
            l.quantity,
            l.location,
            l.quality_grade,
            l.price_per_ton,
            l.company,
            l.status.as_str()
        ));
    }

    out.push_str("\n## Cement plant requirements\n");
    if snapshot.requirements.is_empty() {
        out.push_str("(none)\n");
    }
    for r in &snapshot.requirements {
        out.push_str(&format!(
            "- {} {} in {} needs {}: capacity {} t, offering ₹{:.0}/t, urgency {}\n",
            r.id,
            r.company,
            r.location,
            r.materials_needed.join("/"),
            r.capacity,
            r.price_offered,
            r.urgency
        ));
    }

    if let Some(market) = &snapshot.market {
        out.push_str(&format!(
            "\n## Market outlook\nGrowth {:.1}% per year, sentiment {}, demand {}, supply constraints {}.\n",
            market.growth_rate, market.market_sentiment, market.demand_level, market.supply_constraints
        ));
    }

    if !snapshot.latest_prices.is_empty() {
        out.push_str("\n## Latest observed prices\n");
        for p in &snapshot.latest_prices {
            out.push_str(&format!(
                "- {}: ₹{:.0}/t {} ({}, {})\n",
                p.material,
                p.price_per_ton,
                p.quality_grade,
                p.market_conditions.as_str(),
                p.region
            ));
        }
    }

    let m = &snapshot.metrics;
    out.push_str(&format!(
        "\n## Platform totals\n{:.0} t CO2 saved, {:.0} t waste processed, ₹{:.0} revenue, {} matches\n\n",
        m.total_co2_saved, m.total_waste_processed, m.total_revenue_generated, m.total_matches_created
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::seed::{
        sample_listings, sample_market_intelligence, sample_metrics, sample_price_history,
        sample_requirements,
    };

    #[test]
    fn test_prompt_contains_catalog_and_message() {
        let builder = PromptBuilder::new(Arc::new(MaterialCatalog::default()));
        let prompt = builder.build(&MarketSnapshot::default(), None, "  How much is fly ash? ");

        assert!(prompt.starts_with("## CO2 savings and market prices"));
        assert!(!prompt.contains(ASSISTANT_PERSONA));
        assert!(prompt.contains("Fly Ash: 0.8 t CO2"));
        assert!(prompt.contains("base price ₹2800/t"));
        assert!(prompt.contains("(none)"));
        assert!(prompt.ends_with("User: How much is fly ash?\n"));
        assert!(!prompt.contains("Conversation context"));
    }

    #[test]
    fn test_prompt_follows_catalog_overrides() {
        let mut catalog = MaterialCatalog::default();
        catalog.materials[0].base_price = 3100.0;
        let builder = PromptBuilder::new(Arc::new(catalog));
        let prompt = builder.build(&MarketSnapshot::default(), None, "hi");
        assert!(prompt.contains("base price ₹3100/t"));
    }

    #[test]
    fn test_prompt_includes_live_data_and_context() {
        let builder = PromptBuilder::new(Arc::new(MaterialCatalog::default()));
        let snapshot = MarketSnapshot {
            listings: sample_listings(),
            requirements: sample_requirements(),
            metrics: sample_metrics(),
            market: Some(sample_market_intelligence()),
            latest_prices: sample_price_history(&MaterialCatalog::default())
                .into_iter()
                .filter(|p| p.id.ends_with("-0"))
                .collect(),
        };
        let context = serde_json::json!({"page": "marketplace"});
        let prompt = builder.build(&snapshot, Some(&context), "Who buys slag?");

        assert!(prompt.contains("w002 steel_slag: 300 t in Chennai"));
        assert!(prompt.contains("c002 LMN Cement Corporation in Chennai needs steel_slag/silica_fume"));
        assert!(prompt.contains("156 matches"));
        assert!(prompt.contains(r#"{"page":"marketplace"}"#));
        assert!(prompt.contains("Growth 12.5% per year, sentiment positive, demand high"));
        assert!(prompt.contains("- fly_ash: ₹2940/t standard (stable, national_average)"));
        assert!(!prompt.contains("₹2999/t"));
    }
}
