/// API request handlers
use crate::api::error::ApiError;
use crate::api::models::*;
use crate::assistant::{suggest, GenerationConfig, MarketSnapshot, ModelProvider, PromptBuilder};
use crate::config::AppConfig;
use crate::notify::{LogNotifier, MatchNotification, Notifier};
use crate::persistence::{MetricsCounter, Persistence};
use crate::scoring::{RequirementProfile, ScoringEngine};
use crate::types::{ChatLog, ImpactMetric, Match, MetricsDelta};
use axum::extract::{rejection::JsonRejection, Json, State};
use axum::response::IntoResponse;
use chrono::Utc;
use serde_json::{json, Value as JsonValue};
use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Instant;

const PROMPT_LISTING_LIMIT: usize = 10;
const PROMPT_REQUIREMENT_LIMIT: usize = 10;
const MATCHER_REQUIREMENT_LIMIT: usize = 50;
const MATCHER_LISTING_LIMIT: usize = 10;
const TOP_MATCHES: usize = 3;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub persistence: Persistence,
    pub metrics: Arc<dyn MetricsCounter>,
    pub engine: ScoringEngine,
    pub prompts: PromptBuilder,
    pub provider: Arc<dyn ModelProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub config: AppConfig,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(persistence: Persistence, provider: Arc<dyn ModelProvider>, config: AppConfig) -> Self {
        let engine = ScoringEngine::new(config.catalog.clone());
        let prompts = PromptBuilder::new(engine.shared_catalog());
        Self {
            metrics: Arc::new(persistence.clone()),
            persistence,
            engine,
            prompts,
            provider,
            notifier: Arc::new(LogNotifier),
            config,
            start_time: Instant::now(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsCounter>) -> Self {
        self.metrics = metrics;
        self
    }
}

mod examples {
    use serde_json::{json, Value};

    pub fn chat() -> Value {
        json!({"message": "What is the current price of fly ash in Mumbai?", "context": {}})
    }

    pub fn matcher() -> Value {
        json!({"parameters": {"waste_type": "fly_ash", "quantity": 500, "location": "Mumbai", "quality_grade": "grade_a"}})
    }

    pub fn co2() -> Value {
        json!({"parameters": {"waste_type": "fly_ash", "quantity": 500, "location": "Mumbai"}})
    }

    pub fn price() -> Value {
        json!({"parameters": {"waste_type": "fly_ash", "location": "Mumbai", "quantity": 500, "quality_grade": "premium"}})
    }

    pub fn create_match() -> Value {
        json!({
            "wasteId": "w001",
            "requirementId": "c001",
            "userInfo": {"name": "Priya Sharma", "email": "priya@example.com"},
            "contactPreference": "email"
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &str, example: fn() -> JsonValue) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{field} is required"), example()))
}

fn positive_quantity(value: Option<f64>, example: fn() -> JsonValue) -> Result<f64, ApiError> {
    match value {
        Some(q) if q.is_finite() && q > 0.0 => Ok(q),
        Some(_) => Err(ApiError::validation(
            "quantity must be a positive number of tonnes",
            example(),
        )),
        None => Err(ApiError::validation("quantity is required", example())),
    }
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Chat with the marketplace assistant
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_body(e, examples::chat()))?;
    let message = required(&request.message, "message", examples::chat)?;

    let snapshot = MarketSnapshot {
        listings: state
            .persistence
            .list_listings(None, PROMPT_LISTING_LIMIT)
            .map_err(ApiError::storage)?,
        requirements: state
            .persistence
            .list_requirements(None, PROMPT_REQUIREMENT_LIMIT)
            .map_err(ApiError::storage)?,
        metrics: state.metrics.current().map_err(ApiError::storage)?,
        market: state.persistence.market_intelligence().map_err(ApiError::storage)?,
        latest_prices: state.persistence.latest_prices().map_err(ApiError::storage)?,
    };
    let prompt = state.prompts.build(&snapshot, request.context.as_ref(), message);

    let generation = GenerationConfig::from(&state.config.model);
    let reply = state
        .provider
        .generate(&prompt, &generation)
        .await
        .map_err(|e| ApiError::upstream("The assistant is temporarily unavailable", e))?;

    let suggestions = suggest(message);
    let timestamp = Utc::now();
    let log = ChatLog {
        id: uuid::Uuid::new_v4().to_string(),
        user_message: message.to_string(),
        ai_response: reply.content.clone(),
        context: request.context.clone().unwrap_or(JsonValue::Null),
        suggestions: suggestions.clone(),
        timestamp,
    };
    if let Err(e) = state.persistence.append_chat_log(&log) {
        tracing::warn!("Failed to record chat log: {:#}", e);
    }

    tracing::debug!(model = %reply.model, suggestions = suggestions.len(), "Chat reply generated");
    Ok(Json(ChatResponse {
        response: reply.content,
        suggestions,
        timestamp,
    }))
}

/// Rank active cement-plant requirements for an offered material
pub async fn matcher(
    State(state): State<AppState>,
    payload: Result<Json<WebhookRequest<MatcherParams>>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let Json(WebhookRequest { parameters: params }) =
        payload.map_err(|e| ApiError::bad_body(e, examples::matcher()))?;
    let material = required(&params.waste_type, "waste_type", examples::matcher)?;
    let quantity = positive_quantity(params.quantity, examples::matcher)?;
    let location = required(&params.location, "location", examples::matcher)?;
    let grade = optional(&params.quality_grade);

    let engine = &state.engine;
    // Buyer cities are checked per candidate.
    engine
        .city(location)
        .map_err(|e| ApiError::scoring(e, examples::matcher()))?;

    let requirements = state
        .persistence
        .list_requirements(Some(material), MATCHER_REQUIREMENT_LIMIT)
        .map_err(ApiError::storage)?;
    let listings = state
        .persistence
        .list_listings(Some(material), MATCHER_LISTING_LIMIT)
        .map_err(ApiError::storage)?;
    let metrics = state.metrics.current().map_err(ApiError::storage)?;

    let mut candidates: Vec<MatchCandidate> = requirements
        .iter()
        .map(|req| {
            let score = engine.compatibility(material, quantity, grade, &RequirementProfile::from(req));
            let estimated_revenue = engine.revenue(Some(quantity), Some(req.price_offered), grade);
            let (distance_km, logistics_cost) = match engine.distance(location, &req.location) {
                Ok(d) => (
                    Some((d * 10.0).round() / 10.0),
                    Some(engine.logistics_cost(d, quantity)),
                ),
                Err(e) => {
                    tracing::warn!(requirement = %req.id, "Skipping logistics: {}", e);
                    (None, None)
                }
            };
            MatchCandidate {
                requirement_id: req.id.clone(),
                company: req.company.clone(),
                location: req.location.clone(),
                score,
                estimated_revenue,
                price_offered: req.price_offered,
                urgency: req.urgency.clone(),
                distance_km,
                logistics_cost,
            }
        })
        .collect();
    candidates.sort_by_key(|c| Reverse((c.score, c.estimated_revenue)));
    candidates.truncate(TOP_MATCHES);

    let impact = engine.co2_impact(material, quantity);
    let text = match candidates.first() {
        Some(best) => format!(
            "Found {} cement plant match{} for {} t of {} from {}. Best match: {} in {} (score {}%, estimated revenue ₹{}). Using this material saves {:.1} t of CO2.",
            candidates.len(),
            if candidates.len() == 1 { "" } else { "es" },
            quantity,
            impact.display_name,
            location,
            best.company,
            best.location,
            best.score,
            best.estimated_revenue,
            impact.co2_saved
        ),
        None => format!(
            "No cement plants are looking for {} right now. We'll keep your {} t from {} on file and alert you when demand appears.",
            impact.display_name, quantity, location
        ),
    };

    tracing::info!(material, quantity, matches = candidates.len(), "Matcher completed");
    Ok(Json(WebhookResponse::new(
        text,
        json!({
            "matches": candidates,
            "matchCount": candidates.len(),
            "co2Saved": impact.co2_saved,
            "availableListings": listings.len(),
            "platformMetrics": metrics,
        }),
    )))
}

/// CO2 impact of diverting waste into cement, with running platform totals
pub async fn co2_calculator(
    State(state): State<AppState>,
    payload: Result<Json<WebhookRequest<Co2Params>>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let Json(WebhookRequest { parameters: params }) =
        payload.map_err(|e| ApiError::bad_body(e, examples::co2()))?;
    let material = required(&params.waste_type, "waste_type", examples::co2)?;
    let quantity = positive_quantity(params.quantity, examples::co2)?;
    let location = optional(&params.location);

    let impact = state.engine.co2_impact(material, quantity);

    let metric = ImpactMetric {
        id: uuid::Uuid::new_v4().to_string(),
        waste_type: impact.material.clone(),
        quantity,
        co2_saved: impact.co2_saved,
        carbon_credits_value: impact.carbon_credits,
        timestamp: Utc::now(),
    };
    state
        .persistence
        .append_impact_metric(&metric)
        .map_err(ApiError::storage)?;
    let totals = state
        .metrics
        .increment(&MetricsDelta {
            co2_saved: impact.co2_saved,
            waste_processed: quantity,
            ..Default::default()
        })
        .map_err(ApiError::storage)?;

    let text = format!(
        "Using {} t of {} saves {:.1} t of CO2, the same as {} trees, worth ₹{} in carbon credits. The platform has now saved {:.0} t of CO2 in total.",
        quantity, impact.display_name, impact.co2_saved, impact.trees_equivalent, impact.carbon_credits, totals.total_co2_saved
    );

    Ok(Json(WebhookResponse::new(
        text,
        json!({
            "impact": impact,
            "location": location,
            "cumulative": totals,
        }),
    )))
}

/// Market price estimate for a material
pub async fn price_estimate(
    State(state): State<AppState>,
    payload: Result<Json<WebhookRequest<PriceParams>>, JsonRejection>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let Json(WebhookRequest { parameters: params }) =
        payload.map_err(|e| ApiError::bad_body(e, examples::price()))?;
    let material = required(&params.waste_type, "waste_type", examples::price)?;
    let quantity = match params.quantity {
        Some(q) => Some(positive_quantity(Some(q), examples::price)?),
        None => None,
    };
    let location = optional(&params.location);
    let grade = optional(&params.quality_grade);

    let estimate = state.engine.dynamic_price(material, location, quantity, grade);
    let display = state
        .engine
        .catalog()
        .known_material(material)
        .map(|m| m.display_name.clone())
        .unwrap_or_else(|| material.to_string());

    let mut text = format!(
        "Estimated price for {} ({}): ₹{:.0} per ton, {}.",
        display, estimate.quality_grade, estimate.final_price, estimate.volume_adjustment_label
    );
    if let (Some(q), Some(total)) = (quantity, estimate.total_value) {
        text.push_str(&format!(" Total for {} t: ₹{:.0}.", q, total));
    }

    Ok(Json(WebhookResponse::new(text, json!({ "pricing": estimate }))))
}

/// Record a match between a listing and a requirement
pub async fn create_match(
    State(state): State<AppState>,
    payload: Result<Json<CreateMatchRequest>, JsonRejection>,
) -> Result<Json<CreateMatchResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_body(e, examples::create_match()))?;
    let waste_id = required(&request.waste_id, "wasteId", examples::create_match)?;
    let requirement_id = required(&request.requirement_id, "requirementId", examples::create_match)?;

    let listing = state
        .persistence
        .get_listing(waste_id)
        .map_err(ApiError::storage)?
        .ok_or_else(|| ApiError::not_found(format!("Waste listing '{waste_id}' not found")))?;
    let requirement = state
        .persistence
        .get_requirement(requirement_id)
        .map_err(ApiError::storage)?
        .ok_or_else(|| ApiError::not_found(format!("Cement requirement '{requirement_id}' not found")))?;

    let engine = &state.engine;
    let grade = Some(listing.quality_grade.as_str());
    let score = engine.compatibility(
        &listing.material_type,
        listing.quantity,
        grade,
        &RequirementProfile::from(&requirement),
    );
    let estimated_revenue = engine.revenue(Some(listing.quantity), Some(listing.price_per_ton), grade);
    let estimated_co2 = engine.co2_impact(&listing.material_type, listing.quantity).co2_saved;

    let mut record = Match::pending(&listing.id, &requirement.id, score, estimated_revenue, estimated_co2);
    let user = request.user_info.unwrap_or_default();
    record.contact_name = user.name;
    record.contact_email = user.email;
    record.contact_preference = request.contact_preference;

    state.persistence.insert_match(&record).map_err(ApiError::storage)?;
    state
        .metrics
        .increment(&MetricsDelta {
            matches_created: 1,
            revenue_generated: estimated_revenue as f64,
            ..Default::default()
        })
        .map_err(ApiError::storage)?;

    let notification = MatchNotification {
        match_id: record.id.clone(),
        material_type: listing.material_type.clone(),
        match_score: score,
        recipient: record.contact_email.clone(),
        contact_preference: record.contact_preference.clone(),
    };
    let notifier = Arc::clone(&state.notifier);
    tokio::spawn(async move {
        if let Err(e) = notifier.match_created(&notification).await {
            tracing::warn!(match_id = %notification.match_id, "Notification failed: {:#}", e);
        }
    });

    tracing::info!(match_id = %record.id, waste_id, requirement_id, score, "Match created");
    Ok(Json(CreateMatchResponse {
        success: true,
        match_id: record.id,
        score,
        estimated_revenue,
        estimated_co2,
        status: record.status,
        expires_at: record.expires_at,
        message: format!(
            "Match created with {}. They will be contacted and the offer stays open for 7 days.",
            requirement.company
        ),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims_and_rejects_blank() {
        assert_eq!(required(&Some("  fly_ash ".into()), "waste_type", examples::co2).unwrap(), "fly_ash");
        assert!(required(&Some("   ".into()), "waste_type", examples::co2).is_err());
        assert!(required(&None, "waste_type", examples::co2).is_err());
    }

    #[test]
    fn test_positive_quantity() {
        assert_eq!(positive_quantity(Some(12.5), examples::co2).unwrap(), 12.5);
        assert!(positive_quantity(Some(0.0), examples::co2).is_err());
        assert!(positive_quantity(Some(f64::INFINITY), examples::co2).is_err());
        assert!(positive_quantity(None, examples::co2).is_err());
    }
}
