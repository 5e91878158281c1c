/// Request and response bodies for the HTTP API
use crate::types::MatchStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub context: Option<JsonValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Conversational-agent webhook call. Only the session parameters are read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookRequest<P> {
    #[serde(default)]
    pub parameters: P,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatcherParams {
    pub waste_type: Option<String>,
    pub quantity: Option<f64>,
    pub location: Option<String>,
    pub quality_grade: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Co2Params {
    pub waste_type: Option<String>,
    pub quantity: Option<f64>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceParams {
    pub waste_type: Option<String>,
    pub location: Option<String>,
    pub quantity: Option<f64>,
    pub quality_grade: Option<String>,
}

/// One ranked buyer returned by the matcher
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub requirement_id: String,
    pub company: String,
    pub location: String,
    pub score: u8,
    pub estimated_revenue: u64,
    pub price_offered: f64,
    pub urgency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logistics_cost: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    pub waste_id: Option<String>,
    pub requirement_id: Option<String>,
    pub user_info: Option<UserInfo>,
    pub contact_preference: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchResponse {
    pub success: bool,
    pub match_id: String,
    pub score: u8,
    pub estimated_revenue: u64,
    #[serde(rename = "estimatedCO2")]
    pub estimated_co2: f64,
    pub status: MatchStatus,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub text: TextBlock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentResponse {
    pub messages: Vec<ResponseMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub parameters: JsonValue,
}

/// Fulfillment envelope understood by the conversational agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub fulfillment_response: FulfillmentResponse,
    pub session_info: SessionInfo,
}

impl WebhookResponse {
    pub fn new(text: impl Into<String>, parameters: JsonValue) -> Self {
        Self {
            fulfillment_response: FulfillmentResponse {
                messages: vec![ResponseMessage {
                    text: TextBlock {
                        text: vec![text.into()],
                    },
                }],
            },
            session_info: SessionInfo { parameters },
        }
    }

    /// First reply line, if any
    pub fn text(&self) -> Option<&str> {
        self.fulfillment_response
            .messages
            .first()
            .and_then(|m| m.text.text.first())
            .map(String::as_str)
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            example: None,
            fallback: None,
        }
    }

    pub fn with_example(mut self, example: JsonValue) -> Self {
        self.example = Some(example);
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_envelope_shape() {
        let response = WebhookResponse::new("hello", serde_json::json!({"a": 1}));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["fulfillmentResponse"]["messages"][0]["text"]["text"][0], "hello");
        assert_eq!(json["sessionInfo"]["parameters"]["a"], 1);
        assert_eq!(response.text(), Some("hello"));
    }

    #[test]
    fn test_error_response_omits_empty_fields() {
        let json = serde_json::to_value(ErrorResponse::new("not_found", "gone")).unwrap();
        assert_eq!(json, serde_json::json!({"error": "not_found", "message": "gone"}));
    }

    #[test]
    fn test_create_match_request_camel_case() {
        let request: CreateMatchRequest = serde_json::from_value(serde_json::json!({
            "wasteId": "w001",
            "requirementId": "c001",
            "userInfo": {"name": "Asha", "email": "asha@example.com"},
            "contactPreference": "phone"
        }))
        .unwrap();
        assert_eq!(request.waste_id.as_deref(), Some("w001"));
        assert_eq!(request.user_info.unwrap().email.as_deref(), Some("asha@example.com"));
    }

    #[test]
    fn test_webhook_parameters_default_when_missing() {
        let request: WebhookRequest<MatcherParams> = serde_json::from_str("{}").unwrap();
        assert!(request.parameters.waste_type.is_none());
    }
}
