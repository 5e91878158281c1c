//! REST endpoints for the marketplace assistant and scoring tools
//!
//! This module provides:
//! - a chat endpoint backed by the configured model provider
//! - conversational-agent webhooks for matching, CO2 and pricing
//! - match creation with metrics and notifications

pub mod error;
pub mod handlers;
pub mod models;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use models::{ErrorResponse, WebhookResponse};
pub use server::{ApiConfig, ApiServer};
