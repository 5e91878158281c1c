pub mod assistant;
pub mod error;
pub mod notify;
pub mod scoring;

pub use cementcycle_config::{config, persistence, types};
pub use error::ScoringError;
pub use scoring::ScoringEngine;
