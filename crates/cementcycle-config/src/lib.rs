pub mod config;
pub mod persistence;
pub mod types;

pub use config::catalog::{City, GradeProfile, MaterialCatalog, MaterialProfile, PricingPolicy, QualityGrade};
pub use config::{AppConfig, DatabaseConfig, LoggingConfig, ModelConfig, ServerConfig};
pub use persistence::{MetricsCounter, Persistence};
