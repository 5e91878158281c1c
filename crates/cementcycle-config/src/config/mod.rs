//! Application configuration
//!
//! Configuration is read from a TOML file and then adjusted by
//! `CEMENTCYCLE_*` environment variables. The file is looked up in order:
//! an explicit path, `$CEMENTCYCLE_CONFIG`, `./cementcycle.toml`, then the
//! platform config directory. Missing files fall back to defaults.

pub mod catalog;

use anyhow::{bail, Context, Result};
use catalog::MaterialCatalog;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "cementcycle.toml";
const KNOWN_PROVIDERS: &[&str] = &["mock", "gemini"];

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: MaterialCatalog,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Document store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let path = ProjectDirs::from("in", "cementcycle", "cementcycle")
            .map(|dirs| dirs.data_dir().join("cementcycle.duckdb"))
            .unwrap_or_else(|| PathBuf::from("cementcycle.duckdb"));
        Self { path }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// `gemini` or `mock`
    pub provider: String,
    pub model_name: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_source: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model_name: None,
            api_key_source: None,
            temperature: 0.7,
            max_output_tokens: 1024,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the first file found, apply env overrides and validate
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_path(explicit) {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::load_from_file(&path)?
            }
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration TOML")
    }

    fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var("CEMENTCYCLE_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Some(local);
        }

        ProjectDirs::from("in", "cementcycle", "cementcycle")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Apply `CEMENTCYCLE_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("CEMENTCYCLE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("CEMENTCYCLE_PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("CEMENTCYCLE_PORT is not a valid port: {}", port))?;
        }
        if let Ok(path) = std::env::var("CEMENTCYCLE_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(provider) = std::env::var("CEMENTCYCLE_MODEL_PROVIDER") {
            self.model.provider = provider;
        }
        if let Ok(model_name) = std::env::var("CEMENTCYCLE_MODEL_NAME") {
            self.model.model_name = Some(model_name);
        }
        if let Ok(level) = std::env::var("CEMENTCYCLE_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let provider = self.model.provider.to_lowercase();
        if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
            bail!(
                "Unknown model provider '{}' (expected one of: {})",
                self.model.provider,
                KNOWN_PROVIDERS.join(", ")
            );
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            bail!(
                "Model temperature must be between 0.0 and 2.0, got {}",
                self.model.temperature
            );
        }
        self.catalog.validate()
    }
}
