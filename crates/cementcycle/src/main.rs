//! cementcycle command line
//!
//! `serve` runs the HTTP API, `seed` loads demo marketplace data and `quote`
//! prints scoring results for a single lot without touching the database.

use anyhow::{Context, Result};
use cementcycle_api::api::{ApiConfig, ApiServer, AppState};
use cementcycle_config::{AppConfig, Persistence};
use cementcycle_core::assistant::create_provider;
use cementcycle_core::ScoringEngine;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cementcycle", version, about = "Industrial waste to cement plant marketplace")]
struct Cli {
    /// Path to a config.toml (defaults to CEMENTCYCLE_CONFIG, ./cementcycle.toml, then the user config dir)
    #[arg(long, global = true, env = "CEMENTCYCLE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Load the sample listings, requirements and metrics
    Seed,
    /// Price a lot and estimate its CO2 impact
    Quote {
        material: String,
        quantity: f64,
        #[arg(long)]
        grade: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Destination city for a logistics estimate
        #[arg(long)]
        to: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("cementcycle error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging.level)?;

    match cli.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Seed => seed(&config),
        Command::Quote {
            material,
            quantity,
            grade,
            location,
            to,
        } => quote(&config, &material, quantity, grade.as_deref(), location.as_deref(), to.as_deref()),
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

async fn serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    let persistence = Persistence::new(&config.database.path)
        .with_context(|| format!("Failed to open database {}", config.database.path.display()))?;
    let latest = persistence.latest_prices()?;
    let updated = config.catalog.apply_observed_prices(&latest);
    tracing::info!(updated, observations = latest.len(), "Derived price trends from price history");
    let provider = create_provider(&config.model)?;

    let mut api_config = ApiConfig::from(&config.server);
    if let Some(host) = host {
        api_config = api_config.with_host(host);
    }
    if let Some(port) = port {
        api_config = api_config.with_port(port);
    }

    let state = AppState::new(persistence, provider, config);
    ApiServer::new(api_config, state)
        .run_with_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

fn seed(config: &AppConfig) -> Result<()> {
    let persistence = Persistence::new(&config.database.path)?;
    let report = persistence.seed_sample_data(&config.catalog)?;
    println!(
        "Seeded {} listings, {} requirements, {} matches, {} users and {} price points into {}{}",
        report.listings,
        report.requirements,
        report.matches,
        report.users,
        report.price_points,
        config.database.path.display(),
        if report.metrics_initialized {
            " (metrics initialised)"
        } else {
            ""
        }
    );
    Ok(())
}

fn quote(
    config: &AppConfig,
    material: &str,
    quantity: f64,
    grade: Option<&str>,
    location: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        anyhow::bail!("quantity must be a positive number of tonnes, got {}", quantity);
    }
    let engine = ScoringEngine::new(config.catalog.clone());

    let logistics = match (location, to) {
        (Some(from), Some(to)) => {
            let distance = engine.distance(from, to)?;
            Some(json!({
                "from": from,
                "to": to,
                "distanceKm": (distance * 10.0).round() / 10.0,
                "cost": engine.logistics_cost(distance, quantity),
            }))
        }
        (None, Some(_)) => anyhow::bail!("--to requires --location"),
        _ => None,
    };

    let output = json!({
        "pricing": engine.dynamic_price(material, location, Some(quantity), grade),
        "impact": engine.co2_impact(material, quantity),
        "logistics": logistics,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
