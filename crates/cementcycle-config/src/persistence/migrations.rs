use anyhow::{Context, Result};
use duckdb::Connection;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS waste_listings (
    id VARCHAR PRIMARY KEY,
    material_type VARCHAR NOT NULL,
    quantity DOUBLE NOT NULL,
    location VARCHAR NOT NULL,
    quality_grade VARCHAR NOT NULL,
    price_per_ton DOUBLE NOT NULL,
    status VARCHAR NOT NULL,
    company VARCHAR NOT NULL,
    created_at VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS cement_requirements (
    id VARCHAR PRIMARY KEY,
    company VARCHAR NOT NULL,
    location VARCHAR NOT NULL,
    materials_needed VARCHAR NOT NULL,
    capacity DOUBLE NOT NULL,
    price_offered DOUBLE NOT NULL,
    urgency VARCHAR NOT NULL,
    active BOOLEAN NOT NULL,
    created_at VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    id VARCHAR PRIMARY KEY,
    waste_id VARCHAR NOT NULL,
    requirement_id VARCHAR NOT NULL,
    score INTEGER NOT NULL,
    estimated_revenue BIGINT NOT NULL,
    estimated_co2 DOUBLE NOT NULL,
    status VARCHAR NOT NULL,
    contact_name VARCHAR,
    contact_email VARCHAR,
    contact_preference VARCHAR,
    created_at VARCHAR NOT NULL,
    expires_at VARCHAR NOT NULL,
    completed_at VARCHAR
);

ALTER TABLE matches ADD COLUMN IF NOT EXISTS completed_at VARCHAR;

CREATE TABLE IF NOT EXISTS impact_metrics (
    id VARCHAR PRIMARY KEY,
    waste_type VARCHAR NOT NULL,
    quantity DOUBLE NOT NULL,
    co2_saved DOUBLE NOT NULL,
    carbon_credits_value BIGINT NOT NULL,
    timestamp VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS chat_logs (
    id VARCHAR PRIMARY KEY,
    user_message VARCHAR NOT NULL,
    ai_response VARCHAR NOT NULL,
    context VARCHAR NOT NULL,
    suggestions VARCHAR NOT NULL,
    timestamp VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS platform_metrics (
    id VARCHAR PRIMARY KEY,
    total_co2_saved DOUBLE NOT NULL,
    total_waste_processed DOUBLE NOT NULL,
    total_revenue_generated DOUBLE NOT NULL,
    total_matches_created BIGINT NOT NULL,
    updated_at VARCHAR
);

CREATE TABLE IF NOT EXISTS price_history (
    id VARCHAR PRIMARY KEY,
    material VARCHAR NOT NULL,
    price_per_ton DOUBLE NOT NULL,
    region VARCHAR NOT NULL,
    quality_grade VARCHAR NOT NULL,
    market_conditions VARCHAR NOT NULL,
    timestamp VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS market_intelligence (
    id VARCHAR PRIMARY KEY,
    growth_rate DOUBLE NOT NULL,
    market_sentiment VARCHAR NOT NULL,
    demand_level VARCHAR NOT NULL,
    supply_constraints VARCHAR NOT NULL,
    updated_at VARCHAR NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    id VARCHAR PRIMARY KEY,
    email VARCHAR NOT NULL,
    name VARCHAR NOT NULL,
    role VARCHAR NOT NULL,
    company VARCHAR NOT NULL,
    phone VARCHAR,
    location VARCHAR NOT NULL,
    verification_status VARCHAR NOT NULL,
    joined_at VARCHAR NOT NULL
);
"#;

/// Create all tables. Safe to run on every startup.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Failed to apply database schema")
}
