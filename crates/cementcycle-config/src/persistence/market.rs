//! Market reference data: price observations, the market outlook and user profiles.

use super::{format_ts, normalized_sql, parse_ts, sql_limit, Persistence};
use crate::config::catalog::normalize_key;
use crate::types::{MarketCondition, MarketIntelligence, PricePoint, UserProfile};
use anyhow::{anyhow, Context, Result};
use duckdb::params;

const CURRENT_MARKET: &str = "current";

type PriceRow = (String, String, f64, String, String, String, String);

fn price_row(row: &duckdb::Row<'_>) -> duckdb::Result<PriceRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn into_price_point(
    (id, material, price_per_ton, region, quality_grade, conditions, timestamp): PriceRow,
) -> Result<PricePoint> {
    Ok(PricePoint {
        market_conditions: MarketCondition::from_str(&conditions)
            .ok_or_else(|| anyhow!("Unknown market condition '{}' on {}", conditions, id))?,
        timestamp: parse_ts(&timestamp)?,
        id,
        material,
        price_per_ton,
        region,
        quality_grade,
    })
}

impl Persistence {
    // ========== Price history ==========

    /// Record a price observation. Returns false when the id already exists.
    pub fn insert_price_point(&self, point: &PricePoint) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT INTO price_history
                 (id, material, price_per_ton, region, quality_grade, market_conditions, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO NOTHING",
                params![
                    point.id,
                    point.material,
                    point.price_per_ton,
                    point.region,
                    point.quality_grade,
                    point.market_conditions.as_str(),
                    format_ts(&point.timestamp),
                ],
            )
            .context("Failed to insert price point")?;
        Ok(changed > 0)
    }

    /// Observations for one material, newest first
    pub fn price_history(&self, material: &str, limit: usize) -> Result<Vec<PricePoint>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, material, price_per_ton, region, quality_grade, market_conditions, timestamp
             FROM price_history WHERE {} = ? ORDER BY timestamp DESC LIMIT ?",
            normalized_sql("material")
        ))?;
        let raw = stmt
            .query_map(params![normalize_key(material), sql_limit(limit)], price_row)?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read price history")?;
        raw.into_iter().map(into_price_point).collect()
    }

    /// The most recent observation of every material, ordered by material
    pub fn latest_prices(&self) -> Result<Vec<PricePoint>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, material, price_per_ton, region, quality_grade, market_conditions, timestamp
             FROM price_history p
             WHERE timestamp = (SELECT MAX(timestamp) FROM price_history q WHERE q.material = p.material)
             ORDER BY material",
        )?;
        let raw = stmt
            .query_map([], price_row)?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read latest prices")?;
        raw.into_iter().map(into_price_point).collect()
    }

    // ========== Market intelligence ==========

    /// Write the market outlook unless one already exists. Returns true when written.
    pub fn init_market_intelligence(&self, market: &MarketIntelligence) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT INTO market_intelligence
                 (id, growth_rate, market_sentiment, demand_level, supply_constraints, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO NOTHING",
                params![
                    CURRENT_MARKET,
                    market.growth_rate,
                    market.market_sentiment,
                    market.demand_level,
                    market.supply_constraints,
                    format_ts(&market.updated_at),
                ],
            )
            .context("Failed to initialise market intelligence")?;
        Ok(changed > 0)
    }

    pub fn market_intelligence(&self) -> Result<Option<MarketIntelligence>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT growth_rate, market_sentiment, demand_level, supply_constraints, updated_at
             FROM market_intelligence WHERE id = ?",
        )?;
        let raw = stmt
            .query_map(params![CURRENT_MARKET], |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read market intelligence")?;

        raw.into_iter()
            .next()
            .map(|(growth_rate, market_sentiment, demand_level, supply_constraints, updated_at)| {
                Ok(MarketIntelligence {
                    growth_rate,
                    market_sentiment,
                    demand_level,
                    supply_constraints,
                    updated_at: parse_ts(&updated_at)?,
                })
            })
            .transpose()
    }

    // ========== Users ==========

    /// Insert a user profile. Returns false when the id already exists.
    pub fn insert_user(&self, user: &UserProfile) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT INTO users
                 (id, email, name, role, company, phone, location, verification_status, joined_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO NOTHING",
                params![
                    user.id,
                    user.email,
                    user.name,
                    user.role,
                    user.company,
                    user.phone,
                    user.location,
                    user.verification_status,
                    format_ts(&user.joined_at),
                ],
            )
            .context("Failed to insert user")?;
        Ok(changed > 0)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<UserProfile>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, email, name, role, company, phone, location, verification_status, joined_at
             FROM users WHERE id = ?",
        )?;
        let raw = stmt
            .query_map(params![id], |row| {
                Ok((
                    (
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ),
                    (
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                    ),
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read user")?;

        raw.into_iter()
            .next()
            .map(
                |((id, email, name, role, company), (phone, location, verification_status, joined_at))| {
                    Ok(UserProfile {
                        joined_at: parse_ts(&joined_at)?,
                        id,
                        email,
                        name,
                        role,
                        company,
                        phone,
                        location,
                        verification_status,
                    })
                },
            )
            .transpose()
    }
}
