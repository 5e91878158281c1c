//! DuckDB-backed document store
//!
//! Each marketplace collection is a table. Writes are single-row inserts;
//! nothing spans more than one table. Timestamps are stored as fixed-width
//! RFC 3339 strings so lexical order matches time order.

pub mod market;
pub mod metrics;
pub mod migrations;
pub mod seed;

pub use metrics::MetricsCounter;

use crate::config::catalog::normalize_key;
use crate::types::{
    CementRequirement, ChatLog, ImpactMetric, ListingStatus, Match, MatchStatus, WasteListing,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::types::ToSql;
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to the document store
#[derive(Clone)]
pub struct Persistence {
    conn: Arc<Mutex<Connection>>,
}

impl Persistence {
    /// Open (or create) the database file and apply the schema
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(dir) = db_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).with_context(|| {
                    format!("Failed to create database directory {}", dir.display())
                })?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
        migrations::run(&conn)?;
        tracing::debug!("Opened document store at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("Database connection lock poisoned"))
    }

    // ========== Waste listings ==========

    /// Insert a listing. Returns false when the id already exists.
    pub fn insert_listing(&self, listing: &WasteListing) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT INTO waste_listings
                 (id, material_type, quantity, location, quality_grade, price_per_ton, status, company, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO NOTHING",
                params![
                    listing.id,
                    listing.material_type,
                    listing.quantity,
                    listing.location,
                    listing.quality_grade,
                    listing.price_per_ton,
                    listing.status.as_str(),
                    listing.company,
                    format_ts(&listing.created_at),
                ],
            )
            .context("Failed to insert waste listing")?;
        Ok(changed > 0)
    }

    pub fn get_listing(&self, id: &str) -> Result<Option<WasteListing>> {
        Ok(self
            .query_listings("WHERE id = ?", params![id])?
            .into_iter()
            .next())
    }

    /// Open listings, newest first, optionally restricted to one material
    pub fn list_listings(&self, material: Option<&str>, limit: usize) -> Result<Vec<WasteListing>> {
        let limit = sql_limit(limit);
        match material.map(normalize_key) {
            Some(material) => self.query_listings(
                &format!(
                    "WHERE status IN ('available', 'limited_stock') AND {} = ? \
                     ORDER BY created_at DESC LIMIT ?",
                    normalized_sql("material_type")
                ),
                params![material, limit],
            ),
            None => self.query_listings(
                "WHERE status IN ('available', 'limited_stock') ORDER BY created_at DESC LIMIT ?",
                params![limit],
            ),
        }
    }

    fn query_listings(&self, clause: &str, args: &[&dyn ToSql]) -> Result<Vec<WasteListing>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, material_type, quantity, location, quality_grade, price_per_ton, \
             status, company, created_at FROM waste_listings {clause}"
        ))?;
        let raw = stmt
            .query_map(args, listing_row)?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read waste listings")?;

        raw.into_iter()
            .map(
                |(id, material_type, quantity, location, quality_grade, price_per_ton, status, company, created_at)| {
                    Ok(WasteListing {
                        status: ListingStatus::from_str(&status)
                            .ok_or_else(|| anyhow!("Unknown listing status '{}' on {}", status, id))?,
                        created_at: parse_ts(&created_at)?,
                        id,
                        material_type,
                        quantity,
                        location,
                        quality_grade,
                        price_per_ton,
                        company,
                    })
                },
            )
            .collect()
    }

    // ========== Cement requirements ==========

    /// Insert a requirement. Returns false when the id already exists.
    pub fn insert_requirement(&self, requirement: &CementRequirement) -> Result<bool> {
        let materials = serde_json::to_string(&requirement.materials_needed)?;
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT INTO cement_requirements
                 (id, company, location, materials_needed, capacity, price_offered, urgency, active, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO NOTHING",
                params![
                    requirement.id,
                    requirement.company,
                    requirement.location,
                    materials,
                    requirement.capacity,
                    requirement.price_offered,
                    requirement.urgency,
                    requirement.active,
                    format_ts(&requirement.created_at),
                ],
            )
            .context("Failed to insert cement requirement")?;
        Ok(changed > 0)
    }

    pub fn get_requirement(&self, id: &str) -> Result<Option<CementRequirement>> {
        Ok(self
            .query_requirements("WHERE id = ?", params![id])?
            .into_iter()
            .next())
    }

    /// Active requirements, newest first. With a material, only those whose
    /// materials list contains it.
    pub fn list_requirements(
        &self,
        material: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CementRequirement>> {
        match material {
            // List containment is checked on the decoded JSON array.
            Some(material) => Ok(self
                .query_requirements("WHERE active ORDER BY created_at DESC", params![])?
                .into_iter()
                .filter(|r| r.needs(material))
                .take(limit)
                .collect()),
            None => self.query_requirements(
                "WHERE active ORDER BY created_at DESC LIMIT ?",
                params![sql_limit(limit)],
            ),
        }
    }

    fn query_requirements(&self, clause: &str, args: &[&dyn ToSql]) -> Result<Vec<CementRequirement>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, company, location, materials_needed, capacity, price_offered, \
             urgency, active, created_at FROM cement_requirements {clause}"
        ))?;
        let raw = stmt
            .query_map(args, requirement_row)?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read cement requirements")?;

        raw.into_iter()
            .map(
                |(id, company, location, materials, capacity, price_offered, urgency, active, created_at)| {
                    Ok(CementRequirement {
                        materials_needed: serde_json::from_str(&materials).with_context(|| {
                            format!("Corrupt materials list on requirement {}", id)
                        })?,
                        created_at: parse_ts(&created_at)?,
                        id,
                        company,
                        location,
                        capacity,
                        price_offered,
                        urgency,
                        active,
                    })
                },
            )
            .collect()
    }

    // ========== Matches ==========

    pub fn insert_match(&self, record: &Match) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO matches
             (id, waste_id, requirement_id, score, estimated_revenue, estimated_co2, status,
              contact_name, contact_email, contact_preference, created_at, expires_at, completed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.id,
                record.waste_id,
                record.requirement_id,
                i32::from(record.score),
                i64::try_from(record.estimated_revenue).unwrap_or(i64::MAX),
                record.estimated_co2,
                record.status.as_str(),
                record.contact_name,
                record.contact_email,
                record.contact_preference,
                format_ts(&record.created_at),
                format_ts(&record.expires_at),
                record.completed_at.as_ref().map(format_ts),
            ],
        )
        .context("Failed to insert match")?;
        Ok(())
    }

    pub fn get_match(&self, id: &str) -> Result<Option<Match>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, waste_id, requirement_id, score, estimated_revenue, estimated_co2, status,
                    contact_name, contact_email, contact_preference, created_at, expires_at,
                    completed_at
             FROM matches WHERE id = ?",
        )?;
        let raw = stmt
            .query_map(params![id], |row| {
                Ok((
                    (
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i32>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, f64>(5)?,
                    ),
                    (
                        row.get::<_, String>(6)?,
                        row.get::<_, Option<String>>(7)?,
                        row.get::<_, Option<String>>(8)?,
                        row.get::<_, Option<String>>(9)?,
                        row.get::<_, String>(10)?,
                        row.get::<_, String>(11)?,
                        row.get::<_, Option<String>>(12)?,
                    ),
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read match")?;

        let Some(((id, waste_id, requirement_id, score, revenue, co2), rest)) =
            raw.into_iter().next()
        else {
            return Ok(None);
        };
        let (status, contact_name, contact_email, contact_preference, created_at, expires_at, completed_at) =
            rest;

        Ok(Some(Match {
            status: MatchStatus::from_str(&status)
                .ok_or_else(|| anyhow!("Unknown match status '{}' on {}", status, id))?,
            score: u8::try_from(score).unwrap_or(u8::MAX),
            estimated_revenue: u64::try_from(revenue).unwrap_or(0),
            estimated_co2: co2,
            created_at: parse_ts(&created_at)?,
            expires_at: parse_ts(&expires_at)?,
            completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
            id,
            waste_id,
            requirement_id,
            contact_name,
            contact_email,
            contact_preference,
        }))
    }

    pub fn count_matches_for_listing(&self, waste_id: &str) -> Result<i64> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM matches WHERE waste_id = ?",
            params![waste_id],
            |row| row.get(0),
        )
        .context("Failed to count matches")
    }

    // ========== Append-only logs ==========

    pub fn append_impact_metric(&self, metric: &ImpactMetric) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO impact_metrics (id, waste_type, quantity, co2_saved, carbon_credits_value, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                metric.id,
                metric.waste_type,
                metric.quantity,
                metric.co2_saved,
                i64::try_from(metric.carbon_credits_value).unwrap_or(i64::MAX),
                format_ts(&metric.timestamp),
            ],
        )
        .context("Failed to append impact metric")?;
        Ok(())
    }

    pub fn recent_impact_metrics(&self, limit: usize) -> Result<Vec<ImpactMetric>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, waste_type, quantity, co2_saved, carbon_credits_value, timestamp
             FROM impact_metrics ORDER BY timestamp DESC LIMIT ?",
        )?;
        let raw = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read impact metrics")?;

        raw.into_iter()
            .map(|(id, waste_type, quantity, co2_saved, credits, timestamp)| {
                Ok(ImpactMetric {
                    id,
                    waste_type,
                    quantity,
                    co2_saved,
                    carbon_credits_value: u64::try_from(credits).unwrap_or(0),
                    timestamp: parse_ts(&timestamp)?,
                })
            })
            .collect()
    }

    pub fn append_chat_log(&self, log: &ChatLog) -> Result<()> {
        let context = serde_json::to_string(&log.context)?;
        let suggestions = serde_json::to_string(&log.suggestions)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO chat_logs (id, user_message, ai_response, context, suggestions, timestamp)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                log.id,
                log.user_message,
                log.ai_response,
                context,
                suggestions,
                format_ts(&log.timestamp),
            ],
        )
        .context("Failed to append chat log")?;
        Ok(())
    }

    pub fn recent_chat_logs(&self, limit: usize) -> Result<Vec<ChatLog>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_message, ai_response, context, suggestions, timestamp
             FROM chat_logs ORDER BY timestamp DESC LIMIT ?",
        )?;
        let raw = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read chat logs")?;

        raw.into_iter()
            .map(|(id, user_message, ai_response, context, suggestions, timestamp)| {
                Ok(ChatLog {
                    id,
                    user_message,
                    ai_response,
                    context: serde_json::from_str(&context)?,
                    suggestions: serde_json::from_str(&suggestions)?,
                    timestamp: parse_ts(&timestamp)?,
                })
            })
            .collect()
    }
}

type ListingRow = (String, String, f64, String, String, f64, String, String, String);
type RequirementRow = (String, String, String, String, f64, f64, String, bool, String);

fn listing_row(row: &duckdb::Row<'_>) -> duckdb::Result<ListingRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn requirement_row(row: &duckdb::Row<'_>) -> duckdb::Result<RequirementRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

/// SQL expression applying `normalize_key` to a column
fn normalized_sql(column: &str) -> String {
    format!("replace(replace(lower(trim({column})), ' ', '_'), '-', '_')")
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("Invalid stored timestamp '{}'", raw))
}
