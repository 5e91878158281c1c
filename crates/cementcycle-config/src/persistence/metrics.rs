//! Platform-wide cumulative counters.
//!
//! The totals live in one row (`id = 'current'`). Callers never read-modify-write
//! it themselves; they hand a [`MetricsDelta`] to [`MetricsCounter::increment`].

use super::{format_ts, parse_ts, Persistence};
use crate::types::{MetricsDelta, PlatformMetrics};
use anyhow::{Context, Result};
use chrono::Utc;
use duckdb::params;

const CURRENT_ROW: &str = "current";

/// Increment contract for the platform totals
pub trait MetricsCounter: Send + Sync {
    /// Current totals. All zero when nothing has been recorded.
    fn current(&self) -> Result<PlatformMetrics>;

    /// Add every field of `delta` to the totals and return the new totals.
    fn increment(&self, delta: &MetricsDelta) -> Result<PlatformMetrics>;
}

impl Persistence {
    /// Write an initial snapshot unless one already exists. Returns true when written.
    pub fn init_metrics(&self, snapshot: &PlatformMetrics) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT INTO platform_metrics
                 (id, total_co2_saved, total_waste_processed, total_revenue_generated, total_matches_created, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT (id) DO NOTHING",
                params![
                    CURRENT_ROW,
                    snapshot.total_co2_saved,
                    snapshot.total_waste_processed,
                    snapshot.total_revenue_generated,
                    snapshot.total_matches_created,
                    format_ts(&snapshot.updated_at.unwrap_or_else(Utc::now)),
                ],
            )
            .context("Failed to initialise platform metrics")?;
        Ok(changed > 0)
    }

    fn read_metrics(conn: &duckdb::Connection) -> Result<PlatformMetrics> {
        let mut stmt = conn.prepare(
            "SELECT total_co2_saved, total_waste_processed, total_revenue_generated,
                    total_matches_created, updated_at
             FROM platform_metrics WHERE id = ?",
        )?;
        let rows = stmt
            .query_map(params![CURRENT_ROW], |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<duckdb::Result<Vec<_>>>()
            .context("Failed to read platform metrics")?;

        match rows.into_iter().next() {
            Some((co2, waste, revenue, matches, updated_at)) => Ok(PlatformMetrics {
                total_co2_saved: co2,
                total_waste_processed: waste,
                total_revenue_generated: revenue,
                total_matches_created: matches,
                updated_at: updated_at.as_deref().map(parse_ts).transpose()?,
            }),
            None => Ok(PlatformMetrics::default()),
        }
    }
}

impl MetricsCounter for Persistence {
    fn current(&self) -> Result<PlatformMetrics> {
        let conn = self.conn()?;
        Self::read_metrics(&conn)
    }

    fn increment(&self, delta: &MetricsDelta) -> Result<PlatformMetrics> {
        // The connection lock is held across insert, update and read.
        let conn = self.conn()?;
        let now = format_ts(&Utc::now());
        conn.execute(
            "INSERT INTO platform_metrics
             (id, total_co2_saved, total_waste_processed, total_revenue_generated, total_matches_created, updated_at)
             VALUES (?, 0, 0, 0, 0, ?)
             ON CONFLICT (id) DO NOTHING",
            params![CURRENT_ROW, now],
        )
        .context("Failed to create platform metrics row")?;
        conn.execute(
            "UPDATE platform_metrics SET
                total_co2_saved = total_co2_saved + ?,
                total_waste_processed = total_waste_processed + ?,
                total_revenue_generated = total_revenue_generated + ?,
                total_matches_created = total_matches_created + ?,
                updated_at = ?
             WHERE id = ?",
            params![
                delta.co2_saved,
                delta.waste_processed,
                delta.revenue_generated,
                delta.matches_created,
                now,
                CURRENT_ROW,
            ],
        )
        .context("Failed to increment platform metrics")?;

        let totals = Self::read_metrics(&conn)?;
        tracing::debug!(
            matches = totals.total_matches_created,
            co2 = totals.total_co2_saved,
            "Platform metrics incremented"
        );
        Ok(totals)
    }
}
