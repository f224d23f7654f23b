use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use rusqlite::{params, Row};

use crate::db::{
    helpers::{format_datetime, parse_datetime, to_i64, to_u32},
    models::{HistoryEntry, TodayStats},
    Database,
};

fn row_to_entry(row: &Row) -> Result<HistoryEntry> {
    let timestamp: String = row.get("timestamp")?;
    let duration_minutes: i64 = row.get("duration_minutes")?;

    Ok(HistoryEntry {
        id: row.get("id")?,
        timestamp: parse_datetime(&timestamp, "timestamp")?,
        intervention_name: row.get("intervention_name")?,
        duration_minutes: to_u32(duration_minutes, "duration_minutes")?,
        completed: row.get("completed")?,
    })
}

/// Start of the local calendar day containing `now`, in UTC.
fn local_day_start(now: DateTime<Local>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|start| start.with_timezone(&Utc))
        .unwrap_or_else(|| now.with_timezone(&Utc))
}

impl Database {
    /// Inserts `entry` and evicts the oldest rows beyond `capacity`.
    pub async fn append_history(&self, entry: &HistoryEntry, capacity: usize) -> Result<()> {
        let record = entry.clone();
        let capacity = to_i64(capacity as u64)?;
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO history (id, timestamp, intervention_name, duration_minutes, completed)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    format_datetime(&record.timestamp),
                    record.intervention_name,
                    record.duration_minutes,
                    record.completed,
                ],
            )
            .context("failed to insert history entry")?;

            tx.execute(
                "DELETE FROM history
                 WHERE id NOT IN (
                     SELECT id FROM history
                     ORDER BY timestamp DESC, rowid DESC
                     LIMIT ?1
                 )",
                params![capacity],
            )
            .context("failed to evict old history entries")?;

            tx.commit()?;
            Ok(())
        })
        .await
    }

    /// Most recent entries first.
    pub async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        let limit = to_i64(limit as u64)?;
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, timestamp, intervention_name, duration_minutes, completed
                 FROM history
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?1",
            )?;

            let mut rows = stmt.query(params![limit])?;
            let mut entries = Vec::new();
            while let Some(row) = rows.next()? {
                entries.push(row_to_entry(row)?);
            }
            Ok(entries)
        })
        .await
    }

    pub async fn today_stats(&self, now: DateTime<Local>) -> Result<TodayStats> {
        let day_start = format_datetime(&local_day_start(now));
        self.execute(move |conn| {
            let (completed, total): (i64, i64) = conn.query_row(
                "SELECT COALESCE(SUM(completed), 0), COUNT(*)
                 FROM history
                 WHERE timestamp >= ?1",
                params![day_start],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            let completed = to_u32(completed, "completed")?;
            let total = to_u32(total, "total")?;
            Ok(TodayStats {
                completed,
                skipped: total.saturating_sub(completed),
                total,
            })
        })
        .await
    }

    pub async fn clear_history(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM history", [])
                .context("failed to clear history")?;
            Ok(())
        })
        .await
    }
}
