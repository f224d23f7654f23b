//! Durable snapshot of the hourly counter.
//!
//! Two string keys hold the seconds used this hour and the hour they belong
//! to. Reads are sanitized here so the engine never sees a corrupt value:
//! anything unparseable collapses to "no prior usage".

use std::future::Future;

use anyhow::Result;

use crate::db::Database;

use super::state::SECONDS_PER_HOUR;

pub const HOURLY_USED_KEY: &str = "hourly_used_seconds";
pub const HOURLY_START_HOUR_KEY: &str = "hourly_start_hour";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PersistedTimer {
    pub hourly_used_seconds: u32,
    pub saved_hour: Option<u32>,
}

/// Persistence seam for the usage timer.
///
/// Implementations report I/O failures as errors; the engine logs them and
/// carries on with its in-memory state.
pub trait TimerStore: Send + Sync + 'static {
    fn load(&self) -> impl Future<Output = Result<PersistedTimer>> + Send;

    fn save(&self, hourly_used_seconds: u32, hour: u32) -> impl Future<Output = Result<()>> + Send;

    /// Removes the snapshot entirely. Used by full app reset.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Parses stored seconds; absent, non-numeric or out-of-range values
/// (negative or more than one hour) read as 0.
pub fn sanitize_hourly_used(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|seconds| *seconds <= SECONDS_PER_HOUR)
        .unwrap_or(0)
}

/// Parses a stored hour; anything outside 0-23 reads as absent.
pub fn sanitize_stored_hour(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|hour| *hour <= 23)
}

/// Timer snapshot kept in the SQLite key/value table.
#[derive(Clone)]
pub struct SqliteTimerStore {
    db: Database,
}

impl SqliteTimerStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl TimerStore for SqliteTimerStore {
    async fn load(&self) -> Result<PersistedTimer> {
        let values = self
            .db
            .get_values(&[HOURLY_USED_KEY, HOURLY_START_HOUR_KEY])
            .await?;
        let (used, hour) = match values.as_slice() {
            [used, hour] => (used.as_deref(), hour.as_deref()),
            _ => (None, None),
        };

        Ok(PersistedTimer {
            hourly_used_seconds: sanitize_hourly_used(used),
            saved_hour: sanitize_stored_hour(hour),
        })
    }

    async fn save(&self, hourly_used_seconds: u32, hour: u32) -> Result<()> {
        self.db
            .set_values(vec![
                (HOURLY_USED_KEY.to_string(), hourly_used_seconds.to_string()),
                (HOURLY_START_HOUR_KEY.to_string(), hour.to_string()),
            ])
            .await
    }

    async fn clear(&self) -> Result<()> {
        self.db
            .remove_values(&[HOURLY_USED_KEY, HOURLY_START_HOUR_KEY])
            .await
    }
}
