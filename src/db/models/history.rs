use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::intervention::Intervention;

/// One presented wellness break and how the user answered it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub intervention_name: String,
    pub duration_minutes: u32,
    pub completed: bool,
}

impl HistoryEntry {
    pub fn new(intervention: &Intervention, completed: bool, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp,
            intervention_name: intervention.name.to_string(),
            duration_minutes: intervention.duration_minutes,
            completed,
        }
    }
}

/// Break counts for the current local day.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodayStats {
    pub completed: u32,
    pub skipped: u32,
    pub total: u32,
}
