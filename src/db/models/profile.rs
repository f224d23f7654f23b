use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::assessment::RiskLevel;

/// Outcome of onboarding plus the user's chosen hourly budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub bsmas_score: u8,
    pub risk_level: RiskLevel,
    /// Minutes of foreground use allowed per clock hour.
    pub hourly_limit: u32,
    pub created_at: DateTime<Utc>,
}
