//! Daily mood check-in models.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SCALE: std::ops::RangeInclusive<u8> = 1..=10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckInLocation {
    Home,
    Work,
    Transit,
    Other,
}

impl CheckInLocation {
    pub const ALL: [CheckInLocation; 4] = [
        CheckInLocation::Home,
        CheckInLocation::Work,
        CheckInLocation::Transit,
        CheckInLocation::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInLocation::Home => "Home",
            CheckInLocation::Work => "Work",
            CheckInLocation::Transit => "Transit",
            CheckInLocation::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CheckInActivity {
    Working,
    Socializing,
    Relaxing,
    Other,
}

impl CheckInActivity {
    pub const ALL: [CheckInActivity; 4] = [
        CheckInActivity::Working,
        CheckInActivity::Socializing,
        CheckInActivity::Relaxing,
        CheckInActivity::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInActivity::Working => "Working",
            CheckInActivity::Socializing => "Socializing",
            CheckInActivity::Relaxing => "Relaxing",
            CheckInActivity::Other => "Other",
        }
    }
}

/// What the user submits from the check-in form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckInInput {
    /// 1 (low) to 10 (great).
    pub mood: u8,
    /// 1 (calm) to 10 (overwhelmed).
    pub stress: u8,
    pub location: CheckInLocation,
    pub activity: CheckInActivity,
    /// Self-estimated hours of social media today.
    pub perceived_hours: Option<f64>,
}

impl CheckInInput {
    pub fn validate(&self) -> Result<()> {
        if !SCALE.contains(&self.mood) {
            bail!("mood must be between 1 and 10, got {}", self.mood);
        }
        if !SCALE.contains(&self.stress) {
            bail!("stress must be between 1 and 10, got {}", self.stress);
        }
        if let Some(hours) = self.perceived_hours {
            if !hours.is_finite() || !(0.0..=24.0).contains(&hours) {
                bail!("perceived hours must be between 0 and 24, got {hours}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckIn {
    /// Local calendar day, `YYYY-MM-DD`.
    pub date_key: String,
    pub mood: u8,
    pub stress: u8,
    pub location: CheckInLocation,
    pub activity: CheckInActivity,
    pub perceived_hours: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}
