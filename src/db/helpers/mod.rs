use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::assessment::RiskLevel;
use crate::db::models::{CheckInActivity, CheckInLocation};

pub fn to_i64(value: u64) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

pub fn to_u32(value: i64, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{field} contains out-of-range value {value}"))
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_risk_level(value: &str) -> Result<RiskLevel> {
    match value {
        "Low" => Ok(RiskLevel::Low),
        "Moderate" => Ok(RiskLevel::Moderate),
        "High" => Ok(RiskLevel::High),
        other => Err(anyhow!("unknown risk level {other}")),
    }
}

pub fn parse_location(value: &str) -> Result<CheckInLocation> {
    match value {
        "Home" => Ok(CheckInLocation::Home),
        "Work" => Ok(CheckInLocation::Work),
        "Transit" => Ok(CheckInLocation::Transit),
        "Other" => Ok(CheckInLocation::Other),
        other => Err(anyhow!("unknown check-in location {other}")),
    }
}

pub fn parse_activity(value: &str) -> Result<CheckInActivity> {
    match value {
        "Working" => Ok(CheckInActivity::Working),
        "Socializing" => Ok(CheckInActivity::Socializing),
        "Relaxing" => Ok(CheckInActivity::Relaxing),
        "Other" => Ok(CheckInActivity::Other),
        other => Err(anyhow!("unknown check-in activity {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enum_parsers_accept_their_own_labels() {
        for level in [RiskLevel::Low, RiskLevel::Moderate, RiskLevel::High] {
            assert_eq!(parse_risk_level(level.as_str()).unwrap(), level);
        }
        for location in CheckInLocation::ALL {
            assert_eq!(parse_location(location.as_str()).unwrap(), location);
        }
        for activity in CheckInActivity::ALL {
            assert_eq!(parse_activity(activity.as_str()).unwrap(), activity);
        }
        assert!(parse_risk_level("Severe").is_err());
    }

    #[test]
    fn integer_conversions_reject_out_of_range() {
        assert!(to_i64(u64::MAX).is_err());
        assert!(to_u32(-1, "duration_minutes").is_err());
        assert_eq!(to_u32(42, "duration_minutes").unwrap(), 42);
    }

    #[test]
    fn formatted_timestamps_sort_chronologically() {
        let earlier = parse_datetime("2026-10-18T09:59:59.5Z", "t").unwrap();
        let later = parse_datetime("2026-10-18T10:00:00Z", "t").unwrap();
        assert!(format_datetime(&earlier) < format_datetime(&later));
        assert_eq!(format_datetime(&later), "2026-10-18T10:00:00.000Z");
    }

    #[test]
    fn parse_datetime_names_the_field_on_failure() {
        let err = parse_datetime("yesterday", "timestamp").unwrap_err();
        assert!(err.to_string().contains("timestamp"));
    }
}
