use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::warn;
use rusqlite::{params, OptionalExtension, Row};

use crate::{
    assessment::{self, RiskLevel, MAX_SCORE, MIN_SCORE},
    db::{
        helpers::{format_datetime, parse_datetime, parse_risk_level},
        models::Profile,
        Database,
    },
    timer::clamp_limit_minutes,
};

struct ProfileRow {
    bsmas_score: i64,
    risk_level: String,
    hourly_limit: i64,
    created_at: String,
}

fn read_row(row: &Row) -> Result<ProfileRow, rusqlite::Error> {
    Ok(ProfileRow {
        bsmas_score: row.get("bsmas_score")?,
        risk_level: row.get("risk_level")?,
        hourly_limit: row.get("hourly_limit")?,
        created_at: row.get("created_at")?,
    })
}

/// Turns a stored row into a profile, or `None` when the row cannot be trusted.
/// An out-of-range hourly limit is clamped rather than rejected.
fn validate_row(row: ProfileRow) -> Option<Profile> {
    let score = u8::try_from(row.bsmas_score)
        .ok()
        .filter(|score| (MIN_SCORE..=MAX_SCORE).contains(score))?;
    let risk_level = parse_risk_level(&row.risk_level).ok()?;
    let hourly_limit = clamp_limit_minutes(row.hourly_limit.clamp(0, u32::MAX as i64) as u32);
    let created_at = parse_datetime(&row.created_at, "created_at").unwrap_or_else(|_| Utc::now());

    Some(Profile {
        bsmas_score: score,
        risk_level,
        hourly_limit,
        created_at,
    })
}

impl Profile {
    /// Scores the questionnaire and builds a fresh profile.
    pub fn from_answers(answers: &[u8], hourly_limit: u32, now: DateTime<Utc>) -> Result<Self> {
        let bsmas_score = assessment::score(answers)?;
        Ok(Self {
            bsmas_score,
            risk_level: RiskLevel::from_score(bsmas_score),
            hourly_limit: clamp_limit_minutes(hourly_limit),
            created_at: now,
        })
    }
}

impl Database {
    pub async fn save_profile(&self, profile: &Profile) -> Result<()> {
        let record = profile.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO profile (id, bsmas_score, risk_level, hourly_limit, created_at)
                 VALUES (1, ?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     bsmas_score = excluded.bsmas_score,
                     risk_level = excluded.risk_level,
                     hourly_limit = excluded.hourly_limit,
                     created_at = excluded.created_at",
                params![
                    record.bsmas_score,
                    record.risk_level.as_str(),
                    record.hourly_limit,
                    format_datetime(&record.created_at),
                ],
            )
            .context("failed to save profile")?;
            Ok(())
        })
        .await
    }

    /// Loads the profile. A missing or invalid row yields `None`.
    pub async fn load_profile(&self) -> Result<Option<Profile>> {
        let row = self
            .execute(|conn| {
                let row = conn
                    .query_row(
                        "SELECT bsmas_score, risk_level, hourly_limit, created_at
                         FROM profile
                         WHERE id = 1",
                        [],
                        read_row,
                    )
                    .optional()
                    .context("failed to load profile")?;
                Ok(row)
            })
            .await?;

        Ok(row.and_then(|row| {
            let profile = validate_row(row);
            if profile.is_none() {
                warn!("Stored profile failed validation; treating as absent");
            }
            profile
        }))
    }

    pub async fn update_hourly_limit(&self, minutes: u32) -> Result<Profile> {
        let mut profile = self
            .load_profile()
            .await?
            .ok_or_else(|| anyhow!("no profile to update"))?;
        profile.hourly_limit = clamp_limit_minutes(minutes);
        self.save_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn clear_profile(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM profile", [])
                .context("failed to clear profile")?;
            Ok(())
        })
        .await
    }
}
