use anyhow::{Context, Result};
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    helpers::{format_datetime, parse_activity, parse_datetime, parse_location},
    models::{CheckIn, CheckInInput},
    Database,
};

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn row_to_checkin(row: &Row) -> Result<CheckIn> {
    let location: String = row.get("location")?;
    let activity: String = row.get("activity")?;
    let recorded_at: String = row.get("recorded_at")?;

    Ok(CheckIn {
        date_key: row.get("date_key")?,
        mood: row.get("mood")?,
        stress: row.get("stress")?,
        location: parse_location(&location)?,
        activity: parse_activity(&activity)?,
        perceived_hours: row.get("perceived_hours")?,
        recorded_at: parse_datetime(&recorded_at, "recorded_at")?,
    })
}

impl Database {
    /// Stores today's check-in, replacing an earlier one from the same day.
    pub async fn save_checkin(&self, input: CheckInInput, now: DateTime<Local>) -> Result<CheckIn> {
        input.validate()?;

        let checkin = CheckIn {
            date_key: date_key(now.date_naive()),
            mood: input.mood,
            stress: input.stress,
            location: input.location,
            activity: input.activity,
            perceived_hours: input.perceived_hours,
            recorded_at: now.with_timezone(&Utc),
        };

        let record = checkin.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO daily_checkins (date_key, mood, stress, location, activity, perceived_hours, recorded_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(date_key) DO UPDATE SET
                     mood = excluded.mood,
                     stress = excluded.stress,
                     location = excluded.location,
                     activity = excluded.activity,
                     perceived_hours = excluded.perceived_hours,
                     recorded_at = excluded.recorded_at",
                params![
                    record.date_key,
                    record.mood,
                    record.stress,
                    record.location.as_str(),
                    record.activity.as_str(),
                    record.perceived_hours,
                    format_datetime(&record.recorded_at),
                ],
            )
            .context("failed to save daily check-in")?;
            Ok(())
        })
        .await?;

        Ok(checkin)
    }

    pub async fn today_checkin(&self, now: DateTime<Local>) -> Result<Option<CheckIn>> {
        let key = date_key(now.date_naive());
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT date_key, mood, stress, location, activity, perceived_hours, recorded_at
                 FROM daily_checkins
                 WHERE date_key = ?1",
            )?;

            let checkin = stmt
                .query_row(params![key], |row| Ok(row_to_checkin(row)))
                .optional()?
                .transpose()?;
            Ok(checkin)
        })
        .await
    }

    /// Check-ins from the last `days` calendar days including today, newest first.
    pub async fn checkin_history(&self, days: u32, now: DateTime<Local>) -> Result<Vec<CheckIn>> {
        if days == 0 {
            return Ok(Vec::new());
        }

        let today = now.date_naive();
        let oldest = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(NaiveDate::MIN);
        let (from, to) = (date_key(oldest), date_key(today));

        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT date_key, mood, stress, location, activity, perceived_hours, recorded_at
                 FROM daily_checkins
                 WHERE date_key BETWEEN ?1 AND ?2
                 ORDER BY date_key DESC",
            )?;

            let mut rows = stmt.query(params![from, to])?;
            let mut checkins = Vec::new();
            while let Some(row) = rows.next()? {
                checkins.push(row_to_checkin(row)?);
            }
            Ok(checkins)
        })
        .await
    }

    pub async fn clear_checkins(&self) -> Result<()> {
        self.execute(|conn| {
            conn.execute("DELETE FROM daily_checkins", [])
                .context("failed to clear daily check-ins")?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::models::{CheckInActivity, CheckInLocation};
    use crate::db::test_support::scratch_db;

    fn input(mood: u8) -> CheckInInput {
        CheckInInput {
            mood,
            stress: 4,
            location: CheckInLocation::Home,
            activity: CheckInActivity::Relaxing,
            perceived_hours: Some(2.5),
        }
    }

    #[tokio::test]
    async fn second_checkin_same_day_replaces_first() {
        let (_dir, db) = scratch_db();
        let now = Local::now();
        assert!(db.today_checkin(now).await.unwrap().is_none());

        db.save_checkin(input(3), now).await.unwrap();
        db.save_checkin(input(8), now).await.unwrap();

        let today = db.today_checkin(now).await.unwrap().unwrap();
        assert_eq!(today.mood, 8);
        assert_eq!(today.location, CheckInLocation::Home);
        assert_eq!(today.perceived_hours, Some(2.5));
        assert_eq!(db.checkin_history(7, now).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_out_of_scale_values() {
        let (_dir, db) = scratch_db();
        let now = Local::now();
        assert!(db.save_checkin(input(0), now).await.is_err());
        assert!(db.save_checkin(input(11), now).await.is_err());

        let mut bad_hours = input(5);
        bad_hours.perceived_hours = Some(-1.0);
        assert!(db.save_checkin(bad_hours, now).await.is_err());
    }

    #[tokio::test]
    async fn history_covers_requested_window_newest_first() {
        let (_dir, db) = scratch_db();
        let now = Local::now();
        for days_back in [0, 1, 3, 9] {
            db.save_checkin(input(5), now - Duration::days(days_back))
                .await
                .unwrap();
        }

        let history = db.checkin_history(7, now).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].date_key, date_key(now.date_naive()));
        assert!(history[0].date_key > history[1].date_key);

        db.clear_checkins().await.unwrap();
        assert!(db.checkin_history(30, now).await.unwrap().is_empty());
    }
}
