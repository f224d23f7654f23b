//! Plain string key/value pairs.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::{helpers::format_datetime, Database};

impl Database {
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()
                .with_context(|| format!("failed to read key {key}"))?;
            Ok(value)
        })
        .await
    }

    /// Reads several keys in one round trip; missing keys come back as `None`.
    pub async fn get_values(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        self.execute(move |conn| {
            let mut stmt = conn.prepare("SELECT value FROM kv_store WHERE key = ?1")?;
            let mut values = Vec::with_capacity(keys.len());
            for key in &keys {
                let value = stmt
                    .query_row(params![key], |row| row.get(0))
                    .optional()
                    .with_context(|| format!("failed to read key {key}"))?;
                values.push(value);
            }
            Ok(values)
        })
        .await
    }

    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.set_values(vec![(key.to_string(), value.to_string())])
            .await
    }

    /// Writes all pairs atomically.
    pub async fn set_values(&self, pairs: Vec<(String, String)>) -> Result<()> {
        self.execute(move |conn| {
            let now = format_datetime(&Utc::now());
            let tx = conn.transaction()?;
            for (key, value) in &pairs {
                tx.execute(
                    "INSERT INTO kv_store (key, value, updated_at)
                     VALUES (?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET
                         value = excluded.value,
                         updated_at = excluded.updated_at",
                    params![key, value, now],
                )
                .with_context(|| format!("failed to write key {key}"))?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }

    pub async fn remove_values(&self, keys: &[&str]) -> Result<()> {
        let keys: Vec<String> = keys.iter().map(|key| key.to_string()).collect();
        self.execute(move |conn| {
            let tx = conn.transaction()?;
            for key in &keys {
                tx.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
    }
}
