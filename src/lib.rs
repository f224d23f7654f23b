//! Hourly screen-time budget with wellness breaks.
//!
//! [`Beo`] wires the usage timer, the intervention coordinator and the app
//! lifecycle bridge to one on-device SQLite database. Hosts drive it by
//! reporting [`AppPhase`] changes and dashboard visibility, and by answering
//! the breaks it publishes.

pub mod assessment;
pub mod db;
pub mod intervention;
pub mod lifecycle;
pub mod settings;
pub mod timer;
mod utils;

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use log::{info, warn};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

pub use db::{
    CheckIn, CheckInActivity, CheckInInput, CheckInLocation, Database, HistoryEntry, Profile,
    TodayStats,
};
pub use intervention::{ActiveBreak, BreakOutcome, Intervention, InterventionCoordinator};
pub use lifecycle::{AppPhase, LifecycleBridge};
pub use settings::{SettingsStore, UserSettings};
pub use timer::{Clock, SqliteTimerStore, SystemClock, TimerSnapshot, UsageTimer};

pub const DATABASE_FILE_NAME: &str = "beo.sqlite3";
const LIFECYCLE_QUEUE_DEPTH: usize = 16;

/// Installs `env_logger`, reading `RUST_LOG` and defaulting to `info`.
/// Safe to call more than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

pub struct Beo {
    db: Database,
    settings: SettingsStore,
    timer: UsageTimer<SqliteTimerStore>,
    coordinator: InterventionCoordinator<SqliteTimerStore>,
    lifecycle: mpsc::Sender<AppPhase>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Beo {
    /// Opens (or creates) the app data in `data_dir` and starts the
    /// background loops. The timer stays stopped until the dashboard is shown.
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_clock(data_dir, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(data_dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let db = Database::new(data_dir.join(DATABASE_FILE_NAME))?;
        let settings = SettingsStore::open(data_dir)?;

        let limit_minutes = match db.load_profile().await? {
            Some(profile) => profile.hourly_limit,
            None => settings.default_limit_minutes(),
        };

        let (timer, events) = UsageTimer::new(
            SqliteTimerStore::new(db.clone()),
            clock,
            settings.timer_config(),
        );
        let restored = timer.initialize(limit_minutes).await;
        info!(
            "Beo ready: {}s used this hour, limit {}m",
            restored.hourly_used_seconds, restored.limit_minutes
        );

        let coordinator =
            InterventionCoordinator::new(timer.clone(), db.clone(), settings.history_capacity());

        let cancel = CancellationToken::new();
        let (lifecycle, phases) = mpsc::channel(LIFECYCLE_QUEUE_DEPTH);
        let tasks = vec![
            coordinator.spawn(events, cancel.clone()),
            LifecycleBridge::new(coordinator.clone()).spawn(phases, cancel.clone()),
        ];

        Ok(Self {
            db,
            settings,
            timer,
            coordinator,
            lifecycle,
            cancel,
            tasks,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn timer(&self) -> &UsageTimer<SqliteTimerStore> {
        &self.timer
    }

    /// Where the host reports foreground/background transitions.
    pub fn lifecycle(&self) -> mpsc::Sender<AppPhase> {
        self.lifecycle.clone()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.timer.snapshot().await
    }

    pub async fn profile(&self) -> Result<Option<Profile>> {
        self.db.load_profile().await
    }

    /// Scores the questionnaire, stores the profile and applies its limit.
    pub async fn create_profile(&self, answers: &[u8], hourly_limit: u32) -> Result<Profile> {
        let profile = Profile::from_answers(answers, hourly_limit, Utc::now())?;
        self.db.save_profile(&profile).await?;
        self.timer.set_limit_minutes(profile.hourly_limit).await;
        info!(
            "Profile created: score {} ({}), limit {}m",
            profile.bsmas_score,
            profile.risk_level.as_str(),
            profile.hourly_limit
        );
        Ok(profile)
    }

    pub async fn update_hourly_limit(&self, minutes: u32) -> Result<Profile> {
        let profile = self.db.update_hourly_limit(minutes).await?;
        self.timer.set_limit_minutes(profile.hourly_limit).await;
        Ok(profile)
    }

    pub async fn set_dashboard_active(&self, active: bool) {
        self.coordinator.set_screen_active(active).await;
    }

    pub fn active_break(&self) -> Option<ActiveBreak> {
        self.coordinator.active_break()
    }

    pub fn subscribe_breaks(&self) -> watch::Receiver<Option<ActiveBreak>> {
        self.coordinator.subscribe()
    }

    pub async fn respond_to_break(&self, outcome: BreakOutcome) -> Option<HistoryEntry> {
        self.coordinator.respond(outcome).await
    }

    pub async fn recent_history(&self, limit: usize) -> Result<Vec<HistoryEntry>> {
        self.db.recent_history(limit).await
    }

    pub async fn today_stats(&self) -> Result<TodayStats> {
        self.db.today_stats(Local::now()).await
    }

    pub async fn save_checkin(&self, input: CheckInInput) -> Result<CheckIn> {
        self.db.save_checkin(input, Local::now()).await
    }

    pub async fn today_checkin(&self) -> Result<Option<CheckIn>> {
        self.db.today_checkin(Local::now()).await
    }

    pub async fn checkin_history(&self, days: u32) -> Result<Vec<CheckIn>> {
        self.db.checkin_history(days, Local::now()).await
    }

    /// Wipes every piece of user data and returns the timer to a stopped,
    /// zeroed state at the default limit.
    pub async fn reset(&self) -> Result<()> {
        self.timer.stop().await;
        if self.coordinator.dismiss().await.is_some() {
            warn!("Active break dismissed by reset");
        }
        self.timer.reset().await;
        self.timer
            .set_limit_minutes(self.settings.default_limit_minutes())
            .await;

        self.timer
            .clear_persisted()
            .await
            .context("failed to clear timer snapshot")?;
        self.db.clear_profile().await?;
        self.db.clear_history().await?;
        self.db.clear_checkins().await?;
        info!("All user data cleared");
        Ok(())
    }

    /// Stops the background loops and writes the final timer snapshot.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!("Background task ended abnormally: {err}");
            }
        }
        self.timer.stop().await;
        info!("Beo shut down");
    }
}
