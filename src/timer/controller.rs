use std::{sync::Arc, time::Duration};

use log::info;
use serde::Serialize;
use tokio::{
    sync::{mpsc, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    clock::Clock,
    state::{clamp_limit_minutes, TickOutcome, TimerState, TimerStatus},
    store::{PersistedTimer, TimerStore},
};

// Per-tick chatter; flip off to quiet debug builds.
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_warn};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_SAVE_EVERY_TICKS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    pub tick_interval: Duration,
    /// Throttled writes happen once every this many ticks.
    pub save_every_ticks: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            save_every_ticks: DEFAULT_SAVE_EVERY_TICKS,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_seconds: u32,
    pub progress_percent: f64,
    pub is_over_limit: bool,
}

impl From<TimerState> for TimerSnapshot {
    fn from(state: TimerState) -> Self {
        Self {
            remaining_seconds: state.remaining_seconds(),
            progress_percent: state.progress_percent(),
            is_over_limit: state.is_over_limit(),
            state,
        }
    }
}

/// Raised by the engine after the state change that caused it is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Hourly usage crossed the budget. At most once per clock hour.
    LimitReached {
        hourly_used_seconds: u32,
        limit_minutes: u32,
        hour: u32,
    },
    HourRolledOver {
        hour: u32,
    },
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Hourly usage timer.
///
/// Every mutation of [`TimerState`] goes through the one mutex, so the
/// ticker task, lifecycle transitions and the intervention flow never
/// interleave mid-update.
pub struct UsageTimer<S: TimerStore> {
    state: Arc<Mutex<TimerState>>,
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    events: mpsc::UnboundedSender<TimerEvent>,
    config: TimerConfig,
}

impl<S: TimerStore> Clone for UsageTimer<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            store: self.store.clone(),
            clock: self.clock.clone(),
            ticker: self.ticker.clone(),
            events: self.events.clone(),
            config: self.config,
        }
    }
}

impl<S: TimerStore> UsageTimer<S> {
    /// Builds an idle timer and the receiving end of its event queue.
    pub fn new(
        store: S,
        clock: Arc<dyn Clock>,
        config: TimerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let timer = Self {
            state: Arc::new(Mutex::new(TimerState::default())),
            store: Arc::new(store),
            clock,
            ticker: Arc::new(Mutex::new(None)),
            events,
            config,
        };
        (timer, receiver)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the persisted counter and reconciles it with the current hour.
    ///
    /// A stale hour zeroes the counter and writes the zeroed snapshot back.
    /// A restored counter already past the limit latches the gate without
    /// raising an event.
    pub async fn initialize(&self, limit_minutes: u32) -> TimerState {
        let persisted = match self.store.load().await {
            Ok(persisted) => persisted,
            Err(err) => {
                log_warn!("Failed to load timer state, starting from zero: {err:#}");
                PersistedTimer::default()
            }
        };

        let hour = self.clock.current_hour();
        let (was_reset, snapshot) = {
            let mut state = self.state.lock().await;
            state.limit_minutes = clamp_limit_minutes(limit_minutes);
            let was_reset =
                state.hydrate(persisted.hourly_used_seconds, persisted.saved_hour, hour);
            (was_reset, state.clone())
        };

        if was_reset {
            info!(
                "Stored usage belongs to hour {:?}, now {hour}; starting the hour from zero",
                persisted.saved_hour
            );
            self.persist(0, hour).await;
        } else {
            log_debug!(
                "Restored {}s of usage for hour {hour} (limit reached: {})",
                snapshot.hourly_used_seconds,
                snapshot.limit_reached
            );
        }

        snapshot
    }

    /// Starts the one-second ticker. Does nothing if it is already running.
    pub async fn start(&self) {
        let mut ticker = self.ticker.lock().await;
        if ticker.is_some() {
            log_debug!("Usage ticker already running");
            return;
        }

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let timer = self.clone();
        let period = self.config.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval_at(time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        timer.tick().await;
                    }
                }
            }
        });

        *ticker = Some(Ticker { handle, cancel });
        self.state.lock().await.status = TimerStatus::Running;
        log_debug!("Usage ticker started");
    }

    /// Cancels the ticker, waits for an in-flight tick to finish, then writes
    /// the current counter. Safe to call when not running.
    pub async fn stop(&self) {
        // Status is updated before the ticker lock is released.
        let (seconds, hour) = {
            let mut ticker = self.ticker.lock().await;
            if let Some(Ticker { handle, cancel }) = ticker.take() {
                cancel.cancel();
                if let Err(err) = handle.await {
                    log_error!("Usage ticker task failed: {err}");
                }
                log_debug!("Usage ticker stopped");
            }

            let mut state = self.state.lock().await;
            if state.status == TimerStatus::Running {
                state.status = TimerStatus::Stopped;
            }
            (state.hourly_used_seconds, state.current_hour)
        };
        self.persist(seconds, hour).await;
    }

    /// Applies one second of foreground use. The ticker calls this once per
    /// interval; hosts that own their own scheduling may call it directly.
    pub async fn tick(&self) -> TickOutcome {
        let hour = self.clock.current_hour();
        let (outcome, hourly_used_seconds, limit_minutes) = {
            let mut state = self.state.lock().await;
            let outcome = state.apply_tick(hour, self.config.save_every_ticks);
            (outcome, state.hourly_used_seconds, state.limit_minutes)
        };

        if outcome.hour_rolled {
            info!("Clock hour is now {hour}; hourly usage reset");
            self.emit(TimerEvent::HourRolledOver { hour });
        }

        if let Some((seconds, persist_hour)) = outcome.persist {
            self.persist(seconds, persist_hour).await;
        }

        if outcome.limit_crossed {
            info!("Hourly limit of {limit_minutes}m reached at {hourly_used_seconds}s");
            self.emit(TimerEvent::LimitReached {
                hourly_used_seconds,
                limit_minutes,
                hour,
            });
        }

        outcome
    }

    /// Zeroes the counters in memory. The store is left untouched.
    pub async fn reset(&self) {
        self.state.lock().await.reset();
    }

    /// Keeps the limit latched until the next hour boundary.
    pub async fn acknowledge_limit(&self) {
        self.state.lock().await.acknowledge_limit();
    }

    /// Applies a new hourly budget; the next tick evaluates against it.
    pub async fn set_limit_minutes(&self, minutes: u32) {
        let minutes = clamp_limit_minutes(minutes);
        let mut state = self.state.lock().await;
        if state.limit_minutes != minutes {
            info!("Hourly limit changed from {}m to {minutes}m", state.limit_minutes);
            state.limit_minutes = minutes;
        }
    }

    pub async fn limit_minutes(&self) -> u32 {
        self.state.lock().await.limit_minutes
    }

    pub async fn is_running(&self) -> bool {
        self.ticker.lock().await.is_some()
    }

    pub async fn state(&self) -> TimerState {
        self.state.lock().await.clone()
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(self.state().await)
    }

    /// Drops the persisted snapshot. Full app reset only.
    pub async fn clear_persisted(&self) -> anyhow::Result<()> {
        self.store.clear().await
    }

    async fn persist(&self, seconds: u32, hour: u32) {
        match self.store.save(seconds, hour).await {
            Ok(()) => log_debug!("Persisted {seconds}s for hour {hour}"),
            Err(err) => log_error!("Failed to persist timer state: {err:#}"),
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.events.send(event).is_err() {
            log_debug!("Timer event dropped, no listener: {event:?}");
        }
    }
}
