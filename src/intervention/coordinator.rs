use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    db::{Database, HistoryEntry},
    timer::{TimerEvent, TimerStore, UsageTimer},
};

use super::catalog::{random_intervention, Intervention};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreakOutcome {
    Completed,
    Skipped,
}

/// The break currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBreak {
    pub intervention: Intervention,
    pub triggered_at: DateTime<Utc>,
    pub hourly_used_seconds: u32,
}

/// Turns limit events into wellness breaks and records how they were answered.
///
/// While a break is shown the timer is stopped; answering it latches the
/// limit for the rest of the hour and resumes the timer if the dashboard is
/// still visible.
pub struct InterventionCoordinator<S: TimerStore> {
    timer: UsageTimer<S>,
    db: Database,
    history_capacity: usize,
    rng: Arc<Mutex<StdRng>>,
    active: Arc<watch::Sender<Option<ActiveBreak>>>,
    screen_active: Arc<AtomicBool>,
    // Serializes break transitions so a trigger and a response never interleave.
    transition: Arc<Mutex<()>>,
}

impl<S: TimerStore> Clone for InterventionCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            timer: self.timer.clone(),
            db: self.db.clone(),
            history_capacity: self.history_capacity,
            rng: self.rng.clone(),
            active: self.active.clone(),
            screen_active: self.screen_active.clone(),
            transition: self.transition.clone(),
        }
    }
}

impl<S: TimerStore> InterventionCoordinator<S> {
    pub fn new(timer: UsageTimer<S>, db: Database, history_capacity: usize) -> Self {
        Self::with_rng(timer, db, history_capacity, StdRng::from_entropy())
    }

    pub fn with_rng(
        timer: UsageTimer<S>,
        db: Database,
        history_capacity: usize,
        rng: StdRng,
    ) -> Self {
        let (active, _) = watch::channel(None);
        Self {
            timer,
            db,
            history_capacity,
            rng: Arc::new(Mutex::new(rng)),
            active: Arc::new(active),
            screen_active: Arc::new(AtomicBool::new(false)),
            transition: Arc::new(Mutex::new(())),
        }
    }

    pub fn active_break(&self) -> Option<ActiveBreak> {
        self.active.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveBreak>> {
        self.active.subscribe()
    }

    pub fn is_screen_active(&self) -> bool {
        self.screen_active.load(Ordering::SeqCst)
    }

    /// Records whether the dashboard is visible. Drives the timer directly
    /// unless a break is on screen, in which case the response decides.
    pub async fn set_screen_active(&self, active: bool) {
        self.screen_active.store(active, Ordering::SeqCst);

        let _guard = self.transition.lock().await;
        let showing = self.active.borrow().is_some();
        if showing {
            log_debug!("Break on screen; timer left as is (screen active: {active})");
            return;
        }

        if active {
            self.timer.start().await;
        } else {
            self.timer.stop().await;
        }
    }

    pub fn timer(&self) -> &UsageTimer<S> {
        &self.timer
    }

    /// Restarts the timer after the app returns to the foreground, unless a
    /// break is on screen or the dashboard is hidden. Returns whether it started.
    pub async fn resume_timer(&self) -> bool {
        let _guard = self.transition.lock().await;
        let showing = self.active.borrow().is_some();
        if showing || !self.is_screen_active() {
            log_debug!("Timer not resumed (break shown: {showing})");
            return false;
        }
        self.timer.start().await;
        true
    }

    /// Opens a break for a limit crossing in `hour`. Returns `None` if one is
    /// already shown or the engine no longer agrees the limit was reached
    /// (reset or hour rollover since the event was raised).
    pub async fn on_limit_reached(&self, hourly_used_seconds: u32, hour: u32) -> Option<ActiveBreak> {
        let _guard = self.transition.lock().await;
        let showing = self.active.borrow().is_some();
        if showing {
            log_debug!("Limit event ignored, a break is already on screen");
            return None;
        }

        let state = self.timer.state().await;
        if !state.limit_reached || state.current_hour != hour {
            log_debug!(
                "Stale limit event for hour {hour} dropped (now hour {}, latched: {})",
                state.current_hour,
                state.limit_reached
            );
            return None;
        }

        let intervention = *random_intervention(&mut *self.rng.lock().await);
        let active = ActiveBreak {
            intervention,
            triggered_at: Utc::now(),
            hourly_used_seconds,
        };
        info!(
            "Hourly limit reached after {hourly_used_seconds}s; suggesting {}",
            intervention.name
        );
        self.active.send_replace(Some(active.clone()));
        self.timer.stop().await;

        Some(active)
    }

    /// Closes the active break. History write failures are logged, the break
    /// is still closed. Returns `None` when no break was shown.
    pub async fn respond(&self, outcome: BreakOutcome) -> Option<HistoryEntry> {
        let _guard = self.transition.lock().await;
        let current = self.active.borrow().clone();
        let Some(active) = current else {
            log_debug!("Break response {outcome:?} ignored, nothing on screen");
            return None;
        };

        let entry = HistoryEntry::new(
            &active.intervention,
            outcome == BreakOutcome::Completed,
            Utc::now(),
        );
        if let Err(err) = self.db.append_history(&entry, self.history_capacity).await {
            log_error!("Failed to record break history: {err:#}");
        }

        self.active.send_replace(None);
        self.timer.acknowledge_limit().await;
        if self.is_screen_active() {
            self.timer.start().await;
        }
        info!("{} {:?}", active.intervention.name, outcome);

        Some(entry)
    }

    /// Drops the active break without recording it. Used by full app reset.
    pub async fn dismiss(&self) -> Option<ActiveBreak> {
        let _guard = self.transition.lock().await;
        self.active.send_replace(None)
    }

    /// Consumes timer events until cancelled or the timer goes away.
    pub fn spawn(
        &self,
        mut events: mpsc::UnboundedReceiver<TimerEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let coordinator = self.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Some(TimerEvent::LimitReached { hourly_used_seconds, hour, .. }) => {
                            coordinator.on_limit_reached(hourly_used_seconds, hour).await;
                        }
                        Some(TimerEvent::HourRolledOver { hour }) => {
                            log_debug!("Hour {hour} started");
                        }
                        None => break,
                    },
                }
            }
            log_debug!("Intervention loop shutting down");
        })
    }
}
