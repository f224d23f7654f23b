//! Maps host app phase changes onto the usage timer.
//!
//! Leaving the foreground stops the timer (and persists); coming back
//! reloads the persisted counter, applies any hour change that happened
//! meanwhile and restarts the ticker only if it was running before and the
//! intervention coordinator allows it.

use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{intervention::InterventionCoordinator, timer::TimerStore};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppPhase {
    Active,
    Inactive,
    Background,
}

impl AppPhase {
    pub fn is_foreground(self) -> bool {
        matches!(self, AppPhase::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleSignal {
    Suspended,
    Resumed,
}

/// Only crossings of the foreground boundary matter; inactive and
/// background are the same thing to the timer.
pub fn signal_for(from: AppPhase, to: AppPhase) -> Option<LifecycleSignal> {
    match (from.is_foreground(), to.is_foreground()) {
        (true, false) => Some(LifecycleSignal::Suspended),
        (false, true) => Some(LifecycleSignal::Resumed),
        _ => None,
    }
}

pub struct LifecycleBridge<S: TimerStore> {
    coordinator: InterventionCoordinator<S>,
    phase: AppPhase,
    running_at_suspend: bool,
}

impl<S: TimerStore> LifecycleBridge<S> {
    /// The host starts in the foreground.
    pub fn new(coordinator: InterventionCoordinator<S>) -> Self {
        Self {
            coordinator,
            phase: AppPhase::Active,
            running_at_suspend: false,
        }
    }

    pub fn phase(&self) -> AppPhase {
        self.phase
    }

    pub async fn handle(&mut self, next: AppPhase) -> Option<LifecycleSignal> {
        let signal = signal_for(self.phase, next);
        self.phase = next;
        let timer = self.coordinator.timer();

        match signal {
            Some(LifecycleSignal::Suspended) => {
                self.running_at_suspend = timer.is_running().await;
                timer.stop().await;
                log_info!(
                    "App moved to {next:?}; timer suspended (was running: {})",
                    self.running_at_suspend
                );
            }
            Some(LifecycleSignal::Resumed) => {
                let limit = timer.limit_minutes().await;
                timer.initialize(limit).await;
                // A break may have opened while suspended; the coordinator decides.
                let resumed =
                    self.running_at_suspend && self.coordinator.resume_timer().await;
                log_info!("App active again (timer running: {resumed})");
            }
            None => log_debug!("Phase change to {next:?} ignored"),
        }

        signal
    }

    /// Runs the bridge until cancelled or every phase sender is dropped.
    pub fn spawn(
        mut self,
        mut phases: mpsc::Receiver<AppPhase>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    phase = phases.recv() => match phase {
                        Some(phase) => {
                            self.handle(phase).await;
                        }
                        None => break,
                    },
                }
            }
            log_debug!("Lifecycle loop shutting down");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{
        db::test_support::scratch_db,
        intervention::BreakOutcome,
        timer::{clock::ManualClock, controller::test_support::RecordingStore, TimerConfig, UsageTimer},
    };

    struct Fixture {
        _dir: tempfile::TempDir,
        bridge: LifecycleBridge<RecordingStore>,
        coordinator: InterventionCoordinator<RecordingStore>,
        timer: UsageTimer<RecordingStore>,
    }

    async fn fixture(clock: &ManualClock, store: RecordingStore, limit_minutes: u32) -> Fixture {
        let (dir, db) = scratch_db();
        let (timer, _events) =
            UsageTimer::new(store, Arc::new(clock.clone()), TimerConfig::default());
        timer.initialize(limit_minutes).await;
        let coordinator =
            InterventionCoordinator::with_rng(timer.clone(), db, 100, StdRng::seed_from_u64(3));
        Fixture {
            _dir: dir,
            bridge: LifecycleBridge::new(coordinator.clone()),
            coordinator,
            timer,
        }
    }

    #[test]
    fn only_foreground_crossings_signal() {
        use AppPhase::*;
        assert_eq!(signal_for(Active, Inactive), Some(LifecycleSignal::Suspended));
        assert_eq!(signal_for(Active, Background), Some(LifecycleSignal::Suspended));
        assert_eq!(signal_for(Background, Active), Some(LifecycleSignal::Resumed));
        assert_eq!(signal_for(Inactive, Active), Some(LifecycleSignal::Resumed));
        assert_eq!(signal_for(Inactive, Background), None);
        assert_eq!(signal_for(Active, Active), None);
    }

    #[tokio::test(start_paused = true)]
    async fn suspend_persists_and_resume_restarts() {
        let clock = ManualClock::at(10);
        let store = RecordingStore::default();
        let mut f = fixture(&clock, store.clone(), 45).await;

        f.coordinator.set_screen_active(true).await;
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(f.bridge.handle(AppPhase::Background).await, Some(LifecycleSignal::Suspended));
        assert!(!f.timer.is_running().await);
        assert_eq!(store.current(), Some((3, 10)));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.timer.state().await.hourly_used_seconds, 3);

        assert_eq!(f.bridge.handle(AppPhase::Active).await, Some(LifecycleSignal::Resumed));
        assert!(f.timer.is_running().await);
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        f.timer.stop().await;
        assert_eq!(f.timer.state().await.hourly_used_seconds, 5);
    }

    #[tokio::test]
    async fn resume_in_new_hour_starts_from_zero() {
        let clock = ManualClock::at(10);
        let store = RecordingStore::with_snapshot(1200, 10);
        let mut f = fixture(&clock, store.clone(), 45).await;
        assert_eq!(f.timer.state().await.hourly_used_seconds, 1200);

        f.coordinator.set_screen_active(true).await;
        f.bridge.handle(AppPhase::Inactive).await;
        clock.set_hour(11);
        f.bridge.handle(AppPhase::Active).await;

        let state = f.timer.state().await;
        assert_eq!(state.hourly_used_seconds, 0);
        assert_eq!(state.current_hour, 11);
        assert_eq!(store.current(), Some((0, 11)));
        f.timer.stop().await;
    }

    #[tokio::test]
    async fn resume_keeps_stopped_timer_stopped() {
        let clock = ManualClock::at(8);
        let mut f = fixture(&clock, RecordingStore::default(), 45).await;

        f.bridge.handle(AppPhase::Background).await;
        f.bridge.handle(AppPhase::Active).await;
        assert!(!f.timer.is_running().await);
    }

    #[tokio::test]
    async fn inactive_to_background_is_not_a_second_suspend() {
        let clock = ManualClock::at(8);
        let mut f = fixture(&clock, RecordingStore::default(), 45).await;

        f.coordinator.set_screen_active(true).await;
        f.bridge.handle(AppPhase::Inactive).await;
        assert_eq!(f.bridge.handle(AppPhase::Background).await, None);
        f.bridge.handle(AppPhase::Active).await;
        assert!(f.timer.is_running().await);
        f.timer.stop().await;
    }

    #[tokio::test]
    async fn break_opened_while_suspended_keeps_timer_stopped_on_resume() {
        let clock = ManualClock::at(12);
        let mut f = fixture(&clock, RecordingStore::default(), 5).await;

        f.coordinator.set_screen_active(true).await;
        for _ in 0..300 {
            f.timer.tick().await;
        }
        f.bridge.handle(AppPhase::Background).await;
        assert!(f.coordinator.on_limit_reached(300, 12).await.is_some());

        f.bridge.handle(AppPhase::Active).await;
        assert!(f.coordinator.active_break().is_some());
        assert!(!f.timer.is_running().await);

        f.coordinator.respond(BreakOutcome::Completed).await;
        assert!(f.timer.is_running().await);
        f.timer.stop().await;
    }

    #[tokio::test]
    async fn loop_ends_when_sender_dropped() {
        let clock = ManualClock::at(8);
        let f = fixture(&clock, RecordingStore::default(), 45).await;
        f.coordinator.set_screen_active(true).await;

        let (tx, rx) = mpsc::channel(4);
        let handle = f.bridge.spawn(rx, CancellationToken::new());
        tx.send(AppPhase::Background).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert!(!f.timer.is_running().await);
    }
}
