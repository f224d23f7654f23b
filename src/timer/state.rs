use serde::{Deserialize, Serialize};

use super::policy::should_reset;

/// Longest meaningful accumulation within one clock hour.
pub const SECONDS_PER_HOUR: u32 = 3600;

pub const MIN_LIMIT_MINUTES: u32 = 5;
pub const MAX_LIMIT_MINUTES: u32 = 55;
pub const LIMIT_STEP_MINUTES: u32 = 5;
pub const DEFAULT_LIMIT_MINUTES: u32 = 45;

/// Snaps a requested hourly budget onto the 5..=55 grid in steps of 5.
pub fn clamp_limit_minutes(minutes: u32) -> u32 {
    let clamped = minutes.clamp(MIN_LIMIT_MINUTES, MAX_LIMIT_MINUTES);
    let snapped = (clamped + LIMIT_STEP_MINUTES / 2) / LIMIT_STEP_MINUTES * LIMIT_STEP_MINUTES;
    snapped.clamp(MIN_LIMIT_MINUTES, MAX_LIMIT_MINUTES)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    /// Foreground seconds since the last explicit reset. Hour rollovers leave it alone.
    pub session_seconds: u64,
    pub hourly_used_seconds: u32,
    pub current_hour: u32,
    /// Latched once per hour; only an hour rollover or a reset clears it.
    pub limit_reached: bool,
    pub limit_minutes: u32,
    /// Ticks since the last throttled write.
    #[serde(skip)]
    pub save_counter: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            session_seconds: 0,
            hourly_used_seconds: 0,
            current_hour: 0,
            limit_reached: false,
            limit_minutes: DEFAULT_LIMIT_MINUTES,
            save_counter: 0,
        }
    }
}

/// What a single tick changed, for the caller to act on once the state lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// The hour advanced and the counters were zeroed; nothing else happened this tick.
    pub hour_rolled: bool,
    /// `(hourly_used_seconds, hour)` to write through to the store.
    pub persist: Option<(u32, u32)>,
    /// First crossing of the limit this hour.
    pub limit_crossed: bool,
}

impl TimerState {
    pub fn new(limit_minutes: u32) -> Self {
        Self {
            limit_minutes: clamp_limit_minutes(limit_minutes),
            ..Self::default()
        }
    }

    pub fn limit_seconds(&self) -> u32 {
        self.limit_minutes * 60
    }

    pub fn is_over_limit(&self) -> bool {
        self.hourly_used_seconds >= self.limit_seconds()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.limit_seconds().saturating_sub(self.hourly_used_seconds)
    }

    /// Share of the hourly budget used, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        let limit = self.limit_seconds();
        if limit == 0 {
            return 100.0;
        }
        (f64::from(self.hourly_used_seconds) / f64::from(limit) * 100.0).min(100.0)
    }

    /// Adopts a persisted snapshot. Returns true when the stored hour is stale
    /// and the counters were zeroed instead.
    pub fn hydrate(&mut self, stored_seconds: u32, stored_hour: Option<u32>, current_hour: u32) -> bool {
        self.current_hour = current_hour;
        if should_reset(stored_hour, current_hour) {
            self.hourly_used_seconds = 0;
            self.limit_reached = false;
            return true;
        }

        self.hourly_used_seconds = stored_seconds.min(SECONDS_PER_HOUR);
        self.limit_reached = self.is_over_limit();
        false
    }

    /// Advances one second of foreground use observed at `hour`.
    pub fn apply_tick(&mut self, hour: u32, save_every_ticks: u32) -> TickOutcome {
        if should_reset(Some(self.current_hour), hour) {
            self.roll_hour(hour);
            return TickOutcome {
                hour_rolled: true,
                persist: Some((0, hour)),
                limit_crossed: false,
            };
        }

        self.session_seconds = self.session_seconds.saturating_add(1);
        self.hourly_used_seconds = (self.hourly_used_seconds + 1).min(SECONDS_PER_HOUR);

        self.save_counter += 1;
        let persist = if self.save_counter >= save_every_ticks.max(1) {
            self.save_counter = 0;
            Some((self.hourly_used_seconds, self.current_hour))
        } else {
            None
        };

        let limit_crossed = self.is_over_limit() && !self.limit_reached;
        if limit_crossed {
            self.limit_reached = true;
        }

        TickOutcome {
            hour_rolled: false,
            persist,
            limit_crossed,
        }
    }

    pub fn roll_hour(&mut self, hour: u32) {
        self.current_hour = hour;
        self.hourly_used_seconds = 0;
        self.limit_reached = false;
    }

    pub fn reset(&mut self) {
        self.session_seconds = 0;
        self.hourly_used_seconds = 0;
        self.limit_reached = false;
        self.save_counter = 0;
    }

    /// Closes the gate for the rest of the hour after a break was answered.
    pub fn acknowledge_limit(&mut self) {
        self.limit_reached = true;
    }
}
