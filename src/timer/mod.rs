//! Hourly usage engine: counts foreground seconds, rolls over on the clock
//! hour and raises a one-shot event when the hourly budget is spent.

pub mod clock;
pub mod controller;
pub mod policy;
pub mod state;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use controller::{TimerConfig, TimerEvent, TimerSnapshot, UsageTimer};
pub use state::{
    clamp_limit_minutes, TickOutcome, TimerState, TimerStatus, DEFAULT_LIMIT_MINUTES,
    MAX_LIMIT_MINUTES, MIN_LIMIT_MINUTES, SECONDS_PER_HOUR,
};
pub use store::{PersistedTimer, SqliteTimerStore, TimerStore};
