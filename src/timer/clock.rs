use std::fmt::Debug;

use chrono::{Local, Timelike};

/// Source of the wall-clock hour, swappable so hour boundaries can be faked.
pub trait Clock: Send + Sync + Debug {
    /// Local hour of day, 0-23.
    fn current_hour(&self) -> u32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_hour(&self) -> u32 {
        Local::now().hour()
    }
}

#[cfg(test)]
pub(crate) use manual::ManualClock;

#[cfg(test)]
mod manual {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use super::Clock;

    /// Clock whose hour only moves when a test says so.
    #[derive(Debug, Clone, Default)]
    pub struct ManualClock {
        hour: Arc<AtomicU32>,
    }

    impl ManualClock {
        pub fn at(hour: u32) -> Self {
            Self {
                hour: Arc::new(AtomicU32::new(hour)),
            }
        }

        pub fn set_hour(&self, hour: u32) {
            self.hour.store(hour, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn current_hour(&self) -> u32 {
            self.hour.load(Ordering::SeqCst)
        }
    }
}
