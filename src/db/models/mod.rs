pub mod checkin;
pub mod history;
pub mod profile;

pub use checkin::{CheckIn, CheckInActivity, CheckInInput, CheckInLocation};
pub use history::{HistoryEntry, TodayStats};
pub use profile::Profile;
