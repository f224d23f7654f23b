pub mod checkins;
pub mod history;
pub mod kv;
pub mod profile;
