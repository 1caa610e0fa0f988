//! SQLite-backed persistence for analysis history.

pub mod history;

pub use history::{HistoryRecord, HistoryStore, NewHistoryRecord};
