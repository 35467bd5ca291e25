//! JSONL action log and its aggregation for `ktdash stats`.

pub mod logger;
pub mod reporter;

pub use logger::{ActionLog, ActionLogEntry};
