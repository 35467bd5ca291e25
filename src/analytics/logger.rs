use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::actions::{ActionKind, ActionState};
use crate::config::schema::{LoggingConfig, expand_home};

// ---------------------------------------------------------------------------
// Action log entry (JSONL)
// ---------------------------------------------------------------------------

/// A single entry in the action log (`~/.ktdash/action-log.jsonl`).
///
/// One entry is written per settled or rejected invocation. Used by the
/// reporter for `ktdash stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub timestamp: String,
    pub action: String,
    /// `"success"` or `"error"`.
    pub outcome: String,
    /// HTTP status, when the service answered with one.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<u16>,
    /// Failure kind: `validation`, `http`, `network` or `decode`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
    #[serde(default)]
    pub latency_ms: u64,
}

impl ActionLogEntry {
    /// Entry for an action that reached a terminal state. Returns `None`
    /// for idle or loading states.
    pub fn from_state(kind: ActionKind, state: &ActionState, latency_ms: u64) -> Option<Self> {
        let (outcome, err) = match state {
            ActionState::Success(_) => ("success", None),
            ActionState::Error(err) => ("error", Some(err)),
            ActionState::Idle | ActionState::Loading => return None,
        };
        Some(Self {
            timestamp: Utc::now().to_rfc3339(),
            action: kind.name().to_string(),
            outcome: outcome.to_string(),
            status: err.and_then(|e| e.status()),
            error_kind: err.map(|e| e.kind_name().to_string()),
            error: err.map(ToString::to_string),
            latency_ms,
        })
    }

    pub fn is_success(&self) -> bool {
        self.outcome == "success"
    }
}

// ---------------------------------------------------------------------------
// Log handle
// ---------------------------------------------------------------------------

/// Append-only JSONL action log. A log without a path records nothing.
#[derive(Debug, Clone, Default)]
pub struct ActionLog {
    path: Option<PathBuf>,
}

impl ActionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: expand_home(&config.path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append `entry`. Best-effort: write failures are ignored.
    pub fn record(&self, entry: &ActionLogEntry) {
        let _ = self.append(entry);
    }

    fn append(&self, entry: &ActionLogEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read all entries.
    ///
    /// Silently skips malformed lines. Returns an empty vec if the file does
    /// not exist or cannot be read.
    pub fn read_all(&self) -> Vec<ActionLogEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<ActionLogEntry>(&line).ok())
            .collect()
    }

    /// Read entries from the last `days` days, or all entries for `None`.
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<ActionLogEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
