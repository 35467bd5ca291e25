/// Request and response payloads for the recommendation service.
///
/// Field names match the service's JSON contract exactly. Response types
/// are deserialize-only views; optional fields carry `#[serde(default)]`
/// because deployments are known to omit them.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One answered item in a student's history. Order in the containing
/// sequence is chronological and significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentHistoryEntry {
    pub item_id: String,
    /// `1` for a correct answer, `0` otherwise.
    pub correct: u8,
    /// ISO-8601 timestamp of the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl StudentHistoryEntry {
    pub fn new(item_id: impl Into<String>, correct: bool) -> Self {
        Self {
            item_id: item_id.into(),
            correct: u8::from(correct),
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// Item-selection policy requested from the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Target,
    InfoGain,
    Exploration,
    Heuristic,
    Random,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Target,
        Strategy::InfoGain,
        Strategy::Exploration,
        Strategy::Heuristic,
        Strategy::Random,
    ];

    /// Wire name, as sent in `strategy`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::InfoGain => "info_gain",
            Self::Exploration => "exploration",
            Self::Heuristic => "heuristic",
            Self::Random => "random",
        }
    }

    /// Human-facing label.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Target => "Target difficulty",
            Self::InfoGain => "Information gain",
            Self::Exploration => "Exploration",
            Self::Heuristic => "Heuristic",
            Self::Random => "Random",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| format!("unknown strategy: {s}"))
    }
}

/// Body of `POST /infer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRequest {
    pub student_history: Vec<StudentHistoryEntry>,
    /// Order is irrelevant to the service but preserved on the wire.
    pub candidate_items: Vec<String>,
    pub strategy: Strategy,
    /// Desired success probability; only meaningful for [`Strategy::Target`].
    pub target_p: f64,
}

/// Body of `POST /uncertainty`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UncertaintyRequest {
    pub student_history: Vec<StudentHistoryEntry>,
    pub candidate_item: String,
    pub n_samples: u32,
}

/// Default number of stochastic forward passes requested.
pub const DEFAULT_UNCERTAINTY_SAMPLES: u32 = 10;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// `POST /upload-csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResult {
    pub n_students: u64,
    pub n_items: u64,
    /// First rows of the parsed dataset, as echoed by the service.
    #[serde(default)]
    pub sample_rows: Vec<serde_json::Value>,
}

/// `POST /infer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub item_id: String,
    pub p_estimated: f64,
    pub rationale: String,
    /// Echo of the requested strategy. Kept raw so values this client does
    /// not know still render.
    pub strategy: String,
}

/// `GET /metrics`: model quality and the policy comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub auc_dkt: f64,
    pub accuracy_dkt: f64,
    pub avg_gain_dkt: f64,
    pub avg_gain_random: f64,
    pub avg_gain_heuristic: f64,
    pub time_to_master_mean_dkt: f64,
}

/// `GET /cache-stats`. Every field defaults to zero when omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheStats {
    pub n_entries: u64,
    pub total_size_mb: f64,
    /// Fraction of capacity in use, `0.0..=1.0`.
    pub utilization: f64,
}

/// `GET /check-drift`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    pub has_drift: bool,
}

/// `POST /uncertainty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyResult {
    pub mean: f64,
    pub std: f64,
}

/// `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
