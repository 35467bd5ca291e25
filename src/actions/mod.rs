//! Operator actions and their per-action UI state.
//!
//! Each [`ActionKind`] has exactly one [`controller::ActionController`],
//! which owns that action's [`ActionState`]. A new invocation supersedes the
//! previous state; nothing is queued. The [`dashboard::Dashboard`] wires
//! controllers, the API client, the render regions and the metrics chart
//! together.

pub mod controller;
pub mod dashboard;
pub mod request;

use serde::Serialize;
use thiserror::Error;

use crate::api::TransportError;
use crate::api::types::{
    CacheStats, DriftResult, HealthStatus, MetricsResponse, RecommendationResponse,
    UncertaintyResult, UploadResult,
};

pub use controller::{ActionController, Control, Ticket};
pub use dashboard::Dashboard;
pub use request::ActionRequest;

// ---------------------------------------------------------------------------
// Action identity
// ---------------------------------------------------------------------------

/// The user-triggerable actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Upload,
    Recommend,
    Metrics,
    Drift,
    CacheStats,
    Uncertainty,
    Health,
}

impl ActionKind {
    pub const ALL: [ActionKind; 7] = [
        ActionKind::Upload,
        ActionKind::Recommend,
        ActionKind::Metrics,
        ActionKind::Drift,
        ActionKind::CacheStats,
        ActionKind::Uncertainty,
        ActionKind::Health,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Recommend => "recommend",
            Self::Metrics => "metrics",
            Self::Drift => "drift",
            Self::CacheStats => "cache-stats",
            Self::Uncertainty => "uncertainty",
            Self::Health => "health",
        }
    }

    /// Endpoint path the action calls.
    pub fn endpoint(self) -> &'static str {
        use crate::api::client as c;
        match self {
            Self::Upload => c::UPLOAD_PATH,
            Self::Recommend => c::INFER_PATH,
            Self::Metrics => c::METRICS_PATH,
            Self::Drift => c::DRIFT_PATH,
            Self::CacheStats => c::CACHE_STATS_PATH,
            Self::Uncertainty => c::UNCERTAINTY_PATH,
            Self::Health => c::HEALTH_PATH,
        }
    }

    /// Diagnostics that not every deployment exposes. A missing endpoint is
    /// an expected condition for these, not a failure.
    pub fn is_optional_feature(self) -> bool {
        matches!(self, Self::Drift | Self::CacheStats | Self::Uncertainty)
    }

    /// Human name of an optional feature, used in guidance text.
    pub fn feature_name(self) -> &'static str {
        match self {
            Self::Drift => "Drift detection",
            Self::CacheStats => "Prediction cache",
            Self::Uncertainty => "Uncertainty estimation (MC Dropout)",
            Self::Upload => "Dataset upload",
            Self::Recommend => "Recommendation",
            Self::Metrics => "Model metrics",
            Self::Health => "Health check",
        }
    }

    /// Label of the action's control while idle. Metrics runs unprompted
    /// and has no control.
    pub fn idle_label(self) -> Option<&'static str> {
        match self {
            Self::Upload => Some("Upload CSV"),
            Self::Recommend => Some("Get recommendation"),
            Self::Metrics => None,
            Self::Drift => Some("Check drift"),
            Self::CacheStats => Some("Cache statistics"),
            Self::Uncertainty => Some("Estimate uncertainty"),
            Self::Health => Some("Check health"),
        }
    }

    /// Text of the in-progress indicator.
    pub fn progress_message(self) -> &'static str {
        match self {
            Self::Upload => "Uploading dataset...",
            Self::Recommend => "Requesting recommendation...",
            Self::Metrics => "Loading metrics...",
            Self::Drift => "Checking drift...",
            Self::CacheStats => "Loading cache statistics...",
            Self::Uncertainty => "Estimating uncertainty with MC Dropout...",
            Self::Health => "Checking service health...",
        }
    }

    /// Whether outcomes of this action are shown to the operator. Metrics
    /// loads at startup and only ever shows a successful result; its
    /// progress and failures go to the log.
    pub fn is_silent(self) -> bool {
        matches!(self, Self::Metrics)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Why an action ended in the error state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Missing or invalid local input; the network was never contacted.
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ActionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short failure-kind tag for logs and JSON output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport(TransportError::Http { .. }) => "http",
            Self::Transport(TransportError::Network { .. }) => "network",
            Self::Transport(TransportError::Decode { .. }) => "decode",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(err) => err.status(),
            Self::Validation(_) => None,
        }
    }
}

/// Decoded success payload of an action.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Upload(UploadResult),
    Recommendation(RecommendationResponse),
    Metrics(MetricsResponse),
    Drift(DriftResult),
    CacheStats(CacheStats),
    Uncertainty(UncertaintyResult),
    Health(HealthStatus),
}

/// Lifecycle phase of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

/// Current state of one action. Terminal states persist until the next
/// invocation of the same action.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActionState {
    #[default]
    Idle,
    Loading,
    Success(Payload),
    Error(ActionError),
}

impl ActionState {
    pub fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Loading => Phase::Loading,
            Self::Success(_) => Phase::Success,
            Self::Error(_) => Phase::Error,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            Self::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ActionError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// JSON view for machine-readable output.
    pub fn to_json(&self, kind: ActionKind) -> serde_json::Value {
        let mut value = serde_json::json!({
            "action": kind.name(),
            "phase": self.phase(),
        });
        match self {
            Self::Success(payload) => {
                value["payload"] = serde_json::to_value(payload).unwrap_or_default();
            }
            Self::Error(err) => {
                value["error"] = serde_json::json!({
                    "kind": err.kind_name(),
                    "status": err.status(),
                    "message": err.to_string(),
                });
            }
            Self::Idle | Self::Loading => {}
        }
        value
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_diagnostics_are_optional_features() {
        let optional: Vec<_> = ActionKind::ALL
            .into_iter()
            .filter(|k| k.is_optional_feature())
            .collect();
        assert_eq!(
            optional,
            vec![ActionKind::Drift, ActionKind::CacheStats, ActionKind::Uncertainty]
        );
    }

    #[test]
    fn error_kind_names() {
        assert_eq!(ActionError::validation("x").kind_name(), "validation");
        let http = ActionError::from(TransportError::Http {
            status: 404,
            status_text: "Not Found".into(),
        });
        assert_eq!(http.kind_name(), "http");
        assert_eq!(http.status(), Some(404));
        assert_eq!(http.to_string(), "HTTP 404: Not Found");
    }

    #[test]
    fn state_json_includes_error_details() {
        let state = ActionState::Error(ActionError::validation("Select a CSV file"));
        let json = state.to_json(ActionKind::Upload);
        assert_eq!(json["action"], "upload");
        assert_eq!(json["phase"], "error");
        assert_eq!(json["error"]["kind"], "validation");
        assert_eq!(json["error"]["message"], "Select a CSV file");
    }

    #[test]
    fn state_json_tags_payload() {
        let state = ActionState::Success(Payload::Drift(DriftResult { has_drift: true }));
        let json = state.to_json(ActionKind::Drift);
        assert_eq!(json["payload"]["type"], "drift");
        assert_eq!(json["payload"]["data"]["has_drift"], true);
    }
}
