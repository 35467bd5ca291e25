//! Pure mapping from action state to display fragments.
//!
//! [`render`] turns an [`ActionState`] into the [`Fragment`] for a region:
//! nothing for idle, a neutral indicator while loading, a fixed template per
//! payload on success, and the output of [`describe_error`] on failure.
//!
//! Number formatting is fixed: probabilities are percentages with one
//! decimal (`82.0%`), model scores have three decimals (`0.910`).

pub mod fragment;
pub mod target;

use serde::Serialize;

use crate::actions::{ActionError, ActionKind, ActionState, Payload};
use crate::api::TransportError;
use crate::api::types::{
    CacheStats, DriftResult, HealthStatus, MetricsResponse, RecommendationResponse, Strategy,
    UncertaintyResult, UploadResult,
};

pub use fragment::{Badge, Fragment, Stat, Tone};
pub use target::{MemoryTarget, OutputFormat, Regions, RenderTarget, TerminalTarget};

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// Logical output regions, one per action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    UploadStatus,
    Recommendation,
    Metrics,
    Drift,
    CacheStats,
    Uncertainty,
    Health,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::UploadStatus,
        Region::Recommendation,
        Region::Metrics,
        Region::Drift,
        Region::CacheStats,
        Region::Uncertainty,
        Region::Health,
    ];

    pub fn for_action(kind: ActionKind) -> Self {
        match kind {
            ActionKind::Upload => Self::UploadStatus,
            ActionKind::Recommend => Self::Recommendation,
            ActionKind::Metrics => Self::Metrics,
            ActionKind::Drift => Self::Drift,
            ActionKind::CacheStats => Self::CacheStats,
            ActionKind::Uncertainty => Self::Uncertainty,
            ActionKind::Health => Self::Health,
        }
    }

    /// The action whose output this region shows.
    pub fn action(self) -> ActionKind {
        match self {
            Self::UploadStatus => ActionKind::Upload,
            Self::Recommendation => ActionKind::Recommend,
            Self::Metrics => ActionKind::Metrics,
            Self::Drift => ActionKind::Drift,
            Self::CacheStats => ActionKind::CacheStats,
            Self::Uncertainty => ActionKind::Uncertainty,
            Self::Health => ActionKind::Health,
        }
    }

    /// Element id used in HTML output.
    pub fn id(self) -> &'static str {
        match self {
            Self::UploadStatus => "uploadStatus",
            Self::Recommendation => "recommendation",
            Self::Metrics => "metrics",
            Self::Drift => "driftResults",
            Self::CacheStats => "cacheResults",
            Self::Uncertainty => "uncertaintyResults",
            Self::Health => "healthStatus",
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the state of the region's action.
pub fn render(region: Region, state: &ActionState) -> Option<Fragment> {
    let kind = region.action();
    match state {
        ActionState::Idle => None,
        ActionState::Loading => {
            Some(Fragment::new(region, Tone::Progress).note(kind.progress_message()))
        }
        ActionState::Success(payload) => Some(render_payload(region, payload)),
        ActionState::Error(err) => {
            let (tone, message) = describe_error(kind, err);
            Some(Fragment::new(region, tone).note(message))
        }
    }
}

fn render_payload(region: Region, payload: &Payload) -> Fragment {
    match payload {
        Payload::Upload(result) => render_upload(region, result),
        Payload::Recommendation(rec) => render_recommendation(region, rec),
        Payload::Metrics(metrics) => render_metrics(region, metrics),
        Payload::Drift(drift) => render_drift(region, drift),
        Payload::CacheStats(stats) => render_cache_stats(region, stats),
        Payload::Uncertainty(result) => render_uncertainty(region, result),
        Payload::Health(health) => render_health(region, health),
    }
}

fn render_upload(region: Region, result: &UploadResult) -> Fragment {
    let mut fragment = Fragment::new(region, Tone::Success)
        .title("Upload complete")
        .stat(result.n_students.to_string(), "Students")
        .stat(result.n_items.to_string(), "Items");
    if !result.sample_rows.is_empty() {
        fragment = fragment.note(format!(
            "Preview: first {} rows parsed",
            result.sample_rows.len()
        ));
    }
    fragment
}

fn render_recommendation(region: Region, rec: &RecommendationResponse) -> Fragment {
    Fragment::new(region, Tone::Success)
        .title("Recommendation")
        .stat(rec.item_id.clone(), "Recommended item")
        .stat(format_percent(rec.p_estimated), "Estimated probability")
        .note(format!("Rationale: {}", rec.rationale))
        .badge(
            format!("Strategy: {}", strategy_label(&rec.strategy)),
            Tone::Info,
        )
}

fn render_metrics(region: Region, metrics: &MetricsResponse) -> Fragment {
    Fragment::new(region, Tone::Info)
        .title("Model metrics")
        .stat(format_score(metrics.auc_dkt), "AUC")
        .stat(format_score(metrics.accuracy_dkt), "Accuracy")
        .stat(format_score(metrics.avg_gain_dkt), "Average gain (DKT)")
        .stat(
            format!("{:.1}", metrics.time_to_master_mean_dkt),
            "Time to mastery",
        )
}

fn render_drift(region: Region, drift: &DriftResult) -> Fragment {
    let fragment = Fragment::new(region, Tone::Info).title("Drift detection");
    if drift.has_drift {
        fragment.badge("Drift detected", Tone::Error)
    } else {
        fragment.badge("No drift", Tone::Success)
    }
}

fn render_cache_stats(region: Region, stats: &CacheStats) -> Fragment {
    Fragment::new(region, Tone::Success)
        .title("Cache statistics")
        .stat(stats.n_entries.to_string(), "Entries")
        .stat(format!("{:.2} MB", stats.total_size_mb), "Total size")
        .stat(format_percent(stats.utilization), "Utilization")
}

fn render_uncertainty(region: Region, result: &UncertaintyResult) -> Fragment {
    Fragment::new(region, Tone::Success)
        .title("Uncertainty estimate (MC Dropout)")
        .stat(format_percent(result.mean), "Mean probability")
        .stat(format!("±{:.1}%", result.std * 100.0), "Standard deviation")
}

fn render_health(region: Region, health: &HealthStatus) -> Fragment {
    let tone = if health.status.eq_ignore_ascii_case("ok") {
        Tone::Success
    } else {
        Tone::Warning
    };
    let mut fragment = Fragment::new(region, tone)
        .title("Service health")
        .stat(health.status.clone(), "Status");
    if let Some(ts) = &health.timestamp {
        fragment = fragment.note(format!("Reported at {ts}"));
    }
    fragment
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Tone and message for a failed action.
///
/// For optional diagnostics a missing endpoint (404, 501) or an unreachable
/// service is a soft "not connected" condition with guidance. Everything
/// else is an actionable failure.
pub fn describe_error(kind: ActionKind, err: &ActionError) -> (Tone, String) {
    if kind.is_optional_feature() && is_not_connected(err) {
        return (
            Tone::Warning,
            format!(
                "{} is not connected on this deployment yet. Check that the service exposes {}.",
                kind.feature_name(),
                kind.endpoint()
            ),
        );
    }

    let message = match err {
        ActionError::Validation(msg) => format!("Error: {msg}"),
        ActionError::Transport(TransportError::Http {
            status,
            status_text,
        }) => format!("Error {status}: {status_text}"),
        ActionError::Transport(TransportError::Network { message }) => {
            format!("Network error: could not reach the service ({message})")
        }
        ActionError::Transport(TransportError::Decode { message }) => {
            format!("Unexpected response from the service: {message}")
        }
    };
    (Tone::Error, message)
}

fn is_not_connected(err: &ActionError) -> bool {
    match err {
        ActionError::Transport(TransportError::Http { status, .. }) => {
            matches!(status, 404 | 501)
        }
        ActionError::Transport(TransportError::Network { .. }) => true,
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Probability as a percentage with one decimal place.
pub fn format_percent(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

/// Model score with three decimal places.
pub fn format_score(score: f64) -> String {
    format!("{score:.3}")
}

/// Display name of a strategy echoed by the service; unknown values are
/// shown as sent.
pub fn strategy_label(raw: &str) -> String {
    raw.parse::<Strategy>()
        .map(|s| s.display_name().to_string())
        .unwrap_or_else(|_| raw.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, text: &str) -> ActionError {
        ActionError::from(TransportError::Http {
            status,
            status_text: text.to_string(),
        })
    }

    #[test]
    fn idle_renders_nothing() {
        assert!(render(Region::Drift, &ActionState::Idle).is_none());
    }

    #[test]
    fn loading_renders_progress_indicator() {
        let fragment = render(Region::CacheStats, &ActionState::Loading).unwrap();
        assert_eq!(fragment.tone, Tone::Progress);
        assert_eq!(fragment.notes, vec!["Loading cache statistics..."]);
    }

    #[test]
    fn upload_counts_render_verbatim() {
        for (n, m) in [(0_u64, 0_u64), (1, 50), (4213, 17)] {
            let state = ActionState::Success(Payload::Upload(UploadResult {
                n_students: n,
                n_items: m,
                sample_rows: Vec::new(),
            }));
            let fragment = render(Region::UploadStatus, &state).unwrap();
            assert_eq!(fragment.stat_value("Students"), Some(n.to_string().as_str()));
            assert_eq!(fragment.stat_value("Items"), Some(m.to_string().as_str()));
        }
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(0.82), "82.0%");
        assert_eq!(format_percent(0.0), "0.0%");
        assert_eq!(format_percent(1.0), "100.0%");
        assert_eq!(format_percent(0.1234), "12.3%");
        assert_eq!(format_percent(0.5678), "56.8%");
    }

    #[test]
    fn score_has_three_decimals() {
        assert_eq!(format_score(0.91), "0.910");
        assert_eq!(format_score(0.1), "0.100");
    }

    #[test]
    fn strategy_label_falls_back_to_raw() {
        assert_eq!(strategy_label("info_gain"), "Information gain");
        assert_eq!(strategy_label("thompson"), "thompson");
    }

    #[test]
    fn recommendation_template() {
        let state = ActionState::Success(Payload::Recommendation(RecommendationResponse {
            item_id: "item_3".into(),
            p_estimated: 0.82,
            rationale: "closest to target".into(),
            strategy: "target".into(),
        }));
        let fragment = render(Region::Recommendation, &state).unwrap();
        assert_eq!(fragment.stat_value("Recommended item"), Some("item_3"));
        assert_eq!(fragment.stat_value("Estimated probability"), Some("82.0%"));
        assert_eq!(fragment.notes, vec!["Rationale: closest to target"]);
        assert_eq!(
            fragment.badge.unwrap().text,
            "Strategy: Target difficulty"
        );
    }

    #[test]
    fn drift_badges() {
        let fragment = render(
            Region::Drift,
            &ActionState::Success(Payload::Drift(DriftResult { has_drift: true })),
        )
        .unwrap();
        let badge = fragment.badge.unwrap();
        assert_eq!(badge.text, "Drift detected");
        assert_eq!(badge.tone, Tone::Error);
    }

    #[test]
    fn cache_stats_defaults_render_zeroes() {
        let state = ActionState::Success(Payload::CacheStats(CacheStats::default()));
        let fragment = render(Region::CacheStats, &state).unwrap();
        assert_eq!(fragment.stat_value("Entries"), Some("0"));
        assert_eq!(fragment.stat_value("Total size"), Some("0.00 MB"));
        assert_eq!(fragment.stat_value("Utilization"), Some("0.0%"));
    }

    #[test]
    fn uncertainty_template() {
        let state = ActionState::Success(Payload::Uncertainty(UncertaintyResult {
            mean: 0.645,
            std: 0.052,
        }));
        let fragment = render(Region::Uncertainty, &state).unwrap();
        assert_eq!(fragment.stat_value("Standard deviation"), Some("±5.2%"));
    }

    #[test]
    fn not_found_on_optional_feature_is_not_connected() {
        for kind in [ActionKind::Drift, ActionKind::CacheStats, ActionKind::Uncertainty] {
            let (tone, message) = describe_error(kind, &http(404, "Not Found"));
            assert_eq!(tone, Tone::Warning);
            assert!(message.contains("not connected"), "{message}");
            assert!(!message.contains("Network error"), "{message}");
        }
    }

    #[test]
    fn unreachable_optional_feature_is_not_connected() {
        let err = ActionError::from(TransportError::Network {
            message: "connection refused".into(),
        });
        let (tone, message) = describe_error(ActionKind::Drift, &err);
        assert_eq!(tone, Tone::Warning);
        assert!(message.starts_with("Drift detection is not connected"));
    }

    #[test]
    fn server_error_on_optional_feature_is_a_failure() {
        let (tone, message) = describe_error(ActionKind::CacheStats, &http(500, "Internal Server Error"));
        assert_eq!(tone, Tone::Error);
        assert_eq!(message, "Error 500: Internal Server Error");
    }

    #[test]
    fn not_found_on_core_action_is_a_failure() {
        let (tone, message) = describe_error(ActionKind::Recommend, &http(404, "Not Found"));
        assert_eq!(tone, Tone::Error);
        assert_eq!(message, "Error 404: Not Found");
    }

    #[test]
    fn validation_error_message() {
        let (tone, message) = describe_error(
            ActionKind::Upload,
            &ActionError::validation("Select a CSV file to upload"),
        );
        assert_eq!(tone, Tone::Error);
        assert_eq!(message, "Error: Select a CSV file to upload");
    }
}
