/// Action inputs, local validation, and dispatch to the API client.
///
/// [`ActionRequest::prepare`] performs every check that can fail without
/// the network (missing upload file, out-of-range `target_p`, empty
/// history). Only a [`PreparedRequest`] can reach [`PreparedRequest::execute`].
use std::fs;
use std::path::PathBuf;

use chrono::Utc;

use super::{ActionError, ActionKind, Payload};
use crate::api::ApiClient;
use crate::api::client::upload_file_name;
use crate::api::types::{
    DEFAULT_UNCERTAINTY_SAMPLES, RecommendationRequest, StudentHistoryEntry, Strategy,
    UncertaintyRequest,
};

/// An operator action with its inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionRequest {
    /// Upload a dataset. `None` means no file was selected.
    Upload { file: Option<PathBuf> },
    Recommend(RecommendationRequest),
    Metrics,
    Drift,
    CacheStats,
    Uncertainty(UncertaintyRequest),
    Health,
}

/// A request that passed local validation.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedRequest {
    Upload { file_name: String, contents: Vec<u8> },
    Recommend(RecommendationRequest),
    Metrics,
    Drift,
    CacheStats,
    Uncertainty(UncertaintyRequest),
    Health,
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Upload { .. } => ActionKind::Upload,
            Self::Recommend(_) => ActionKind::Recommend,
            Self::Metrics => ActionKind::Metrics,
            Self::Drift => ActionKind::Drift,
            Self::CacheStats => ActionKind::CacheStats,
            Self::Uncertainty(_) => ActionKind::Uncertainty,
            Self::Health => ActionKind::Health,
        }
    }

    /// Validate local preconditions and load any local input.
    pub fn prepare(self) -> Result<PreparedRequest, ActionError> {
        match self {
            Self::Upload { file } => {
                let path = file.ok_or_else(|| ActionError::validation("Select a CSV file to upload"))?;
                let contents = fs::read(&path).map_err(|e| {
                    ActionError::validation(format!("Cannot read {}: {e}", path.display()))
                })?;
                if contents.is_empty() {
                    return Err(ActionError::validation(format!(
                        "{} is empty",
                        path.display()
                    )));
                }
                Ok(PreparedRequest::Upload {
                    file_name: upload_file_name(&path),
                    contents,
                })
            }
            Self::Recommend(request) => {
                validate_history(&request.student_history, true)?;
                if request.candidate_items.is_empty() {
                    return Err(ActionError::validation(
                        "At least one candidate item is required",
                    ));
                }
                if !(0.0..=1.0).contains(&request.target_p) {
                    return Err(ActionError::validation(format!(
                        "target_p must be between 0 and 1, got {}",
                        request.target_p
                    )));
                }
                Ok(PreparedRequest::Recommend(request))
            }
            Self::Uncertainty(request) => {
                validate_history(&request.student_history, false)?;
                if request.candidate_item.trim().is_empty() {
                    return Err(ActionError::validation("A candidate item is required"));
                }
                if request.n_samples == 0 {
                    return Err(ActionError::validation("n_samples must be at least 1"));
                }
                Ok(PreparedRequest::Uncertainty(request))
            }
            Self::Metrics => Ok(PreparedRequest::Metrics),
            Self::Drift => Ok(PreparedRequest::Drift),
            Self::CacheStats => Ok(PreparedRequest::CacheStats),
            Self::Health => Ok(PreparedRequest::Health),
        }
    }
}

fn validate_history(history: &[StudentHistoryEntry], allow_empty: bool) -> Result<(), ActionError> {
    if !allow_empty && history.is_empty() {
        return Err(ActionError::validation("Student history must not be empty"));
    }
    if let Some(entry) = history.iter().find(|e| e.correct > 1) {
        return Err(ActionError::validation(format!(
            "correct must be 0 or 1 for {}, got {}",
            entry.item_id, entry.correct
        )));
    }
    Ok(())
}

impl PreparedRequest {
    /// Issue the request. One attempt, no retries.
    pub fn execute(self, client: &ApiClient) -> Result<Payload, ActionError> {
        let payload = match self {
            Self::Upload {
                file_name,
                contents,
            } => Payload::Upload(client.upload_csv(&file_name, contents)?),
            Self::Recommend(request) => Payload::Recommendation(client.infer(&request)?),
            Self::Metrics => Payload::Metrics(client.metrics()?),
            Self::Drift => Payload::Drift(client.check_drift()?),
            Self::CacheStats => Payload::CacheStats(client.cache_stats()?),
            Self::Uncertainty(request) => Payload::Uncertainty(client.uncertainty(&request)?),
            Self::Health => Payload::Health(client.health()?),
        };
        Ok(payload)
    }
}

// ---------------------------------------------------------------------------
// Input helpers
// ---------------------------------------------------------------------------

/// Parse a history spec like `item_1:1,item_2:0`.
///
/// `correct` accepts `1`/`0`, `true`/`false` and `y`/`n`. Entries are
/// stamped with the current time, in order.
pub fn parse_history(spec: &str) -> Result<Vec<StudentHistoryEntry>, String> {
    let now = Utc::now().to_rfc3339();
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (item, correct) = pair
                .rsplit_once(':')
                .ok_or_else(|| format!("expected ITEM:0|1, got '{pair}'"))?;
            let item = item.trim();
            if item.is_empty() {
                return Err(format!("missing item id in '{pair}'"));
            }
            let correct = match correct.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "y" => true,
                "0" | "false" | "n" => false,
                other => return Err(format!("expected 0 or 1 for {item}, got '{other}'")),
            };
            Ok(StudentHistoryEntry::new(item, correct).at(now.clone()))
        })
        .collect()
}

/// Parse a comma-separated item list, dropping blanks.
pub fn parse_items(spec: &str) -> Vec<String> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// The sample session used when the operator gives no history.
pub fn demo_history() -> Vec<StudentHistoryEntry> {
    let now = Utc::now().to_rfc3339();
    vec![
        StudentHistoryEntry::new("item_1", true).at(now.clone()),
        StudentHistoryEntry::new("item_2", false).at(now),
    ]
}

/// Candidate items used when the operator gives none.
pub fn demo_candidates() -> Vec<String> {
    vec!["item_3".into(), "item_4".into(), "item_5".into()]
}

/// Recommendation request over the demo session.
pub fn demo_recommendation(strategy: Strategy, target_p: f64) -> RecommendationRequest {
    RecommendationRequest {
        student_history: demo_history(),
        candidate_items: demo_candidates(),
        strategy,
        target_p,
    }
}

/// Uncertainty request over the demo session.
pub fn demo_uncertainty() -> UncertaintyRequest {
    UncertaintyRequest {
        student_history: vec![StudentHistoryEntry::new("item_1", true)],
        candidate_item: "item_3".into(),
        n_samples: DEFAULT_UNCERTAINTY_SAMPLES,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_without_file_fails_validation() {
        let err = ActionRequest::Upload { file: None }.prepare().unwrap_err();
        assert_eq!(err, ActionError::validation("Select a CSV file to upload"));
    }

    #[test]
    fn upload_of_missing_path_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("x.csv");
        let err = ActionRequest::Upload { file: Some(path) }
            .prepare()
            .unwrap_err();
        assert_eq!(err.kind_name(), "validation");
    }

    #[test]
    fn upload_reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("interactions.csv");
        fs::write(&path, "student_id,item_id\n1,a\n").unwrap();

        let prepared = ActionRequest::Upload { file: Some(path) }.prepare().unwrap();
        assert_eq!(
            prepared,
            PreparedRequest::Upload {
                file_name: "interactions.csv".into(),
                contents: b"student_id,item_id\n1,a\n".to_vec(),
            }
        );
    }

    #[test]
    fn recommend_rejects_out_of_range_target() {
        let request = demo_recommendation(Strategy::Target, 1.5);
        let err = ActionRequest::Recommend(request).prepare().unwrap_err();
        assert!(err.to_string().contains("target_p"));
    }

    #[test]
    fn recommend_rejects_empty_candidates() {
        let mut request = demo_recommendation(Strategy::Random, 0.7);
        request.candidate_items.clear();
        assert!(ActionRequest::Recommend(request).prepare().is_err());
    }

    #[test]
    fn uncertainty_requires_history() {
        let mut request = demo_uncertainty();
        request.student_history.clear();
        assert!(ActionRequest::Uncertainty(request).prepare().is_err());
    }

    #[test]
    fn parse_history_keeps_order() {
        let history = parse_history("item_1:1, item_2:0,item_9:true").unwrap();
        let items: Vec<_> = history.iter().map(|e| (e.item_id.as_str(), e.correct)).collect();
        assert_eq!(items, vec![("item_1", 1), ("item_2", 0), ("item_9", 1)]);
        assert!(history.iter().all(|e| e.timestamp.is_some()));
    }

    #[test]
    fn parse_history_rejects_bad_pairs() {
        assert!(parse_history("item_1").is_err());
        assert!(parse_history("item_1:2").is_err());
        assert!(parse_history(":1").is_err());
    }

    #[test]
    fn parse_items_drops_blanks() {
        assert_eq!(parse_items("a, b,,c "), vec!["a", "b", "c"]);
    }
}
