/// End-to-end dashboard tests against a stub service.
///
/// A `tiny_http` server on an ephemeral port plays the recommendation
/// service. It answers from a fixed route table and records the method,
/// path, headers and body of every request it receives.
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use ktdash::actions::request::{demo_recommendation, demo_uncertainty};
use ktdash::actions::{ActionKind, ActionRequest, ActionState, Dashboard, Payload};
use ktdash::analytics::ActionLog;
use ktdash::api::ApiClient;
use ktdash::api::types::Strategy;
use ktdash::config::schema::ApiConfig;
use ktdash::render::{MemoryTarget, Region, Regions, Tone};
use ktdash::theme::{Theme, ThemeStore};

// ---------------------------------------------------------------------------
// Stub service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

struct Stub {
    base_url: String,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

impl Stub {
    /// Serve `routes` of `(method, path, status, body)`. Anything else is 404.
    fn start(routes: Vec<(&'static str, &'static str, u16, &'static str)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        thread::spawn(move || {
            while let Ok(mut request) = server.recv() {
                let mut body = Vec::new();
                let _ = request.as_reader().read_to_end(&mut body);
                let method = request.method().to_string();
                let path = request.url().to_string();
                let headers = request
                    .headers()
                    .iter()
                    .map(|h| (h.field.to_string(), h.value.to_string()))
                    .collect();

                let (status, reply) = routes
                    .iter()
                    .find(|(m, p, _, _)| *m == method && *p == path)
                    .map(|(_, _, s, b)| (*s, *b))
                    .unwrap_or((404, r#"{"detail":"Not Found"}"#));

                log.lock().unwrap().push(Recorded {
                    method,
                    path,
                    headers,
                    body,
                });

                let content_type =
                    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .unwrap();
                let response = tiny_http::Response::from_string(reply)
                    .with_status_code(status)
                    .with_header(content_type);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            seen,
        }
    }

    fn requests(&self) -> Vec<Recorded> {
        self.seen.lock().unwrap().clone()
    }
}

fn dashboard(base_url: &str) -> Dashboard {
    let api = ApiConfig {
        base_url: base_url.to_string(),
        api_key: "troque_aqui".to_string(),
    };
    Dashboard::new(
        ApiClient::from_config(&api),
        Regions::headless(),
        ThemeStore::new(None),
        ActionLog::disabled(),
    )
}

const METRICS_BODY: &str = r#"{"auc_dkt":0.91,"accuracy_dkt":0.87,"avg_gain_dkt":0.34,"avg_gain_random":0.10,"avg_gain_heuristic":0.20,"time_to_master_mean_dkt":12.4}"#;

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[test]
fn every_request_carries_api_key() {
    let stub = Stub::start(vec![
        ("GET", "/health", 200, r#"{"status":"ok","timestamp":"2025-01-15T10:00:00"}"#),
        ("GET", "/check-drift", 200, r#"{"has_drift":false}"#),
    ]);
    let mut dash = dashboard(&stub.base_url);
    dash.invoke(ActionRequest::Health);
    dash.invoke(ActionRequest::Drift);

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.header("x-api-key"), Some("troque_aqui"));
        assert_eq!(request.method, "GET");
    }
}

#[test]
fn recommend_scenario() {
    let stub = Stub::start(vec![(
        "POST",
        "/infer",
        200,
        r#"{"item_id":"item_3","p_estimated":0.82,"rationale":"closest to target","strategy":"target"}"#,
    )]);
    let mut dash = dashboard(&stub.base_url);

    let state = dash.invoke(ActionRequest::Recommend(demo_recommendation(
        Strategy::Target,
        0.7,
    )));
    assert!(matches!(state, ActionState::Success(Payload::Recommendation(_))));

    let requests = stub.requests();
    let request = &requests[0];
    assert_eq!(request.path, "/infer");
    assert_eq!(request.header("content-type"), Some("application/json"));
    let body = request.json();
    assert_eq!(body["strategy"], "target");
    assert_eq!(body["target_p"], 0.7);
    assert_eq!(body["student_history"][0]["item_id"], "item_1");
    assert_eq!(body["student_history"][0]["correct"], 1);
    assert_eq!(body["student_history"][1]["correct"], 0);
    assert_eq!(body["candidate_items"], serde_json::json!(["item_3", "item_4", "item_5"]));

    let fragment = dash.regions().latest(Region::Recommendation).unwrap();
    assert_eq!(fragment.stat_value("Recommended item"), Some("item_3"));
    assert_eq!(fragment.stat_value("Estimated probability"), Some("82.0%"));
    assert!(fragment.notes.iter().any(|n| n.contains("closest to target")));
}

#[test]
fn upload_sends_multipart_file_field() {
    let stub = Stub::start(vec![(
        "POST",
        "/upload-csv",
        200,
        r#"{"n_students":4213,"n_items":17}"#,
    )]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interactions.csv");
    std::fs::write(&path, "student_id,item_id,correct\n1,item_1,1\n").unwrap();

    let mut dash = dashboard(&stub.base_url);
    dash.invoke(ActionRequest::Upload { file: Some(path) });

    let requests = stub.requests();
    let request = &requests[0];
    let content_type = request.header("content-type").unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = request.body_text();
    assert!(body.contains("name=\"file\"; filename=\"interactions.csv\""));
    assert!(body.contains("student_id,item_id,correct\n1,item_1,1\n"));

    let fragment = dash.regions().latest(Region::UploadStatus).unwrap();
    assert_eq!(fragment.tone, Tone::Success);
    assert_eq!(fragment.stat_value("Students"), Some("4213"));
    assert_eq!(fragment.stat_value("Items"), Some("17"));
}

#[test]
fn upload_without_file_issues_no_request() {
    let stub = Stub::start(vec![]);
    let mut dash = dashboard(&stub.base_url);

    let state = dash.invoke(ActionRequest::Upload { file: None });
    assert_eq!(state.error().unwrap().kind_name(), "validation");
    assert!(stub.requests().is_empty());

    let fragment = dash.regions().latest(Region::UploadStatus).unwrap();
    assert_eq!(fragment.tone, Tone::Error);
    assert_eq!(fragment.notes, vec!["Error: Select a CSV file to upload"]);
}

#[test]
fn uncertainty_request_body() {
    let stub = Stub::start(vec![("POST", "/uncertainty", 200, r#"{"mean":0.645,"std":0.052}"#)]);
    let mut dash = dashboard(&stub.base_url);
    dash.invoke(ActionRequest::Uncertainty(demo_uncertainty()));

    let body = stub.requests()[0].json();
    assert_eq!(body["candidate_item"], "item_3");
    assert_eq!(body["n_samples"], 10);
    assert_eq!(body["student_history"].as_array().unwrap().len(), 1);

    let fragment = dash.regions().latest(Region::Uncertainty).unwrap();
    assert_eq!(fragment.stat_value("Mean probability"), Some("64.5%"));
    assert_eq!(fragment.stat_value("Standard deviation"), Some("±5.2%"));
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[test]
fn startup_loads_metrics_and_chart() {
    let stub = Stub::start(vec![("GET", "/metrics", 200, METRICS_BODY)]);
    let mut dash = dashboard(&stub.base_url);
    assert_eq!(dash.startup(), Theme::Light);

    let fragment = dash.regions().latest(Region::Metrics).unwrap();
    assert_eq!(fragment.stat_value("AUC"), Some("0.910"));
    assert_eq!(fragment.stat_value("Accuracy"), Some("0.870"));
    assert_eq!(fragment.stat_value("Average gain (DKT)"), Some("0.340"));
    assert_eq!(fragment.stat_value("Time to mastery"), Some("12.4"));

    let chart = dash.chart().current().unwrap();
    assert_eq!(chart.labels(), vec!["DKT", "Random", "Heuristic"]);
    assert_eq!(chart.values(), vec![0.34, 0.10, 0.20]);
}

#[test]
fn metrics_reload_replaces_chart() {
    let stub = Stub::start(vec![("GET", "/metrics", 200, METRICS_BODY)]);
    let mut dash = dashboard(&stub.base_url);
    dash.invoke(ActionRequest::Metrics);
    dash.invoke(ActionRequest::Metrics);
    assert_eq!(dash.chart().generation(), 2);
}

#[test]
fn metrics_failure_is_not_rendered() {
    let stub = Stub::start(vec![("GET", "/metrics", 500, r#"{"detail":"boom"}"#)]);
    let memory = MemoryTarget::new();
    let mut regions = Regions::headless();
    regions.attach(Region::Metrics, Box::new(memory.clone()));
    let api = ApiConfig {
        base_url: stub.base_url.clone(),
        api_key: "k".into(),
    };
    let mut dash = Dashboard::new(
        ApiClient::from_config(&api),
        regions,
        ThemeStore::new(None),
        ActionLog::disabled(),
    );

    let state = dash.invoke(ActionRequest::Metrics);
    assert_eq!(state.error().unwrap().status(), Some(500));
    assert!(memory.history().is_empty());
    assert!(dash.chart().current().is_none());
}

// ---------------------------------------------------------------------------
// Optional diagnostics
// ---------------------------------------------------------------------------

#[test]
fn missing_optional_endpoints_render_not_connected() {
    let stub = Stub::start(vec![]);
    let mut dash = dashboard(&stub.base_url);

    for (request, region) in [
        (ActionRequest::Drift, Region::Drift),
        (ActionRequest::CacheStats, Region::CacheStats),
        (ActionRequest::Uncertainty(demo_uncertainty()), Region::Uncertainty),
    ] {
        let state = dash.invoke(request);
        assert_eq!(state.error().unwrap().status(), Some(404));

        let fragment = dash.regions().latest(region).unwrap();
        assert_eq!(fragment.tone, Tone::Warning);
        let text = fragment.plain_text();
        assert!(text.contains("not connected"), "{text}");
        assert!(!text.contains("Network error"), "{text}");
    }
}

#[test]
fn cache_stats_fill_missing_fields() {
    let stub = Stub::start(vec![("GET", "/cache-stats", 200, r#"{"n_entries":0}"#)]);
    let mut dash = dashboard(&stub.base_url);
    dash.invoke(ActionRequest::CacheStats);

    let fragment = dash.regions().latest(Region::CacheStats).unwrap();
    assert_eq!(fragment.stat_value("Entries"), Some("0"));
    assert_eq!(fragment.stat_value("Total size"), Some("0.00 MB"));
    assert_eq!(fragment.stat_value("Utilization"), Some("0.0%"));
}

#[test]
fn drift_detected_badge() {
    let stub = Stub::start(vec![("GET", "/check-drift", 200, r#"{"has_drift":true}"#)]);
    let mut dash = dashboard(&stub.base_url);
    dash.invoke(ActionRequest::Drift);

    let badge = dash.regions().latest(Region::Drift).unwrap().badge.clone().unwrap();
    assert_eq!(badge.text, "Drift detected");
    assert_eq!(badge.tone, Tone::Error);
}

// ---------------------------------------------------------------------------
// Failure kinds
// ---------------------------------------------------------------------------

#[test]
fn server_error_on_core_action_is_actionable() {
    let stub = Stub::start(vec![("POST", "/infer", 500, r#"{"detail":"model not loaded"}"#)]);
    let mut dash = dashboard(&stub.base_url);
    dash.invoke(ActionRequest::Recommend(demo_recommendation(Strategy::Random, 0.7)));

    let fragment = dash.regions().latest(Region::Recommendation).unwrap();
    assert_eq!(fragment.tone, Tone::Error);
    assert!(fragment.notes[0].starts_with("Error 500"), "{:?}", fragment.notes);
}

#[test]
fn non_json_success_body_is_decode_error() {
    let stub = Stub::start(vec![("GET", "/health", 200, "<html>ok</html>")]);
    let mut dash = dashboard(&stub.base_url);
    let state = dash.invoke(ActionRequest::Health);
    assert_eq!(state.error().unwrap().kind_name(), "decode");

    let fragment = dash.regions().latest(Region::Health).unwrap();
    assert!(fragment.notes[0].starts_with("Unexpected response from the service"));
}

#[test]
fn well_formed_json_of_the_wrong_shape_is_decode_error() {
    let stub = Stub::start(vec![("POST", "/infer", 200, r#"{"item_id":"x"}"#)]);
    let mut dash = dashboard(&stub.base_url);
    let state = dash.invoke(ActionRequest::Recommend(demo_recommendation(Strategy::Target, 0.7)));
    assert_eq!(state.error().unwrap().kind_name(), "decode");

    let fragment = dash.regions().latest(Region::Recommendation).unwrap();
    assert_eq!(fragment.tone, Tone::Error);
    assert!(
        fragment.notes[0].starts_with("Unexpected response from the service"),
        "{:?}",
        fragment.notes
    );
}

#[test]
fn redirect_status_without_location_is_http_error() {
    let stub = Stub::start(vec![("GET", "/check-drift", 300, r#"{"has_drift":true}"#)]);
    let mut dash = dashboard(&stub.base_url);
    let state = dash.invoke(ActionRequest::Drift);

    let error = state.error().unwrap();
    assert_eq!(error.kind_name(), "http");
    assert_eq!(error.status(), Some(300));
    let fragment = dash.regions().latest(Region::Drift).unwrap();
    assert!(fragment.badge.is_none());
    assert!(fragment.notes[0].starts_with("Error 300"), "{:?}", fragment.notes);
}

#[test]
fn unreachable_service_is_network_error() {
    let mut dash = dashboard("http://127.0.0.1:1");
    let state = dash.invoke(ActionRequest::Recommend(demo_recommendation(Strategy::Target, 0.7)));
    assert_eq!(state.error().unwrap().kind_name(), "network");

    let fragment = dash.regions().latest(Region::Recommendation).unwrap();
    assert!(fragment.notes[0].starts_with("Network error"));
}

#[test]
fn actions_render_only_into_their_own_region() {
    let stub = Stub::start(vec![("GET", "/check-drift", 200, r#"{"has_drift":false}"#)]);
    let mut dash = dashboard(&stub.base_url);
    dash.invoke(ActionRequest::Drift);

    for region in Region::ALL {
        let shown = dash.regions().latest(region).is_some();
        assert_eq!(shown, region == Region::Drift, "{region:?}");
    }
    assert!(dash.controller(ActionKind::Drift).unwrap().control().unwrap().enabled);
}

// ---------------------------------------------------------------------------
// Theme and action log
// ---------------------------------------------------------------------------

#[test]
fn theme_toggled_twice_restores_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.json");
    std::fs::write(&path, r#"{"theme":"dark","other":1}"#).unwrap();

    let mut store = ThemeStore::new(Some(path.clone()));
    assert_eq!(store.load(), Theme::Dark);
    assert_eq!(store.toggle().unwrap(), Theme::Light);
    assert_eq!(store.toggle().unwrap(), Theme::Dark);

    let stored: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored["theme"], "dark");
    assert_eq!(stored["other"], 1);
}

#[test]
fn settled_actions_are_logged() {
    let stub = Stub::start(vec![("GET", "/health", 200, r#"{"status":"ok"}"#)]);
    let dir = tempfile::tempdir().unwrap();
    let log = ActionLog::new(dir.path().join("action-log.jsonl"));
    let api = ApiConfig {
        base_url: stub.base_url.clone(),
        api_key: "k".into(),
    };
    let mut dash = Dashboard::new(
        ApiClient::from_config(&api),
        Regions::headless(),
        ThemeStore::new(None),
        log.clone(),
    );

    dash.invoke(ActionRequest::Health);
    dash.invoke(ActionRequest::Upload { file: None });

    let entries = log.read_all();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action, "health");
    assert!(entries[0].is_success());
    assert_eq!(entries[1].action, "upload");
    assert_eq!(entries[1].error_kind.as_deref(), Some("validation"));
}
