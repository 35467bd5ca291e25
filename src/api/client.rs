/// HTTP client for the recommendation service.
///
/// Built from an [`ApiConfig`] and reused for every action of a dashboard
/// session. Uses the synchronous `ureq` agent with its default timeouts;
/// each call is a single attempt.
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{Result, TransportError};
use super::multipart::Form;
use super::types::{
    CacheStats, DriftResult, HealthStatus, MetricsResponse, RecommendationRequest,
    RecommendationResponse, UncertaintyRequest, UncertaintyResult, UploadResult,
};
use crate::config::schema::ApiConfig;

/// Credential header attached to every request.
pub const API_KEY_HEADER: &str = "x-api-key";

pub const UPLOAD_PATH: &str = "/upload-csv";
pub const INFER_PATH: &str = "/infer";
pub const METRICS_PATH: &str = "/metrics";
pub const DRIFT_PATH: &str = "/check-drift";
pub const CACHE_STATS_PATH: &str = "/cache-stats";
pub const UNCERTAINTY_PATH: &str = "/uncertainty";
pub const HEALTH_PATH: &str = "/health";

/// HTTP methods used by the service contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Request body variants.
#[derive(Debug, Clone)]
pub enum Body {
    /// Serialized as JSON with `Content-Type: application/json`.
    Json(Value),
    /// Encoded as `multipart/form-data`.
    Multipart(Form),
}

/// Synchronous client bound to one deployment.
#[derive(Debug, Clone)]
pub struct ApiClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl ApiClient {
    /// Build a client from the resolved config.
    pub fn from_config(config: &ApiConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Issue one request and decode the JSON body of a 2xx response.
    pub fn send(&self, endpoint: &str, method: Method, body: Option<Body>) -> Result<Value> {
        let url = self.url(endpoint);
        let request = self
            .agent
            .request(method.as_str(), &url)
            .set(API_KEY_HEADER, &self.api_key);

        let result = match body {
            None => request.call(),
            Some(Body::Json(value)) => request
                .set("Content-Type", "application/json")
                .send_string(&value.to_string()),
            Some(Body::Multipart(form)) => request
                .set("Content-Type", &form.content_type())
                .send_bytes(&form.encode()),
        };

        let response = result.map_err(TransportError::from)?;
        // ureq only reports 4xx/5xx as errors; anything else outside 2xx lands here.
        if !(200..300).contains(&response.status()) {
            return Err(TransportError::Http {
                status: response.status(),
                status_text: response.status_text().to_string(),
            });
        }
        let text = response
            .into_string()
            .map_err(|e| TransportError::Network {
                message: format!("failed to read response body: {e}"),
            })?;

        serde_json::from_str(&text).map_err(|e| TransportError::Decode {
            message: e.to_string(),
        })
    }

    fn send_typed<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Body>,
    ) -> Result<T> {
        let value = self.send(endpoint, method, body)?;
        serde_json::from_value(value).map_err(|e| TransportError::Decode {
            message: format!("{endpoint}: {e}"),
        })
    }

    fn json_body<T: serde::Serialize>(payload: &T) -> Result<Body> {
        serde_json::to_value(payload)
            .map(Body::Json)
            .map_err(|e| TransportError::Decode {
                message: format!("failed to encode request: {e}"),
            })
    }

    /// `POST /upload-csv` with the file in form field `file`.
    pub fn upload_csv(&self, file_name: &str, contents: Vec<u8>) -> Result<UploadResult> {
        let form = Form::new().file("file", file_name, "text/csv", contents);
        self.send_typed(UPLOAD_PATH, Method::Post, Some(Body::Multipart(form)))
    }

    /// `POST /infer`.
    pub fn infer(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        let body = Self::json_body(request)?;
        self.send_typed(INFER_PATH, Method::Post, Some(body))
    }

    /// `GET /metrics`.
    pub fn metrics(&self) -> Result<MetricsResponse> {
        self.send_typed(METRICS_PATH, Method::Get, None)
    }

    /// `GET /check-drift`.
    pub fn check_drift(&self) -> Result<DriftResult> {
        self.send_typed(DRIFT_PATH, Method::Get, None)
    }

    /// `GET /cache-stats`.
    pub fn cache_stats(&self) -> Result<CacheStats> {
        self.send_typed(CACHE_STATS_PATH, Method::Get, None)
    }

    /// `POST /uncertainty`.
    pub fn uncertainty(&self, request: &UncertaintyRequest) -> Result<UncertaintyResult> {
        let body = Self::json_body(request)?;
        self.send_typed(UNCERTAINTY_PATH, Method::Post, Some(body))
    }

    /// `GET /health`.
    pub fn health(&self) -> Result<HealthStatus> {
        self.send_typed(HEALTH_PATH, Method::Get, None)
    }
}

/// File name to report in the upload form for `path`.
pub fn upload_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
