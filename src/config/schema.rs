/// Configuration schema and defaults for ktdash.
///
/// Sections: `[api]`, `[theme]`, `[logging]`. Every field has a built-in
/// default; users only set what they want to override.
use serde::{Deserialize, Serialize};

/// Address of a locally running service.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Credential the service ships with until an operator changes it.
pub const DEFAULT_API_KEY: &str = "troque_aqui";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level ktdash configuration, mapping to `~/.ktdash/config.toml` and
/// `.ktdash.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub api: ApiConfig,
    pub theme: ThemeConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Target deployment of the recommendation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base address; endpoint paths are appended to it.
    pub base_url: String,
    /// Static credential sent as `x-api-key`.
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [theme]
// ---------------------------------------------------------------------------

/// Where the display preference is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Preference file. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            path: "~/.ktdash/preferences.json".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Action log settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether settled actions are appended to the log.
    pub enabled: bool,
    /// Path to the JSONL action log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.ktdash/action-log.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl DashboardConfig {
    /// Annotated default config file content, written by `ktdash config init`.
    pub fn default_toml() -> String {
        r#"# ktdash configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (KTDASH_API_URL, KTDASH_API_KEY, KTDASH_LOGGING)
#   2. Project config (.ktdash.toml in current directory)
#   3. User global config (~/.ktdash/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:8000"
api_key = "troque_aqui"             # must match the service's SECRET_API_KEY

[theme]
path = "~/.ktdash/preferences.json"

[logging]
enabled = true
path = "~/.ktdash/action-log.jsonl"
"#
        .to_string()
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> Option<std::path::PathBuf> {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir().map(|home| home.join(rest))
    } else if path == "~" {
        dirs::home_dir()
    } else {
        Some(std::path::PathBuf::from(path))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_toml_parses_back() {
        let toml_str = DashboardConfig::default_toml();
        let config: DashboardConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: DashboardConfig = toml::from_str(
            r#"
[api]
base_url = "https://kt.example.org"
"#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://kt.example.org");
        assert_eq!(config.api.api_key, DEFAULT_API_KEY);
        assert!(config.logging.enabled);
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(
            expand_home("/var/log/ktdash.jsonl"),
            Some(std::path::PathBuf::from("/var/log/ktdash.jsonl"))
        );
    }
}
