/// Display theme preference with file-backed persistence.
///
/// The preference lives under the `theme` key of a small JSON object
/// (`~/.ktdash/preferences.json` by default). Other keys in that file are
/// left untouched on write. Reads are lenient: a missing file, a malformed
/// file, or a value outside `light`/`dark` all load as [`Theme::Light`].
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::schema::{ThemeConfig, expand_home};

/// Key of the theme entry in the preference file.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applied theme plus the file it persists to.
///
/// A store without a path keeps the preference in memory only.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: Option<PathBuf>,
    applied: Theme,
}

impl ThemeStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            applied: Theme::default(),
        }
    }

    pub fn from_config(config: &ThemeConfig) -> Self {
        Self::new(expand_home(&config.path))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Currently applied theme.
    pub fn applied(&self) -> Theme {
        self.applied
    }

    /// Read the stored preference and apply it.
    pub fn load(&mut self) -> Theme {
        self.applied = self
            .path
            .as_deref()
            .and_then(read_preferences)
            .and_then(|prefs| prefs.get(THEME_KEY).and_then(Value::as_str).and_then(Theme::parse))
            .unwrap_or_default();
        self.applied
    }

    /// Flip the applied theme and persist the new value.
    ///
    /// The in-memory value flips even when the write fails; the error is
    /// returned so the caller can report it.
    pub fn toggle(&mut self) -> Result<Theme> {
        self.applied = self.applied.toggled();
        self.save()?;
        Ok(self.applied)
    }

    fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let mut prefs = read_preferences(path).unwrap_or_default();
        prefs.insert(
            THEME_KEY.to_string(),
            Value::String(self.applied.as_str().to_string()),
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&Value::Object(prefs))
            .context("failed to serialize preferences")?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }
}

fn read_preferences(path: &Path) -> Option<Map<String, Value>> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
