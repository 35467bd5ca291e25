/// Configuration system for ktdash.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: [`schema::DashboardConfig::default()`]
/// 2. **User global config**: `~/.ktdash/config.toml`
/// 3. **Project local config**: `.ktdash.toml` in the current working directory
/// 4. **Environment variables**: `KTDASH_*` overrides (highest precedence)
///
/// The resolved config is passed explicitly to the components that need it
/// (the API client takes an [`schema::ApiConfig`]); nothing reads it from a
/// global.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::DashboardConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Files merge key by key, so a project file that only sets
/// `[logging]` keeps the `[api]` values from the global file.
pub fn load() -> DashboardConfig {
    let mut config = load_layers(&[global_config_path(), project_config_path()]);
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files over the built-in defaults, later files winning.
fn load_layers(paths: &[Option<PathBuf>]) -> DashboardConfig {
    let defaults = DashboardConfig::default();
    let Ok(mut merged) = toml::Value::try_from(&defaults) else {
        return defaults;
    };

    for path in paths.iter().flatten() {
        if let Some(layer) = load_toml_file(path) {
            merge_toml(&mut merged, layer);
        }
    }

    merged.try_into().unwrap_or_else(|e| {
        eprintln!("[ktdash] ignoring config files: {e}");
        defaults
    })
}

/// Read a TOML config file as a raw value tree (if it exists).
///
/// Malformed files, including ones whose values do not fit the schema, are
/// reported on stderr and skipped so a bad edit never locks the operator out
/// of the dashboard.
fn load_toml_file(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    let parsed = toml::from_str::<toml::Value>(&content).and_then(|value| {
        value
            .clone()
            .try_into::<DashboardConfig>()
            .map(|_| value)
    });
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            eprintln!("[ktdash] ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

/// Overlay `layer` onto `base`: tables merge recursively, any other value
/// replaces what was there.
fn merge_toml(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base), toml::Value::Table(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.ktdash/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ktdash").join("config.toml"))
}

/// Path to the project local config: `.ktdash.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".ktdash.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// - `KTDASH_API_URL`: service base address
/// - `KTDASH_API_KEY`: credential sent as `x-api-key`
/// - `KTDASH_LOGGING`: action log on/off (`1`/`true`/`yes`/`on`)
fn apply_env_overrides(config: &mut DashboardConfig) {
    if let Ok(val) = std::env::var("KTDASH_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("KTDASH_API_KEY")
        && !val.is_empty()
    {
        config.api.api_key = val;
    }
    if let Ok(val) = std::env::var("KTDASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.ktdash/config.toml`.
///
/// Fails if the file already exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.ktdash/ directory")?;
    }

    fs::write(&path, DashboardConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single dotted key (e.g. `api.base_url`) in the global config file.
pub fn set_config_value(key: &str, value: &str) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&DashboardConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that no longer deserialize into the schema.
    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    let _: DashboardConfig =
        toml::from_str(&updated).with_context(|| format!("invalid value for '{key}'"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, updated).context("failed to write config file")?;

    Ok(path)
}

/// Set a value in a TOML value tree using a dotted key path.
///
/// Missing sections are created; the new value takes the type of the value
/// it replaces (booleans, integers, floats), strings otherwise.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((&leaf, sections)) = parts.split_last() else {
        anyhow::bail!("empty config key");
    };

    let mut current = root;
    for &part in sections {
        let table = current
            .as_table_mut()
            .with_context(|| format!("expected table above '{part}' in '{key}'"))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
