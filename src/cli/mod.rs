//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `ktdash upload|recommend|metrics|drift|cache-stats|uncertainty|health`
//! - `ktdash dashboard`: startup view with theme, metrics and the strategy chart
//! - `ktdash theme show|toggle`
//! - `ktdash stats`: per-action success rates and latency from the action log
//! - `ktdash config show|init|set|reset`: configuration management

use anyhow::{Result, anyhow};
use colored::Colorize;
use serde_json::json;

use crate::actions::request::{
    demo_candidates, demo_history, demo_uncertainty, parse_history, parse_items,
};
use crate::actions::{ActionKind, ActionRequest, Dashboard};
use crate::analytics::ActionLog;
use crate::analytics::reporter::{self, Stats};
use crate::api::types::{RecommendationRequest, Strategy, UncertaintyRequest};
use crate::chart::MetricsChart;
use crate::config;
use crate::config::schema::expand_home;
use crate::render::{OutputFormat, Region, Regions};
use crate::theme::{Theme, ThemeStore};

/// Width of the terminal strategy chart, in cells.
const CHART_WIDTH: usize = 40;

// ---------------------------------------------------------------------------
// Building action requests from arguments
// ---------------------------------------------------------------------------

/// Recommendation request from CLI arguments. Missing history or candidates
/// fall back to the demo session.
pub fn build_recommend(
    strategy: &str,
    target_p: f64,
    history: Option<&str>,
    candidates: Option<&str>,
) -> Result<ActionRequest> {
    let strategy: Strategy = strategy.parse().map_err(|e: String| anyhow!(e))?;
    let student_history = match history {
        Some(spec) => parse_history(spec).map_err(|e| anyhow!("invalid --history: {e}"))?,
        None => demo_history(),
    };
    let candidate_items = match candidates {
        Some(spec) => parse_items(spec),
        None => demo_candidates(),
    };

    Ok(ActionRequest::Recommend(RecommendationRequest {
        student_history,
        candidate_items,
        strategy,
        target_p,
    }))
}

/// Uncertainty request from CLI arguments, defaulting to the demo session.
pub fn build_uncertainty(
    history: Option<&str>,
    candidate: Option<&str>,
    samples: u32,
) -> Result<ActionRequest> {
    let demo = demo_uncertainty();
    let student_history = match history {
        Some(spec) => parse_history(spec).map_err(|e| anyhow!("invalid --history: {e}"))?,
        None => demo.student_history,
    };

    Ok(ActionRequest::Uncertainty(UncertaintyRequest {
        student_history,
        candidate_item: candidate.map_or(demo.candidate_item, str::to_string),
        n_samples: samples,
    }))
}

// ---------------------------------------------------------------------------
// ktdash <action>
// ---------------------------------------------------------------------------

/// Run a single action and print its outcome.
///
/// Returns `Ok(false)` when the action ended in the error state.
pub fn run_action(request: ActionRequest, format: OutputFormat) -> Result<bool> {
    let config = config::load();
    let regions = match format {
        OutputFormat::Json => Regions::headless(),
        _ => Regions::terminal(format),
    };
    let mut dashboard = Dashboard::from_config(&config, regions);

    let kind = request.kind();
    let succeeded = dashboard.invoke(request).error().is_none();

    let chart = match kind {
        ActionKind::Metrics => dashboard.chart().current(),
        _ => None,
    };

    match format {
        OutputFormat::Json => {
            let mut value = dashboard.state(kind).to_json(kind);
            if let Some(fragment) = dashboard.regions().latest(Region::for_action(kind)) {
                value["display"] = json!(fragment.plain_text());
            }
            if let Some(chart) = chart {
                value["chart"] = chart.to_chartjs();
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Html => {
            if let Some(chart) = chart {
                println!("{}", chart_html(chart));
            }
        }
        OutputFormat::Text => {
            if let Some(chart) = chart {
                println!();
                println!("{}", chart.to_terminal(CHART_WIDTH));
            }
        }
    }

    Ok(succeeded)
}

// ---------------------------------------------------------------------------
// ktdash dashboard
// ---------------------------------------------------------------------------

/// Show the startup view: applied theme, metrics, chart and available actions.
pub fn run_dashboard(format: OutputFormat) -> Result<()> {
    let config = config::load();
    let mut dashboard = Dashboard::from_config(&config, Regions::headless());
    let theme = dashboard.startup();

    let metrics = dashboard.regions().latest(Region::Metrics);
    let chart = dashboard.chart().current();

    match format {
        OutputFormat::Json => {
            let controls: Vec<_> = ActionKind::ALL
                .into_iter()
                .filter_map(|kind| {
                    let control = dashboard.controller(kind)?.control()?;
                    Some(json!({
                        "action": kind.name(),
                        "label": control.label,
                        "enabled": control.enabled,
                    }))
                })
                .collect();
            let value = json!({
                "service": dashboard.client().base_url(),
                "theme": theme.as_str(),
                "metrics": dashboard.state(ActionKind::Metrics).to_json(ActionKind::Metrics),
                "chart": chart.map(MetricsChart::to_chartjs),
                "controls": controls,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Html => {
            let class = match theme {
                Theme::Dark => " class=\"dark-mode\"",
                Theme::Light => "",
            };
            println!("<body{class}>");
            if let Some(fragment) = metrics {
                println!("{}", fragment.to_html());
            }
            if let Some(chart) = chart {
                println!("{}", chart_html(chart));
            }
            println!("</body>");
        }
        OutputFormat::Text => {
            println!("{}", "Knowledge Tracing Dashboard".bold().cyan());
            println!("{}", "=".repeat(50));
            println!("  {} {}", "Service:".bold(), dashboard.client().base_url());
            println!("  {} {}", "Theme:  ".bold(), theme);
            println!();

            match metrics {
                Some(fragment) => println!("{}", fragment.to_terminal()),
                None => println!(
                    "  {}",
                    "Metrics unavailable (see warning above).".dimmed()
                ),
            }
            if let Some(chart) = chart {
                println!();
                println!("{}", chart.to_terminal(CHART_WIDTH));
            }

            println!();
            println!("{}", "Actions".bold().cyan());
            for kind in ActionKind::ALL {
                if let Some(control) = dashboard.controller(kind).and_then(|c| c.control()) {
                    println!("  {:<22} ktdash {}", control.label, kind.name().dimmed());
                }
            }
        }
    }

    Ok(())
}

fn chart_html(chart: &MetricsChart) -> String {
    format!(
        "<canvas id=\"strategyChart\"></canvas>\n<script>new Chart(document.getElementById('strategyChart'), {});</script>",
        chart.to_chartjs()
    )
}

// ---------------------------------------------------------------------------
// ktdash theme show | toggle
// ---------------------------------------------------------------------------

pub fn run_theme_show() -> Result<()> {
    let mut store = ThemeStore::from_config(&config::load().theme);
    let theme = store.load();
    println!("{} {}", "Theme:".bold(), theme);
    if let Some(path) = store.path() {
        println!("  {}", path.display().to_string().dimmed());
    }
    Ok(())
}

/// Flip the stored theme.
pub fn run_theme_toggle() -> Result<()> {
    let mut store = ThemeStore::from_config(&config::load().theme);
    store.load();
    let theme = store.toggle()?;
    println!("{} Theme set to {}", "✓".green().bold(), theme.to_string().bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// ktdash stats
// ---------------------------------------------------------------------------

/// Show per-action statistics from the action log.
pub fn run_stats(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let config = config::load();
    let log = expand_home(&config.logging.path)
        .map(ActionLog::new)
        .unwrap_or_default();
    let stats = reporter::compute_stats(&log, days);

    if stats.total_actions == 0 {
        println!(
            "{}",
            "No data yet. Run some actions through ktdash to see stats.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        _ => print_stats_table(&stats),
    }

    Ok(())
}

fn print_stats_table(stats: &Stats) {
    println!("{}", "ktdash Action Report".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    println!("  {} {}", "Total actions:".bold(), stats.total_actions);
    println!("  {} {:.1}%", "Success rate: ".bold(), stats.success_pct);
    println!();

    let dist = &stats.failure_kinds;
    if dist.total() > 0 {
        println!("{}", "Failure Kinds".bold().cyan());
        println!(
            "  Validation: {} ({:.0}%)  HTTP: {} ({:.0}%)  Network: {} ({:.0}%)  Decode: {} ({:.0}%)",
            dist.validation,
            dist.pct(dist.validation),
            dist.http,
            dist.pct(dist.http),
            dist.network,
            dist.pct(dist.network),
            dist.decode,
            dist.pct(dist.decode),
        );
        println!();
    }

    println!("{}", "Per Action".bold().cyan());
    println!(
        "  {:<14} {:>6} {:>9} {:>12} Status",
        "Action", "Count", "Success", "Avg latency"
    );
    println!("  {}", "-".repeat(52));

    for (i, stat) in stats.action_stats.iter().enumerate() {
        let line = format!(
            "  {:<14} {:>6} {:>8.1}% {:>10.0}ms {}",
            stat.action,
            stat.count,
            stat.success_pct,
            stat.avg_latency_ms,
            stat.common_status
                .map_or_else(|| "-".to_string(), |s| s.to_string()),
        );

        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

// ---------------------------------------------------------------------------
// ktdash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective configuration and where it came from.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective ktdash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.ktdash/config.toml");
    print_source(project_exists, ".ktdash.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "KTDASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.ktdash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!(
        "  {}",
        "Set api.base_url and api.api_key to point at your deployment.".dimmed()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
