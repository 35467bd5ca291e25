use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use ktdash::actions::ActionRequest;
use ktdash::api::types::DEFAULT_UNCERTAINTY_SAMPLES;
use ktdash::cli;
use ktdash::render::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "ktdash")]
#[command(about = "Operator console for a knowledge-tracing recommendation service")]
struct App {
    /// Output format: text (default), html, json
    #[arg(long, global = true, default_value = "text")]
    format: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload an interaction dataset (CSV) to the service
    Upload {
        /// The CSV file to upload
        file: Option<PathBuf>,
    },
    /// Ask for the next item to present to a student
    Recommend {
        /// target, info-gain, exploration, heuristic or random
        #[arg(long, default_value = "target")]
        strategy: String,
        /// Desired success probability for the target strategy
        #[arg(long, default_value = "0.7")]
        target_p: f64,
        /// Answer history as ITEM:0|1 pairs, e.g. item_1:1,item_2:0
        #[arg(long)]
        history: Option<String>,
        /// Comma-separated candidate items
        #[arg(long)]
        candidates: Option<String>,
    },
    /// Show model metrics and the strategy comparison chart
    Metrics,
    /// Check for distribution drift in recent interactions
    Drift,
    /// Show prediction cache statistics
    CacheStats,
    /// Estimate prediction uncertainty with MC Dropout
    Uncertainty {
        /// Answer history as ITEM:0|1 pairs
        #[arg(long)]
        history: Option<String>,
        /// Item to predict
        #[arg(long)]
        candidate: Option<String>,
        /// Number of stochastic forward passes
        #[arg(long, default_value_t = DEFAULT_UNCERTAINTY_SAMPLES)]
        samples: u32,
    },
    /// Check that the service is up
    Health,
    /// Startup view: theme, metrics and available actions
    Dashboard,
    /// Show or toggle the display theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Show per-action statistics from the action log
    Stats {
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ThemeAction {
    /// Show the stored theme
    Show,
    /// Switch between light and dark
    Toggle,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.ktdash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a value by dotted key, e.g. api.base_url
    Set { key: String, value: String },
    /// Restore the default config file
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();
    let format = OutputFormat::from_str_opt(Some(&app.format));

    let request = match app.command {
        Commands::Upload { file } => ActionRequest::Upload { file },
        Commands::Recommend {
            strategy,
            target_p,
            history,
            candidates,
        } => cli::build_recommend(
            &strategy,
            target_p,
            history.as_deref(),
            candidates.as_deref(),
        )?,
        Commands::Metrics => ActionRequest::Metrics,
        Commands::Drift => ActionRequest::Drift,
        Commands::CacheStats => ActionRequest::CacheStats,
        Commands::Uncertainty {
            history,
            candidate,
            samples,
        } => cli::build_uncertainty(history.as_deref(), candidate.as_deref(), samples)?,
        Commands::Health => ActionRequest::Health,
        Commands::Dashboard => return cli::run_dashboard(format),
        Commands::Theme { action } => {
            return match action {
                ThemeAction::Show => cli::run_theme_show(),
                ThemeAction::Toggle => cli::run_theme_toggle(),
            };
        }
        Commands::Stats { days } => return cli::run_stats(format, days),
        Commands::Config { action } => {
            return match action {
                ConfigAction::Show => cli::run_config_show(),
                ConfigAction::Init { force } => cli::run_config_init(force),
                ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
                ConfigAction::Reset => cli::run_config_reset(),
            };
        }
    };

    if !cli::run_action(request, format)? {
        std::process::exit(1);
    }
    Ok(())
}
