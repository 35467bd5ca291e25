//! Strategy comparison chart built from the metrics payload.
//!
//! The chart is a plain data model with two encodings: a Chart.js bar
//! config for the HTML dashboard and horizontal bars for the terminal.
//! [`ChartSlot`] holds at most one live chart; every metrics load replaces it.

use colored::Colorize;
use serde_json::{Value, json};

use crate::api::types::MetricsResponse;

pub const CHART_TITLE: &str = "Strategy comparison";
pub const SERIES_LABEL: &str = "Average skill gain";

const DKT_COLOR: &str = "rgba(59, 130, 246, 0.8)";
const RANDOM_COLOR: &str = "rgba(239, 68, 68, 0.8)";
const HEURISTIC_COLOR: &str = "rgba(16, 185, 129, 0.8)";

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: &'static str,
    pub value: f64,
    pub color: &'static str,
}

/// Average skill gain per policy, in fixed order: DKT, Random, Heuristic.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsChart {
    pub title: &'static str,
    pub series_label: &'static str,
    pub bars: [Bar; 3],
}

impl MetricsChart {
    pub fn from_metrics(metrics: &MetricsResponse) -> Self {
        Self {
            title: CHART_TITLE,
            series_label: SERIES_LABEL,
            bars: [
                Bar {
                    label: "DKT",
                    value: metrics.avg_gain_dkt,
                    color: DKT_COLOR,
                },
                Bar {
                    label: "Random",
                    value: metrics.avg_gain_random,
                    color: RANDOM_COLOR,
                },
                Bar {
                    label: "Heuristic",
                    value: metrics.avg_gain_heuristic,
                    color: HEURISTIC_COLOR,
                },
            ],
        }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.bars.iter().map(|b| b.label).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.value).collect()
    }

    /// Chart.js bar chart configuration.
    pub fn to_chartjs(&self) -> Value {
        json!({
            "type": "bar",
            "data": {
                "labels": self.labels(),
                "datasets": [{
                    "label": self.series_label,
                    "data": self.values(),
                    "backgroundColor": self.bars.iter().map(|b| b.color).collect::<Vec<_>>(),
                }],
            },
            "options": {
                "responsive": true,
                "plugins": {
                    "title": { "display": true, "text": self.title },
                },
                "scales": {
                    "y": { "beginAtZero": true },
                },
            },
        })
    }

    /// Horizontal bars scaled so the largest value spans `width` cells.
    /// Negative values draw as empty bars.
    pub fn to_terminal(&self, width: usize) -> String {
        let max = self
            .bars
            .iter()
            .map(|b| b.value)
            .fold(0.0_f64, f64::max);
        let label_width = self.bars.iter().map(|b| b.label.len()).max().unwrap_or(0);

        let mut lines = vec![self.title.bold().to_string()];
        for bar in &self.bars {
            let cells = if max > 0.0 && bar.value > 0.0 {
                ((bar.value / max) * width as f64).round() as usize
            } else {
                0
            };
            let fill = "█".repeat(cells);
            let painted = match bar.label {
                "DKT" => fill.blue(),
                "Random" => fill.red(),
                _ => fill.green(),
            };
            lines.push(format!(
                "  {:<label_width$}  {} {:.3}",
                bar.label, painted, bar.value
            ));
        }
        lines.join("\n")
    }
}

/// Holder for the single live chart.
#[derive(Debug, Default)]
pub struct ChartSlot {
    current: Option<MetricsChart>,
    generation: u64,
}

impl ChartSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the existing chart, if any, and install `chart`.
    pub fn replace(&mut self, chart: MetricsChart) {
        self.current = Some(chart);
        self.generation += 1;
    }

    pub fn current(&self) -> Option<&MetricsChart> {
        self.current.as_ref()
    }

    /// Number of charts installed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
