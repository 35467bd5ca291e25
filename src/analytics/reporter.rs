//! Action log reporter: per-action success rates, latency and failure kinds
//! for `ktdash stats`.

use std::collections::HashMap;

use serde::Serialize;

use crate::analytics::logger::{ActionLog, ActionLogEntry};

// ---------------------------------------------------------------------------
// Aggregated stats
// ---------------------------------------------------------------------------

/// Summary statistics for `ktdash stats`.
#[derive(Debug, Serialize)]
pub struct Stats {
    pub total_actions: usize,
    pub successes: usize,
    pub success_pct: f64,
    pub failure_kinds: FailureDistribution,
    pub action_stats: Vec<ActionStat>,
}

/// Per-action aggregated statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ActionStat {
    pub action: String,
    pub count: usize,
    pub successes: usize,
    pub failures: usize,
    pub success_pct: f64,
    pub avg_latency_ms: f64,
    /// Most frequent HTTP status among failures.
    pub common_status: Option<u16>,
}

/// How failures split across kinds.
#[derive(Debug, Default, Serialize)]
pub struct FailureDistribution {
    pub validation: usize,
    pub http: usize,
    pub network: usize,
    pub decode: usize,
}

impl FailureDistribution {
    pub fn total(&self) -> usize {
        self.validation + self.http + self.network + self.decode
    }

    /// Percentage for a given count, 0.0 if there are no failures.
    pub fn pct(&self, count: usize) -> f64 {
        pct(count, self.total())
    }
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

// ---------------------------------------------------------------------------
// Stats computation
// ---------------------------------------------------------------------------

/// Compute stats over `log`, optionally limited to the last `days` days.
pub fn compute_stats(log: &ActionLog, days: Option<u32>) -> Stats {
    build_stats(&log.read_since_days(days))
}

pub fn build_stats(entries: &[ActionLogEntry]) -> Stats {
    let total_actions = entries.len();
    let successes = entries.iter().filter(|e| e.is_success()).count();

    Stats {
        total_actions,
        successes,
        success_pct: pct(successes, total_actions),
        failure_kinds: compute_failure_distribution(entries),
        action_stats: compute_action_stats(entries),
    }
}

fn compute_failure_distribution(entries: &[ActionLogEntry]) -> FailureDistribution {
    let mut dist = FailureDistribution::default();
    for entry in entries.iter().filter(|e| !e.is_success()) {
        match entry.error_kind.as_deref() {
            Some("validation") => dist.validation += 1,
            Some("http") => dist.http += 1,
            Some("decode") => dist.decode += 1,
            _ => dist.network += 1,
        }
    }
    dist
}

/// Group entries by action. Sorted by count descending, then by name.
fn compute_action_stats(entries: &[ActionLogEntry]) -> Vec<ActionStat> {
    let mut groups: HashMap<&str, Vec<&ActionLogEntry>> = HashMap::new();
    for entry in entries {
        groups.entry(entry.action.as_str()).or_default().push(entry);
    }

    let mut stats: Vec<ActionStat> = groups
        .into_iter()
        .map(|(action, group)| {
            let count = group.len();
            let successes = group.iter().filter(|e| e.is_success()).count();
            let avg_latency_ms =
                group.iter().map(|e| e.latency_ms as f64).sum::<f64>() / count as f64;

            let mut status_counts: HashMap<u16, usize> = HashMap::new();
            for status in group.iter().filter_map(|e| e.status) {
                *status_counts.entry(status).or_default() += 1;
            }
            let common_status = status_counts
                .into_iter()
                .max_by_key(|&(status, c)| (c, std::cmp::Reverse(status)))
                .map(|(status, _)| status);

            ActionStat {
                action: action.to_string(),
                count,
                successes,
                failures: count - successes,
                success_pct: pct(successes, count),
                avg_latency_ms,
                common_status,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.action.cmp(&b.action)));
    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
