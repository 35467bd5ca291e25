/// The dashboard: one controller per action plus everything an invocation
/// touches (API client, output regions, metrics chart, theme, action log).
///
/// [`Dashboard::invoke`] runs an action to completion. [`Dashboard::begin`]
/// and [`Dashboard::settle`] expose the two halves separately so that
/// overlapping invocations can be driven explicitly.
use std::collections::HashMap;
use std::time::Instant;

use super::request::PreparedRequest;
use super::{ActionController, ActionError, ActionKind, ActionRequest, ActionState, Payload, Ticket};
use crate::analytics::{ActionLog, ActionLogEntry};
use crate::api::ApiClient;
use crate::chart::{ChartSlot, MetricsChart};
use crate::config::schema::DashboardConfig;
use crate::render::{self, Region, Regions};
use crate::theme::{Theme, ThemeStore};

static IDLE: ActionState = ActionState::Idle;

pub struct Dashboard {
    client: ApiClient,
    controllers: HashMap<ActionKind, ActionController>,
    started: HashMap<ActionKind, Instant>,
    regions: Regions,
    chart: ChartSlot,
    theme: ThemeStore,
    log: ActionLog,
}

impl Dashboard {
    pub fn new(client: ApiClient, regions: Regions, theme: ThemeStore, log: ActionLog) -> Self {
        let controllers = ActionKind::ALL
            .into_iter()
            .map(|kind| (kind, ActionController::new(kind)))
            .collect();
        Self {
            client,
            controllers,
            started: HashMap::new(),
            regions,
            chart: ChartSlot::new(),
            theme,
            log,
        }
    }

    pub fn from_config(config: &DashboardConfig, regions: Regions) -> Self {
        Self::new(
            ApiClient::from_config(&config.api),
            regions,
            ThemeStore::from_config(&config.theme),
            ActionLog::from_config(&config.logging),
        )
    }

    /// Apply the stored theme, then load metrics without operator input.
    pub fn startup(&mut self) -> Theme {
        let theme = self.theme.load();
        self.invoke(ActionRequest::Metrics);
        theme
    }

    /// Run `request` to completion and return the action's final state.
    pub fn invoke(&mut self, request: ActionRequest) -> &ActionState {
        let kind = request.kind();
        match request.prepare() {
            Ok(prepared) => {
                let ticket = self.begin(kind);
                let outcome = self.execute(prepared);
                self.settle(ticket, outcome);
            }
            Err(err) => self.reject(kind, err),
        }
        self.state(kind)
    }

    /// Issue `prepared` against the service without touching any state.
    pub fn execute(&self, prepared: PreparedRequest) -> Result<Payload, ActionError> {
        prepared.execute(&self.client)
    }

    /// Start an invocation of `kind` and show its loading indicator.
    pub fn begin(&mut self, kind: ActionKind) -> Ticket {
        let ticket = self.controller_mut(kind).begin();
        self.started.insert(kind, Instant::now());
        self.publish(kind);
        ticket
    }

    /// Settle the invocation behind `ticket`. Returns `false` when a later
    /// invocation superseded it; nothing is rendered or logged then.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<Payload, ActionError>) -> bool {
        let kind = ticket.kind();
        if !self.controller_mut(kind).settle(ticket, outcome) {
            return false;
        }

        let latency_ms = self
            .started
            .remove(&kind)
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.finish(kind, latency_ms);
        true
    }

    fn reject(&mut self, kind: ActionKind, err: ActionError) {
        self.controller_mut(kind).reject(err);
        self.started.remove(&kind);
        self.finish(kind, 0);
    }

    fn finish(&mut self, kind: ActionKind, latency_ms: u64) {
        let state = self.state(kind);
        if let Some(entry) = ActionLogEntry::from_state(kind, state, latency_ms) {
            self.log.record(&entry);
        }

        let chart = match state {
            ActionState::Success(Payload::Metrics(metrics)) => Some(MetricsChart::from_metrics(metrics)),
            _ => None,
        };
        if let ActionState::Error(err) = state
            && kind.is_silent()
        {
            eprintln!("[ktdash] warning: could not load {}: {err}", kind.name());
        }
        if let Some(chart) = chart {
            self.chart.replace(chart);
        }

        self.publish(kind);
    }

    /// Render the action's state into its region. Silent actions only
    /// ever show a successful result.
    fn publish(&mut self, kind: ActionKind) {
        let state = self.state(kind);
        if kind.is_silent() && state.payload().is_none() {
            return;
        }
        let region = Region::for_action(kind);
        if let Some(fragment) = render::render(region, state) {
            self.regions.show(fragment);
        }
    }

    pub fn state(&self, kind: ActionKind) -> &ActionState {
        self.controllers
            .get(&kind)
            .map(ActionController::state)
            .unwrap_or(&IDLE)
    }

    pub fn controller(&self, kind: ActionKind) -> Option<&ActionController> {
        self.controllers.get(&kind)
    }

    fn controller_mut(&mut self, kind: ActionKind) -> &mut ActionController {
        self.controllers
            .entry(kind)
            .or_insert_with(|| ActionController::new(kind))
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn chart(&self) -> &ChartSlot {
        &self.chart
    }

    pub fn regions(&self) -> &Regions {
        &self.regions
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("client", &self.client)
            .field("controllers", &self.controllers)
            .field("regions", &self.regions)
            .field("chart", &self.chart)
            .field("theme", &self.theme)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TransportError;
    use crate::api::types::{DriftResult, MetricsResponse};
    use crate::config::schema::ApiConfig;
    use crate::render::Tone;

    /// Points at a closed port so any request fails fast.
    fn offline_dashboard() -> Dashboard {
        let api = ApiConfig {
            base_url: "http://127.0.0.1:1".into(),
            api_key: "k".into(),
        };
        Dashboard::new(
            ApiClient::from_config(&api),
            Regions::headless(),
            ThemeStore::new(None),
            ActionLog::disabled(),
        )
    }

    fn metrics() -> MetricsResponse {
        MetricsResponse {
            auc_dkt: 0.91,
            accuracy_dkt: 0.87,
            avg_gain_dkt: 0.34,
            avg_gain_random: 0.10,
            avg_gain_heuristic: 0.20,
            time_to_master_mean_dkt: 12.4,
        }
    }

    #[test]
    fn validation_failure_renders_into_own_region() {
        let mut dash = offline_dashboard();
        let state = dash.invoke(ActionRequest::Upload { file: None }).clone();

        assert_eq!(state.error().unwrap().kind_name(), "validation");
        let fragment = dash.regions().latest(Region::UploadStatus).unwrap();
        assert_eq!(fragment.tone, Tone::Error);
        assert!(dash.regions().latest(Region::Recommendation).is_none());
    }

    #[test]
    fn loading_is_shown_before_settlement() {
        let mut dash = offline_dashboard();
        let _ticket = dash.begin(ActionKind::Drift);
        let fragment = dash.regions().latest(Region::Drift).unwrap();
        assert_eq!(fragment.tone, Tone::Progress);
        assert_eq!(fragment.notes, vec!["Checking drift..."]);
    }

    #[test]
    fn overlapping_invocations_last_started_wins() {
        let mut dash = offline_dashboard();
        let first = dash.begin(ActionKind::Drift);
        let second = dash.begin(ActionKind::Drift);

        assert!(dash.settle(second, Ok(Payload::Drift(DriftResult { has_drift: true }))));
        assert!(!dash.settle(first, Ok(Payload::Drift(DriftResult { has_drift: false }))));

        let badge = dash.regions().latest(Region::Drift).unwrap().badge.clone().unwrap();
        assert_eq!(badge.text, "Drift detected");
    }

    #[test]
    fn metrics_success_rebuilds_chart() {
        let mut dash = offline_dashboard();
        for _ in 0..2 {
            let ticket = dash.begin(ActionKind::Metrics);
            dash.settle(ticket, Ok(Payload::Metrics(metrics())));
        }
        assert_eq!(dash.chart().generation(), 2);
        assert!(dash.regions().latest(Region::Metrics).is_some());
    }

    #[test]
    fn metrics_loading_and_failure_are_not_rendered() {
        let mut dash = offline_dashboard();
        let ticket = dash.begin(ActionKind::Metrics);
        assert!(dash.regions().latest(Region::Metrics).is_none());

        let err = ActionError::from(TransportError::Http {
            status: 500,
            status_text: "Internal Server Error".into(),
        });
        dash.settle(ticket, Err(err));
        assert!(dash.regions().latest(Region::Metrics).is_none());
        assert!(dash.chart().current().is_none());
        assert_eq!(dash.state(ActionKind::Metrics).error().unwrap().status(), Some(500));
    }

    #[test]
    fn startup_with_unreachable_service_stays_quiet() {
        let mut dash = offline_dashboard();
        assert_eq!(dash.startup(), Theme::Light);
        assert_eq!(dash.state(ActionKind::Metrics).error().unwrap().kind_name(), "network");
        assert!(dash.regions().latest(Region::Metrics).is_none());
    }
}
