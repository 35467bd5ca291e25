/// Per-action state machine.
///
/// ```text
/// idle/success/error --begin--> loading --settle(ok)--> success
///                                       --settle(err)-> error
/// idle/success/error/loading --reject--> error        (local validation)
/// ```
///
/// Every `begin` issues a new sequence number. A settlement is applied only
/// when its ticket carries the latest number, so when two invocations
/// overlap the one started last wins regardless of which response arrives
/// first.
use super::{ActionError, ActionKind, ActionState, Payload};

/// Label shown on a control while its action is in flight.
pub const BUSY_LABEL: &str = "Processing...";

/// The operator-facing trigger of an action (a button).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub enabled: bool,
    pub label: String,
    idle_label: String,
}

impl Control {
    pub fn new(idle_label: impl Into<String>) -> Self {
        let idle_label = idle_label.into();
        Self {
            enabled: true,
            label: idle_label.clone(),
            idle_label,
        }
    }

    fn busy(&mut self) {
        self.enabled = false;
        self.label = BUSY_LABEL.to_string();
    }

    fn restore(&mut self) {
        self.enabled = true;
        self.label.clone_from(&self.idle_label);
    }
}

/// Proof of a started invocation, consumed by [`ActionController::settle`].
#[derive(Debug, PartialEq, Eq)]
pub struct Ticket {
    kind: ActionKind,
    sequence: u64,
}

impl Ticket {
    pub fn kind(&self) -> ActionKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct ActionController {
    kind: ActionKind,
    state: ActionState,
    issued: u64,
    control: Option<Control>,
}

impl ActionController {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            state: ActionState::Idle,
            issued: 0,
            control: kind.idle_label().map(Control::new),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn state(&self) -> &ActionState {
        &self.state
    }

    pub fn control(&self) -> Option<&Control> {
        self.control.as_ref()
    }

    /// Sequence number of the most recent invocation (0 before the first).
    pub fn latest_sequence(&self) -> u64 {
        self.issued
    }

    /// Start an invocation: enter `Loading` and disable the control.
    pub fn begin(&mut self) -> Ticket {
        self.issued += 1;
        self.state = ActionState::Loading;
        if let Some(control) = self.control.as_mut() {
            control.busy();
        }
        Ticket {
            kind: self.kind,
            sequence: self.issued,
        }
    }

    /// Apply the outcome of the invocation identified by `ticket`.
    ///
    /// Returns `false` (and changes nothing) when a later invocation has
    /// superseded this one.
    pub fn settle(&mut self, ticket: Ticket, outcome: Result<Payload, ActionError>) -> bool {
        if ticket.kind != self.kind
            || ticket.sequence != self.issued
            || self.state != ActionState::Loading
        {
            return false;
        }

        self.state = match outcome {
            Ok(payload) => ActionState::Success(payload),
            Err(err) => ActionState::Error(err),
        };
        if let Some(control) = self.control.as_mut() {
            control.restore();
        }
        true
    }

    /// Fail an invocation before it reaches the network.
    ///
    /// Counts as a new invocation, so any request still in flight is
    /// superseded.
    pub fn reject(&mut self, err: ActionError) {
        self.issued += 1;
        self.state = ActionState::Error(err);
        if let Some(control) = self.control.as_mut() {
            control.restore();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
