/// Output regions and the handles fragments are written to.
///
/// [`Regions`] maps each logical region to an optional [`RenderTarget`] and
/// always keeps the latest fragment per region, so a dashboard can run
/// headless and still be inspected.
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use super::{Fragment, Region};

/// Output encoding for terminal targets and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("html") => Self::Html,
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }

    pub fn encode(self, fragment: &Fragment) -> String {
        match self {
            Self::Text => fragment.to_terminal(),
            Self::Html => fragment.to_html(),
            Self::Json => serde_json::to_string(fragment).unwrap_or_default(),
        }
    }
}

/// Something a region's content can be shown on.
pub trait RenderTarget {
    /// Replace whatever the target currently shows with `fragment`.
    fn show(&mut self, fragment: &Fragment);
}

/// Writes every fragment to stdout in the chosen format.
#[derive(Debug, Default)]
pub struct TerminalTarget {
    format: OutputFormat,
}

impl TerminalTarget {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl RenderTarget for TerminalTarget {
    fn show(&mut self, fragment: &Fragment) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", self.format.encode(fragment));
    }
}

/// Keeps every fragment shown, for headless use and tests.
///
/// Clones share the same history, so a clone can be attached to a region
/// and the first handle inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    shown: Rc<RefCell<Vec<Fragment>>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fragment shown so far, oldest first.
    pub fn history(&self) -> Vec<Fragment> {
        self.shown.borrow().clone()
    }

    pub fn latest(&self) -> Option<Fragment> {
        self.shown.borrow().last().cloned()
    }
}

impl RenderTarget for MemoryTarget {
    fn show(&mut self, fragment: &Fragment) {
        self.shown.borrow_mut().push(fragment.clone());
    }
}

/// Region → target map plus the latest fragment shown in each region.
#[derive(Default)]
pub struct Regions {
    targets: HashMap<Region, Box<dyn RenderTarget>>,
    latest: HashMap<Region, Fragment>,
}

impl Regions {
    /// No targets; fragments are only recorded.
    pub fn headless() -> Self {
        Self::default()
    }

    /// Every region gets a terminal target in `format`.
    pub fn terminal(format: OutputFormat) -> Self {
        let mut regions = Self::default();
        for region in Region::ALL {
            regions.attach(region, Box::new(TerminalTarget::new(format)));
        }
        regions
    }

    /// Attach (or replace) the target of `region`.
    pub fn attach(&mut self, region: Region, target: Box<dyn RenderTarget>) {
        self.targets.insert(region, target);
    }

    /// Show `fragment` in its region.
    pub fn show(&mut self, fragment: Fragment) {
        if let Some(target) = self.targets.get_mut(&fragment.region) {
            target.show(&fragment);
        }
        self.latest.insert(fragment.region, fragment);
    }

    /// Most recent fragment shown in `region`.
    pub fn latest(&self, region: Region) -> Option<&Fragment> {
        self.latest.get(&region)
    }
}

impl std::fmt::Debug for Regions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regions")
            .field("targets", &self.targets.keys().collect::<Vec<_>>())
            .field("latest", &self.latest)
            .finish()
    }
}
