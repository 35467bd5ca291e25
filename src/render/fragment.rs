/// Display fragments and their HTML / terminal / plain-text encodings.
use colored::Colorize;
use serde::Serialize;

use super::Region;

/// Visual treatment of a fragment or badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Info,
    Success,
    /// Soft, expected condition with guidance (e.g. feature not connected).
    Warning,
    Error,
    /// Neutral in-progress indicator.
    Progress,
}

impl Tone {
    fn css_class(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Progress => "loading",
        }
    }
}

/// One value/label cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stat {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Badge {
    pub text: String,
    pub tone: Tone,
}

/// Rendered content of one output region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fragment {
    pub region: Region,
    pub tone: Tone,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stats: Vec<Stat>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
}

impl Fragment {
    pub fn new(region: Region, tone: Tone) -> Self {
        Self {
            region,
            tone,
            title: None,
            stats: Vec::new(),
            notes: Vec::new(),
            badge: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn stat(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.stats.push(Stat {
            value: value.into(),
            label: label.into(),
        });
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn badge(mut self, text: impl Into<String>, tone: Tone) -> Self {
        self.badge = Some(Badge {
            text: text.into(),
            tone,
        });
        self
    }

    /// Value of the stat with the given label.
    pub fn stat_value(&self, label: &str) -> Option<&str> {
        self.stats
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.value.as_str())
    }

    /// All visible text, one item per line, without markup.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(title) = &self.title {
            lines.push(title.clone());
        }
        for stat in &self.stats {
            lines.push(format!("{}: {}", stat.label, stat.value));
        }
        lines.extend(self.notes.iter().cloned());
        if let Some(badge) = &self.badge {
            lines.push(badge.text.clone());
        }
        lines.join("\n")
    }

    /// HTML for the region's container, using the dashboard's CSS classes.
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<div class=\"{}\" data-region=\"{}\">\n",
            self.tone.css_class(),
            self.region.id()
        );
        if let Some(title) = &self.title {
            html.push_str(&format!("  <h3>{}</h3>\n", escape_html(title)));
        }
        if !self.stats.is_empty() {
            html.push_str("  <div class=\"stats-grid\">\n");
            for stat in &self.stats {
                html.push_str(&format!(
                    "    <div class=\"stat-card\"><div class=\"stat-value\">{}</div><div class=\"stat-label\">{}</div></div>\n",
                    escape_html(&stat.value),
                    escape_html(&stat.label)
                ));
            }
            html.push_str("  </div>\n");
        }
        for note in &self.notes {
            html.push_str(&format!("  <p>{}</p>\n", escape_html(note)));
        }
        if let Some(badge) = &self.badge {
            html.push_str(&format!(
                "  <p><span class=\"badge badge-{}\">{}</span></p>\n",
                badge.tone.css_class(),
                escape_html(&badge.text)
            ));
        }
        html.push_str("</div>");
        html
    }

    /// Colored multi-line rendering for a terminal.
    pub fn to_terminal(&self) -> String {
        let mut out = Vec::new();
        if let Some(title) = &self.title {
            out.push(paint(title, self.tone).bold().to_string());
        }
        let width = self.stats.iter().map(|s| s.label.len()).max().unwrap_or(0);
        for stat in &self.stats {
            let label = format!("{:<width$}", stat.label);
            out.push(format!("  {}  {}", label.dimmed(), stat.value.bold()));
        }
        for note in &self.notes {
            let line = match self.tone {
                Tone::Error | Tone::Warning | Tone::Progress => paint(note, self.tone).to_string(),
                _ => note.clone(),
            };
            out.push(format!("  {line}"));
        }
        if let Some(badge) = &self.badge {
            out.push(format!("  [{}]", paint(&badge.text, badge.tone)));
        }
        out.join("\n")
    }
}

fn paint(text: &str, tone: Tone) -> colored::ColoredString {
    match tone {
        Tone::Info => text.cyan(),
        Tone::Success => text.green(),
        Tone::Warning => text.yellow(),
        Tone::Error => text.red(),
        Tone::Progress => text.dimmed(),
    }
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
