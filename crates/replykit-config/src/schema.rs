//! Configuration schema definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,

    #[serde(default)]
    pub observer: ObserverConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default = "default_templates")]
    pub templates: Vec<ReplyTemplate>,

    #[serde(default)]
    pub selectors: SelectorsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            observer: ObserverConfig::default(),
            notifications: NotificationConfig::default(),
            logging: LoggingConfig::default(),
            templates: default_templates(),
            selectors: SelectorsConfig::default(),
        }
    }
}

/// Remote reply-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Upper bound for one generate request, connect included.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

pub(crate) fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Observation loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// When false, signals are consumed but nothing is injected.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_mutation_debounce")]
    pub mutation_debounce_ms: u64,

    #[serde(default = "default_navigation_settle")]
    pub navigation_settle_ms: u64,

    #[serde(default = "default_external_scan_settle")]
    pub external_scan_settle_ms: u64,

    /// Ceiling on how long a burst of signals may postpone a scan.
    #[serde(default = "default_max_debounce")]
    pub max_debounce_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mutation_debounce_ms: default_mutation_debounce(),
            navigation_settle_ms: default_navigation_settle(),
            external_scan_settle_ms: default_external_scan_settle(),
            max_debounce_ms: default_max_debounce(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_mutation_debounce() -> u64 {
    100
}

fn default_navigation_settle() -> u64 {
    500
}

fn default_external_scan_settle() -> u64 {
    1000
}

fn default_max_debounce() -> u64 {
    2000
}

/// Transient notification timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_display")]
    pub display_ms: u64,

    #[serde(default = "default_exit_transition")]
    pub exit_transition_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            display_ms: default_display(),
            exit_transition_ms: default_exit_transition(),
        }
    }
}

fn default_display() -> u64 {
    4000
}

fn default_exit_transition() -> u64 {
    300
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for rolling log files. Console only when unset.
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

/// A canned reply offered alongside generated ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyTemplate {
    pub name: String,
    pub content: String,
}

impl ReplyTemplate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

pub(crate) fn default_templates() -> Vec<ReplyTemplate> {
    vec![
        ReplyTemplate::new(
            "Quick Reply",
            "Thank you for your email. I'll respond in detail soon.",
        ),
        ReplyTemplate::new(
            "Meeting Request",
            "I'd be happy to meet. Please suggest a few times that work for you.",
        ),
    ]
}

/// Per-role selector overrides. `None` keeps the built-in list for that role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorsConfig {
    #[serde(default)]
    pub compose_window: Option<Vec<SelectorSpec>>,

    #[serde(default)]
    pub toolbar: Option<Vec<SelectorSpec>>,

    #[serde(default)]
    pub compose_editor: Option<Vec<SelectorSpec>>,

    #[serde(default)]
    pub quoted_source: Option<Vec<SelectorSpec>>,
}

impl SelectorsConfig {
    /// Iterate over the overridden roles as `(table key, entries)`.
    pub fn overrides(&self) -> impl Iterator<Item = (&'static str, &[SelectorSpec])> {
        [
            ("compose_window", self.compose_window.as_deref()),
            ("toolbar", self.toolbar.as_deref()),
            ("compose_editor", self.compose_editor.as_deref()),
            ("quoted_source", self.quoted_source.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, specs)| specs.map(|s| (key, s)))
    }
}

/// One selector entry: either a bare string or a table with scope and read mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SelectorSpec {
    Plain(String),
    Detailed {
        selector: String,
        #[serde(default)]
        scope: SelectorScope,
        #[serde(default)]
        read: ReadMode,
    },
}

impl SelectorSpec {
    pub fn selector(&self) -> &str {
        match self {
            SelectorSpec::Plain(s) => s,
            SelectorSpec::Detailed { selector, .. } => selector,
        }
    }

    pub fn scope(&self) -> SelectorScope {
        match self {
            SelectorSpec::Plain(_) => SelectorScope::default(),
            SelectorSpec::Detailed { scope, .. } => *scope,
        }
    }

    pub fn read(&self) -> ReadMode {
        match self {
            SelectorSpec::Plain(_) => ReadMode::default(),
            SelectorSpec::Detailed { read, .. } => *read,
        }
    }
}

/// Where a selector is evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorScope {
    /// The scope handed to the lookup (the whole document when none).
    #[default]
    Container,
    /// Always the whole document.
    Document,
}

/// How content is read from a matched element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    #[default]
    Text,
    Value,
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
