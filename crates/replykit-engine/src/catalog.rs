//! Selector catalog: ordered, role-keyed candidate selectors.
//!
//! The catalog is pure data. Earlier entries win; there is no scoring. The
//! built-in table targets Gmail and can be replaced per role from
//! configuration.

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;

use std::fmt;

use serde::Serialize;

use replykit_config::{ReadMode, SelectorScope, SelectorSpec, SelectorsConfig};
use replykit_dom::Selector;

use crate::error::EngineError;

/// A part of the host UI the engine needs to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiRole {
    ComposeWindow,
    Toolbar,
    ComposeEditor,
    QuotedSource,
}

impl UiRole {
    pub const ALL: [UiRole; 4] = [
        UiRole::ComposeWindow,
        UiRole::Toolbar,
        UiRole::ComposeEditor,
        UiRole::QuotedSource,
    ];

    /// Key used in the `[selectors]` config table.
    pub fn key(self) -> &'static str {
        match self {
            UiRole::ComposeWindow => "compose_window",
            UiRole::Toolbar => "toolbar",
            UiRole::ComposeEditor => "compose_editor",
            UiRole::QuotedSource => "quoted_source",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.key() == key)
    }

    fn index(self) -> usize {
        match self {
            UiRole::ComposeWindow => 0,
            UiRole::Toolbar => 1,
            UiRole::ComposeEditor => 2,
            UiRole::QuotedSource => 3,
        }
    }
}

impl fmt::Display for UiRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One candidate selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorEntry {
    pub selector: String,
    pub scope: SelectorScope,
    pub read: ReadMode,
}

impl SelectorEntry {
    /// Entry evaluated in the caller's scope, read as text.
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            scope: SelectorScope::Container,
            read: ReadMode::Text,
        }
    }

    /// Evaluate against the whole document regardless of the caller's scope.
    pub fn document_wide(mut self) -> Self {
        self.scope = SelectorScope::Document;
        self
    }

    /// Read the matched element's form value instead of its text.
    pub fn read_value(mut self) -> Self {
        self.read = ReadMode::Value;
        self
    }
}

impl From<&SelectorSpec> for SelectorEntry {
    fn from(spec: &SelectorSpec) -> Self {
        Self {
            selector: spec.selector().to_string(),
            scope: spec.scope(),
            read: spec.read(),
        }
    }
}

/// A role and its selectors in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorRule {
    pub role: UiRole,
    pub entries: Vec<SelectorEntry>,
}

/// The full selector table, one rule per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectorCatalog {
    rules: [SelectorRule; 4],
}

impl SelectorCatalog {
    /// Built-in Gmail table.
    pub fn gmail() -> Self {
        let rule = |role, entries: Vec<SelectorEntry>| SelectorRule { role, entries };
        Self {
            rules: [
                rule(
                    UiRole::ComposeWindow,
                    vec![
                        SelectorEntry::new(r#"div[role="dialog"][aria-label*="Compose"]"#),
                        SelectorEntry::new(r#"div[role="dialog"][aria-label*="New Message"]"#),
                        SelectorEntry::new(".aAU"),
                        SelectorEntry::new(".M9"),
                    ],
                ),
                rule(
                    UiRole::Toolbar,
                    vec![
                        SelectorEntry::new(".aB.gQ.pE"),
                        SelectorEntry::new(".oc.gU"),
                        SelectorEntry::new(".aal"),
                        SelectorEntry::new(".adx"),
                        SelectorEntry::new(r#"div[role="toolbar"]"#),
                    ],
                ),
                rule(
                    UiRole::ComposeEditor,
                    vec![
                        SelectorEntry::new(
                            r#"div[contenteditable="true"][role="textbox"][aria-label*="Message Body"]"#,
                        ),
                        SelectorEntry::new(r#"div[contenteditable="true"][role="textbox"]"#),
                        SelectorEntry::new(r#"div[contenteditable="true"]"#),
                        SelectorEntry::new(r#"div[g_editable="true"]"#),
                    ],
                ),
                rule(
                    UiRole::QuotedSource,
                    vec![
                        SelectorEntry::new(".gmail_quote, .h5").document_wide(),
                        SelectorEntry::new(".adn .a3s.aiL").document_wide(),
                        SelectorEntry::new(r#"input[name="original_content"]"#)
                            .document_wide()
                            .read_value(),
                        SelectorEntry::new(".aO7"),
                    ],
                ),
            ],
        }
    }

    /// Replace the rules named in `config`, validating every selector.
    pub fn with_overrides(mut self, config: &SelectorsConfig) -> Result<Self, EngineError> {
        for (key, specs) in config.overrides() {
            let role =
                UiRole::from_key(key).ok_or_else(|| EngineError::UnknownRole(key.to_string()))?;
            self.rules[role.index()].entries = specs.iter().map(SelectorEntry::from).collect();
        }
        self.validate()?;
        Ok(self)
    }

    /// Replace one role's entries.
    pub fn with_rule(mut self, role: UiRole, entries: Vec<SelectorEntry>) -> Self {
        self.rules[role.index()].entries = entries;
        self
    }

    /// Check that every selector parses.
    pub fn validate(&self) -> Result<(), EngineError> {
        for rule in &self.rules {
            for entry in &rule.entries {
                Selector::parse(&entry.selector).map_err(|source| {
                    EngineError::InvalidSelector {
                        role: rule.role,
                        selector: entry.selector.clone(),
                        source,
                    }
                })?;
            }
        }
        Ok(())
    }

    pub fn rule(&self, role: UiRole) -> &SelectorRule {
        &self.rules[role.index()]
    }

    pub fn entries(&self, role: UiRole) -> &[SelectorEntry] {
        &self.rule(role).entries
    }

    pub fn rules(&self) -> impl Iterator<Item = &SelectorRule> {
        self.rules.iter()
    }
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self::gmail()
    }
}
