//! Role-to-element resolution.

#[cfg(test)]
#[path = "locator_tests.rs"]
mod tests;

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use replykit_config::{ReadMode, SelectorScope};
use replykit_dom::{HostDocument, NodeId};

use crate::catalog::{SelectorCatalog, SelectorEntry, UiRole};

/// A live node satisfying a role.
///
/// Borrows the document it was found in, so it cannot outlive the synchronous
/// operation that produced it. Copy `node` out to act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedElement<'doc> {
    pub node: NodeId,
    pub role: UiRole,
    /// Index of the catalog entry that matched.
    pub rule_index: usize,
    _doc: PhantomData<&'doc ()>,
}

/// Outcome of one selector during a probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub role: UiRole,
    pub index: usize,
    pub selector: String,
    pub scope: SelectorScope,
    pub matches: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn found(&self) -> bool {
        self.matches > 0
    }
}

/// Resolves roles against the live document, first match wins.
#[derive(Debug, Clone)]
pub struct ElementLocator {
    catalog: Arc<SelectorCatalog>,
}

impl ElementLocator {
    pub fn new(catalog: Arc<SelectorCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &SelectorCatalog {
        &self.catalog
    }

    /// Try each selector of `role` in priority order within `scope` (the whole
    /// document when `None`). A miss is not an error.
    pub fn locate<'d, D: HostDocument + ?Sized>(
        &self,
        doc: &'d D,
        role: UiRole,
        scope: Option<NodeId>,
    ) -> Option<LocatedElement<'d>> {
        for (index, entry) in self.catalog.entries(role).iter().enumerate() {
            if let Some(node) = self.first_match(doc, entry, scope) {
                return Some(LocatedElement {
                    node,
                    role,
                    rule_index: index,
                    _doc: PhantomData,
                });
            }
        }
        debug!("No element found for {}", role);
        None
    }

    /// Every distinct element satisfying `role`, in selector priority order.
    ///
    /// A lower-priority match nested inside, or wrapping, an element already
    /// chosen is the same surface seen through another selector and is dropped.
    pub fn locate_all<D: HostDocument + ?Sized>(
        &self,
        doc: &D,
        role: UiRole,
        scope: Option<NodeId>,
    ) -> Vec<NodeId> {
        let mut found: Vec<NodeId> = Vec::new();
        for entry in self.catalog.entries(role) {
            let root = resolve_scope(doc, entry, scope);
            let nodes = match doc.query_selector_all(root, &entry.selector) {
                Ok(nodes) => nodes,
                Err(e) => {
                    warn!("Skipping selector for {}: {}", role, e);
                    continue;
                }
            };
            for node in nodes {
                let overlaps = found
                    .iter()
                    .any(|chosen| doc.contains(*chosen, node) || doc.contains(node, *chosen));
                if !overlaps {
                    found.push(node);
                }
            }
        }
        found
    }

    /// Read content for `role`: the first matching entry's trimmed text, or its
    /// form value for `value` entries. Value entries with an empty value are
    /// passed over. Returns an empty string when nothing matches.
    pub fn read_content<D: HostDocument + ?Sized>(
        &self,
        doc: &D,
        role: UiRole,
        scope: Option<NodeId>,
    ) -> String {
        for entry in self.catalog.entries(role) {
            let Some(node) = self.first_match(doc, entry, scope) else {
                continue;
            };
            match entry.read {
                ReadMode::Text => return doc.text_content(node).trim().to_string(),
                ReadMode::Value => {
                    if let Some(value) = doc.value(node).filter(|v| !v.is_empty()) {
                        return value;
                    }
                }
            }
        }
        String::new()
    }

    /// Report every selector of `role` with its match count.
    pub fn probe<D: HostDocument + ?Sized>(
        &self,
        doc: &D,
        role: UiRole,
        scope: Option<NodeId>,
    ) -> Vec<ProbeResult> {
        self.catalog
            .entries(role)
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let root = resolve_scope(doc, entry, scope);
                let (matches, error) = match doc.query_selector_all(root, &entry.selector) {
                    Ok(nodes) => (nodes.len(), None),
                    Err(e) => (0, Some(e.to_string())),
                };
                ProbeResult {
                    role,
                    index,
                    selector: entry.selector.clone(),
                    scope: entry.scope,
                    matches,
                    error,
                }
            })
            .collect()
    }

    fn first_match<D: HostDocument + ?Sized>(
        &self,
        doc: &D,
        entry: &SelectorEntry,
        scope: Option<NodeId>,
    ) -> Option<NodeId> {
        let root = resolve_scope(doc, entry, scope);
        match doc.query_selector(root, &entry.selector) {
            Ok(found) => found,
            Err(e) => {
                warn!("Skipping selector {:?}: {}", entry.selector, e);
                None
            }
        }
    }
}

fn resolve_scope<D: HostDocument + ?Sized>(
    doc: &D,
    entry: &SelectorEntry,
    scope: Option<NodeId>,
) -> NodeId {
    match (entry.scope, scope) {
        (SelectorScope::Container, Some(scope)) => scope,
        _ => doc.body(),
    }
}
