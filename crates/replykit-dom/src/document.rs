//! In-memory host document.

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;

use std::collections::HashMap;

use scraper::{Html, Node};
use tokio::sync::broadcast;

use crate::error::DomError;
use crate::host::HostDocument;
use crate::node::{HostSignal, NodeId};
use crate::selector::Selector;
use crate::snapshot::{DocumentSnapshot, SnapshotNode};

const SIGNAL_CAPACITY: usize = 1024;

/// Carries arena ids through the parsed mirror used for selector matching.
const MIRROR_ID_ATTR: &str = "data-host-node";

const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Arena-backed document rooted at a `body` element.
///
/// Every mutation is broadcast as a [`HostSignal`], mirroring what a
/// `MutationObserver` plus navigation listeners would report on a live page.
///
/// Selectors are evaluated by `scraper` against an HTML mirror of the tree
/// holding the queried node: the attached document, or a detached subtree
/// parsed as a fragment. The mirror is the tree an HTML parser would build
/// from the same elements.
#[derive(Debug)]
pub struct Document {
    nodes: HashMap<NodeId, NodeData>,
    body: NodeId,
    next_id: u64,
    title: String,
    hash: String,
    focused: Option<NodeId>,
    input_events: HashMap<NodeId, usize>,
    signals: broadcast::Sender<HostSignal>,
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
        value: Option<String>,
    },
    Text(String),
}

impl Document {
    pub fn new() -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        let mut doc = Self {
            nodes: HashMap::new(),
            body: NodeId::from_raw(0),
            next_id: 0,
            title: String::new(),
            hash: String::new(),
            focused: None,
            input_events: HashMap::new(),
            signals,
        };
        doc.body = doc.alloc(NodeKind::Element {
            tag: "body".to_string(),
            attributes: Vec::new(),
            value: None,
        });
        doc
    }

    /// Create an element with attributes and append it to `parent`.
    pub fn element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attributes: &[(&str, &str)],
    ) -> Result<NodeId, DomError> {
        let id = self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                .collect(),
            value: None,
        });
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Create a text node and append it to `parent`.
    pub fn text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, DomError> {
        let id = self.alloc(NodeKind::Text(text.to_string()));
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Parse host markup and append the resulting nodes to `parent`.
    pub fn markup(&mut self, parent: NodeId, markup: &str) -> Result<Vec<NodeId>, DomError> {
        self.require_element(parent)?;
        let nodes = self.parse_markup(markup)?;
        for node in &nodes {
            self.append_child(parent, *node)?;
        }
        Ok(nodes)
    }

    /// Simulate a user click on `target`.
    pub fn click(&mut self, target: NodeId) -> Result<(), DomError> {
        self.node(target)?;
        self.emit(HostSignal::Click { target });
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.emit(HostSignal::TitleChange {
            title: self.title.clone(),
        });
    }

    pub fn set_location_hash(&mut self, hash: &str) {
        self.hash = hash.to_string();
        self.emit(HostSignal::HashChange {
            hash: self.hash.clone(),
        });
    }

    /// Node that last received focus.
    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    /// How many input-changed events were dispatched on `node`.
    pub fn input_event_count(&self, node: NodeId) -> usize {
        self.input_events.get(&node).copied().unwrap_or(0)
    }

    /// Children of `node`, empty for unknown ids.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Serializable copy of the attached tree.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            title: self.title.clone(),
            hash: self.hash.clone(),
            body: self.snapshot_node(self.body),
        }
    }

    fn snapshot_node(&self, id: NodeId) -> SnapshotNode {
        let Some(data) = self.nodes.get(&id) else {
            return SnapshotNode::Text(String::new());
        };
        match &data.kind {
            NodeKind::Text(text) => SnapshotNode::Text(text.clone()),
            NodeKind::Element {
                tag,
                attributes,
                value,
            } => SnapshotNode::Element {
                tag: tag.clone(),
                attributes: attributes.iter().cloned().collect(),
                value: value.clone(),
                children: data.children.iter().map(|c| self.snapshot_node(*c)).collect(),
            },
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        self.next_id += 1;
        let id = NodeId::from_raw(self.next_id);
        self.nodes.insert(
            id,
            NodeData {
                parent: None,
                children: Vec::new(),
                kind,
            },
        );
        id
    }

    fn emit(&self, signal: HostSignal) {
        // No receivers is fine: nobody is observing yet.
        let _ = self.signals.send(signal);
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(&id).ok_or(DomError::NodeNotFound(id))
    }

    fn element_attributes(&self, id: NodeId) -> Option<&[(String, String)]> {
        match &self.nodes.get(&id)?.kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            NodeKind::Text(_) => None,
        }
    }

    fn element_attributes_mut(
        &mut self,
        id: NodeId,
    ) -> Result<&mut Vec<(String, String)>, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn require_element(&self, id: NodeId) -> Result<(), DomError> {
        match self.node(id)?.kind {
            NodeKind::Element { .. } => Ok(()),
            NodeKind::Text(_) => Err(DomError::NotAnElement(id)),
        }
    }

    fn is_element(&self, id: NodeId) -> bool {
        self.element_attributes(id).is_some()
    }

    /// Topmost ancestor of `node`: the body, or the root of a detached subtree.
    fn tree_root(&self, node: NodeId) -> NodeId {
        let mut root = node;
        while let Some(parent) = self.parent(root) {
            root = parent;
        }
        root
    }

    fn detach(&mut self, child: NodeId) -> Option<NodeId> {
        let parent = self.nodes.get(&child)?.parent?;
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.retain(|c| *c != child);
        }
        if let Some(c) = self.nodes.get_mut(&child) {
            c.parent = None;
        }
        Some(parent)
    }

    /// Link a fresh node under `parent` without signalling.
    fn link(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node_mut(parent)?.children.push(child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        at_front: bool,
    ) -> Result<(), DomError> {
        self.require_element(parent)?;
        self.node(child)?;
        if child == self.body {
            return Err(DomError::HierarchyRequest("cannot move the body".to_string()));
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest(format!(
                "{} is an ancestor of {}",
                child, parent
            )));
        }

        if let Some(old_parent) = self.detach(child) {
            self.emit(HostSignal::ChildList {
                target: old_parent,
                added: Vec::new(),
                removed: vec![child],
            });
        }

        let p = self.node_mut(parent)?;
        if at_front {
            p.children.insert(0, child);
        } else {
            p.children.push(child);
        }
        self.node_mut(child)?.parent = Some(parent);

        self.emit(HostSignal::ChildList {
            target: parent,
            added: vec![child],
            removed: Vec::new(),
        });
        Ok(())
    }

    /// Swap all children of `node` for the detached `added` nodes, as one
    /// mutation.
    fn replace_children(&mut self, node: NodeId, added: Vec<NodeId>) -> Result<(), DomError> {
        self.require_element(node)?;
        let removed = std::mem::take(&mut self.node_mut(node)?.children);
        for child in &removed {
            if let Some(c) = self.nodes.get_mut(child) {
                c.parent = None;
            }
        }
        for child in &added {
            self.link(node, *child)?;
        }

        self.emit(HostSignal::ChildList {
            target: node,
            added,
            removed,
        });
        Ok(())
    }

    /// Parse `markup` as body content into detached nodes. Returns the
    /// top-level nodes in order.
    fn parse_markup(&mut self, markup: &str) -> Result<Vec<NodeId>, DomError> {
        let fragment = Html::parse_fragment(markup);
        let root = fragment.root_element();

        let mut created = HashMap::new();
        let mut top = Vec::new();
        for node in root.descendants().skip(1) {
            let kind = match node.value() {
                Node::Element(element) => NodeKind::Element {
                    tag: element.name().to_string(),
                    attributes: element
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect(),
                    value: None,
                },
                Node::Text(text) => NodeKind::Text(text.to_string()),
                _ => continue,
            };
            let id = self.alloc(kind);
            match node.parent().and_then(|p| created.get(&p.id()).copied()) {
                Some(parent) => self.link(parent, id)?,
                None => top.push(id),
            }
            created.insert(node.id(), id);
        }
        Ok(top)
    }

    /// Ids of every element in the tree rooted at `root` matching `selector`,
    /// in document order.
    fn select(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut markup = String::new();
        let html = if root == self.body {
            markup.push_str("<!DOCTYPE html><html><head></head>");
            self.mirror_into(root, &mut markup);
            markup.push_str("</html>");
            Html::parse_document(&markup)
        } else {
            self.mirror_into(root, &mut markup);
            Html::parse_fragment(&markup)
        };

        html.select(selector.compiled())
            .filter_map(|element| element.value().attr(MIRROR_ID_ATTR))
            .filter_map(NodeId::parse)
            .collect()
    }

    /// Elements only, each tagged with its arena id.
    fn mirror_into(&self, id: NodeId, out: &mut String) {
        let Some(NodeData {
            children,
            kind: NodeKind::Element {
                tag, attributes, ..
            },
            ..
        }) = self.nodes.get(&id)
        else {
            return;
        };
        let tag = if is_markup_name(tag) { tag.as_str() } else { "div" };

        out.push('<');
        out.push_str(tag);
        out.push_str(&format!(" {}=\"{}\"", MIRROR_ID_ATTR, id.raw()));
        for (name, value) in attributes {
            if name != MIRROR_ID_ATTR && is_markup_name(name) {
                out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
            }
        }
        out.push('>');
        // An end tag such as `</br>` would parse as a second element.
        if VOID_ELEMENTS.contains(&tag) {
            return;
        }
        for child in children {
            self.mirror_into(*child, out);
        }
        out.push_str(&format!("</{}>", tag));
    }

    fn serialize_into(&self, id: NodeId, out: &mut String) {
        let Some(data) = self.nodes.get(&id) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(&escape(text, false)),
            NodeKind::Element {
                tag, attributes, ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&tag.as_str()) {
                    return;
                }
                for child in &data.children {
                    self.serialize_into(*child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl HostDocument for Document {
    fn body(&self) -> NodeId {
        self.body
    }

    fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_selector_all(scope, selector)?.into_iter().next())
    }

    fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let parsed = Selector::parse(selector)?;
        self.node(scope)?;
        Ok(self
            .select(self.tree_root(scope), &parsed)
            .into_iter()
            .filter(|id| *id != scope && self.contains(scope, *id))
            .collect())
    }

    fn matches(&self, node: NodeId, selector: &str) -> Result<bool, DomError> {
        let parsed = Selector::parse(selector)?;
        if !self.is_element(node) {
            return Ok(false);
        }
        Ok(self.select(self.tree_root(node), &parsed).contains(&node))
    }

    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let parsed = Selector::parse(selector)?;
        let matched = self.select(self.tree_root(node), &parsed);
        let mut current = Some(node);
        while let Some(candidate) = current {
            if matched.contains(&candidate) {
                return Ok(Some(candidate));
            }
            current = self.parent(candidate);
        }
        Ok(None)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    fn is_attached(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node) && self.contains(self.body, node)
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element_attributes(node)?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        let attributes = self.element_attributes_mut(node)?;
        match attributes.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => attributes.push((name.clone(), value.to_string())),
        }
        self.emit(HostSignal::Attribute { target: node, name });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        let attributes = self.element_attributes_mut(node)?;
        let before = attributes.len();
        attributes.retain(|(k, _)| *k != name);
        if attributes.len() != before {
            self.emit(HostSignal::Attribute { target: node, name });
        }
        Ok(())
    }

    fn text_content(&self, node: NodeId) -> String {
        let Some(data) = self.nodes.get(&node) else {
            return String::new();
        };
        match &data.kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element { .. } => data
                .children
                .iter()
                .map(|c| self.text_content(*c))
                .collect(),
        }
    }

    fn value(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { value: Some(v), .. } => Some(v.clone()),
            NodeKind::Element { .. } => self.attribute(node, "value"),
            NodeKind::Text(_) => None,
        }
    }

    fn set_value(&mut self, node: NodeId, new_value: &str) -> Result<(), DomError> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Element { value, .. } => {
                *value = Some(new_value.to_string());
                Ok(())
            }
            NodeKind::Text(_) => Err(DomError::NotAnElement(node)),
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError> {
        self.require_element(node)?;
        let text = self.alloc(NodeKind::Text(text.to_string()));
        self.replace_children(node, vec![text])
    }

    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), DomError> {
        self.require_element(node)?;
        let parsed = self.parse_markup(markup)?;
        self.replace_children(node, parsed)
    }

    fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.serialize_into(child, &mut out);
        }
        out
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            value: None,
        })
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_child(parent, child, false)
    }

    fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_child(parent, child, true)
    }

    fn remove(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        if node == self.body {
            return Err(DomError::HierarchyRequest("cannot remove the body".to_string()));
        }
        if let Some(parent) = self.detach(node) {
            if self.focused.is_some_and(|f| self.contains(node, f)) {
                self.focused = None;
            }
            self.emit(HostSignal::ChildList {
                target: parent,
                added: Vec::new(),
                removed: vec![node],
            });
        }
        Ok(())
    }

    fn dispatch_input(&mut self, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        *self.input_events.entry(node).or_insert(0) += 1;
        self.emit(HostSignal::Input { target: node });
        Ok(())
    }

    fn focus(&mut self, node: NodeId) -> Result<(), DomError> {
        self.require_element(node)?;
        self.focused = Some(node);
        Ok(())
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn location_hash(&self) -> String {
        self.hash.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<HostSignal> {
        self.signals.subscribe()
    }
}

/// Tag or attribute name that can be written into markup unquoted.
fn is_markup_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn escape(value: &str, in_attribute: bool) -> String {
    let escaped = value.replace('&', "&amp;");
    if in_attribute {
        escaped.replace('"', "&quot;")
    } else {
        escaped.replace('<', "&lt;").replace('>', "&gt;")
    }
}
