//! The host document seam.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::DomError;
use crate::node::{HostSignal, NodeId};

/// A host document shared between the observation loop and in-flight cycles.
///
/// Locks are held only for synchronous read-then-act sequences, never across
/// an `.await`.
pub type SharedDocument<D> = Arc<Mutex<D>>;

/// Everything the engine may do to a host page.
///
/// Queries follow `querySelector` semantics: only descendants of `scope` are
/// candidates, in document order, while ancestors outside the scope still take
/// part in combinator matching.
pub trait HostDocument: Send + 'static {
    /// Root element that all observation is scoped to.
    fn body(&self) -> NodeId;

    /// First descendant of `scope` matching `selector`.
    fn query_selector(&self, scope: NodeId, selector: &str) -> Result<Option<NodeId>, DomError>;

    /// All descendants of `scope` matching `selector`, in document order.
    fn query_selector_all(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError>;

    /// Whether `node` itself matches `selector`.
    fn matches(&self, node: NodeId, selector: &str) -> Result<bool, DomError>;

    /// Nearest inclusive ancestor of `node` matching `selector`.
    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>, DomError> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.matches(candidate, selector)? {
                return Ok(Some(candidate));
            }
            current = self.parent(candidate);
        }
        Ok(None)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` is currently reachable from the body.
    fn is_attached(&self, node: NodeId) -> bool;

    /// Inclusive containment.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            current = self.parent(candidate);
        }
        false
    }

    /// Lowercase tag name, `None` for text nodes and unknown ids.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DomError>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DomError>;

    /// Concatenated text of `node` and its descendants.
    fn text_content(&self, node: NodeId) -> String;

    /// Current form value, if the node carries one.
    fn value(&self, node: NodeId) -> Option<String>;

    fn set_value(&mut self, node: NodeId, value: &str) -> Result<(), DomError>;

    /// Replace all children with a single text node.
    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DomError>;

    /// Replace all children with the nodes parsed from `markup`.
    fn set_inner_html(&mut self, node: NodeId, markup: &str) -> Result<(), DomError>;

    fn inner_html(&self, node: NodeId) -> String;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    /// Insert `child` before the current first child of `parent`.
    fn prepend_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError>;

    /// Detach `node` from its parent. Detached nodes stay addressable.
    fn remove(&mut self, node: NodeId) -> Result<(), DomError>;

    /// Fire an input-changed event so the host's own state picks up a write.
    fn dispatch_input(&mut self, node: NodeId) -> Result<(), DomError>;

    fn focus(&mut self, node: NodeId) -> Result<(), DomError>;

    fn title(&self) -> String;

    fn location_hash(&self) -> String;

    /// Subscribe to mutation, navigation and interaction signals.
    fn subscribe(&self) -> broadcast::Receiver<HostSignal>;
}
