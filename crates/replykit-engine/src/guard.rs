//! Idempotency guard for control injection.
//!
//! The guard keeps no state of its own: whether a container "has a control"
//! is always answered by querying the live document for an engine control.

use replykit_dom::{DomError, HostDocument, NodeId};

use crate::markup::{self, EngineNode};

#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionGuard;

impl InjectionGuard {
    pub fn new() -> Self {
        Self
    }

    /// A container is eligible iff it holds no live control.
    pub fn should_inject<D: HostDocument + ?Sized>(&self, doc: &D, container: NodeId) -> bool {
        self.existing_control(doc, container).is_none()
    }

    /// The control currently living inside `container`, if any.
    pub fn existing_control<D: HostDocument + ?Sized>(
        &self,
        doc: &D,
        container: NodeId,
    ) -> Option<NodeId> {
        doc.query_selector(container, EngineNode::Control.selector())
            .ok()
            .flatten()
    }

    /// Bind `control` to `container` so clicks resolve to the right cycle.
    pub fn mark_injected<D: HostDocument + ?Sized>(
        &self,
        doc: &mut D,
        control: NodeId,
        container: NodeId,
    ) -> Result<(), DomError> {
        markup::bind_container(doc, control, container)
    }

    /// Whether `control` is bound to `container`.
    pub fn is_bound<D: HostDocument + ?Sized>(&self, doc: &D, control: NodeId, container: NodeId) -> bool {
        markup::bound_container(doc, control) == Some(container)
    }
}
