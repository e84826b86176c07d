//! Engine-owned nodes in the host page.
//!
//! Every node the engine creates carries `data-replykit="<kind>"` so it can be
//! told apart from host markup, both by the guard and by the observation loop
//! when it filters out its own mutations.

use replykit_dom::{DomError, HostDocument, NodeId};

/// Marks a node as engine-owned; the value is the [`EngineNode`] kind.
pub const ATTR_KIND: &str = "data-replykit";
/// Identity of the host container a control or menu belongs to.
pub const ATTR_CONTAINER: &str = "data-replykit-container";
/// Tone carried by a tone-menu option.
pub const ATTR_TONE: &str = "data-replykit-tone";

const ANY_ENGINE_NODE: &str = "[data-replykit]";

/// Kinds of engine-owned nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineNode {
    Control,
    ToneMenu,
    ToneOption,
    Overlay,
    Notification,
}

impl EngineNode {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineNode::Control => "control",
            EngineNode::ToneMenu => "tone-menu",
            EngineNode::ToneOption => "tone-option",
            EngineNode::Overlay => "overlay",
            EngineNode::Notification => "notification",
        }
    }

    /// Selector matching nodes of this kind.
    pub fn selector(self) -> &'static str {
        match self {
            EngineNode::Control => "[data-replykit=\"control\"]",
            EngineNode::ToneMenu => "[data-replykit=\"tone-menu\"]",
            EngineNode::ToneOption => "[data-replykit=\"tone-option\"]",
            EngineNode::Overlay => "[data-replykit=\"overlay\"]",
            EngineNode::Notification => "[data-replykit=\"notification\"]",
        }
    }
}

/// Create a detached `div` of the given kind.
pub(crate) fn create<D: HostDocument + ?Sized>(
    doc: &mut D,
    kind: EngineNode,
    class: &str,
) -> Result<NodeId, DomError> {
    let node = doc.create_element("div");
    // The kind goes first so every later mutation on the node reads as ours.
    doc.set_attribute(node, ATTR_KIND, kind.as_str())?;
    doc.set_attribute(node, "class", class)?;
    Ok(node)
}

/// Whether `node` is, or sits inside, an engine-owned node.
pub(crate) fn is_engine_owned<D: HostDocument + ?Sized>(doc: &D, node: NodeId) -> bool {
    matches!(doc.closest(node, ANY_ENGINE_NODE), Ok(Some(_)))
}

/// Nearest inclusive ancestor of `node` of the given kind.
pub(crate) fn enclosing<D: HostDocument + ?Sized>(
    doc: &D,
    node: NodeId,
    kind: EngineNode,
) -> Option<NodeId> {
    doc.closest(node, kind.selector()).ok().flatten()
}

/// Container identity recorded on a control or menu.
pub(crate) fn bound_container<D: HostDocument + ?Sized>(doc: &D, node: NodeId) -> Option<NodeId> {
    doc.attribute(node, ATTR_CONTAINER)
        .and_then(|raw| NodeId::parse(&raw))
}

pub(crate) fn bind_container<D: HostDocument + ?Sized>(
    doc: &mut D,
    node: NodeId,
    container: NodeId,
) -> Result<(), DomError> {
    doc.set_attribute(node, ATTR_CONTAINER, &container.to_string())
}
