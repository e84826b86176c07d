//! Node identity and host signals.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a host node.
///
/// Ids are allocated monotonically and never reused, so an id that outlives
/// its node can be detected (`is_attached` turns false) rather than silently
/// pointing at a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    /// Parse the form written by `to_string()` or a bare number.
    pub fn parse(s: &str) -> Option<Self> {
        s.strip_prefix('#').unwrap_or(s).parse().ok().map(Self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something the host page did that the engine may care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSignal {
    /// Children of `target` were added and/or removed.
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
    /// Attribute `name` on `target` changed.
    Attribute { target: NodeId, name: String },
    /// The location hash changed.
    HashChange { hash: String },
    /// The document title changed.
    TitleChange { title: String },
    /// The user clicked `target`.
    Click { target: NodeId },
    /// An input-changed event was dispatched on `target`.
    Input { target: NodeId },
}
