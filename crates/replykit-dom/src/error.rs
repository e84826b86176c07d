//! DOM error types.

use thiserror::Error;

use crate::node::NodeId;

/// Host document errors.
#[derive(Debug, Error)]
pub enum DomError {
    /// Selector failed to parse.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// Node id is unknown to this document.
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// Operation needs an element but got a text node.
    #[error("Not an element: {0}")]
    NotAnElement(NodeId),

    /// Insertion would break the tree (cycle, root move).
    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    /// Snapshot (de)serialization error.
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// IO error while reading or writing a snapshot.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
