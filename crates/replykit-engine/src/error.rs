//! Error types for the engine.

use thiserror::Error;

use replykit_config::ConfigError;
use replykit_dom::{DomError, NodeId};

use crate::catalog::UiRole;

/// Errors raised while assembling or running the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A catalog selector does not parse.
    #[error("Invalid selector for {role}: {selector}")]
    InvalidSelector {
        role: UiRole,
        selector: String,
        #[source]
        source: DomError,
    },

    /// An override names a role that does not exist.
    #[error("Unknown UI role: {0}")]
    UnknownRole(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    #[error("Reply service error: {0}")]
    Client(#[from] ReplyError),
}

/// Failures talking to the reply-generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    /// Connection failure or timeout.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Non-2xx response.
    #[error("Service rejected the request with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// 2xx response without a usable `generatedReply`.
    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// A reply-cycle transition that was refused.
#[derive(Debug, Error)]
pub enum CycleError {
    /// A request is already in flight for this container.
    #[error("Reply cycle for container {0} is already requesting")]
    Busy(NodeId),

    /// A tone was chosen but no menu was open for the container.
    #[error("Container {0} is not selecting a tone")]
    NotSelecting(NodeId),

    /// The clicked node is not a live control or tone option.
    #[error("Node {0} is not a live engine control")]
    UnknownControl(NodeId),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),
}
