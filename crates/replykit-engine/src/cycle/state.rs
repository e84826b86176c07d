//! Cycle states, transitions and outcomes.

use thiserror::Error;

use replykit_dom::NodeId;

use crate::error::ReplyError;

const GENERIC_FAILURE: &str = "Error generating AI reply. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CycleState {
    #[default]
    Idle,
    ToneSelecting,
    Requesting,
    Success,
    Failed,
}

/// Inputs that move a cycle between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleEvent {
    ControlClicked,
    MenuDismissed,
    ToneChosen,
    Succeeded,
    Failed,
    /// Terminal side effects are done.
    Settled,
}

impl CycleState {
    /// The state after `event`, or `None` if the transition is not allowed.
    pub fn on(self, event: CycleEvent) -> Option<CycleState> {
        use CycleEvent as E;
        use CycleState as S;

        match (self, event) {
            (S::Idle | S::ToneSelecting, E::ControlClicked) => Some(S::ToneSelecting),
            (S::ToneSelecting, E::MenuDismissed) => Some(S::Idle),
            (S::ToneSelecting, E::ToneChosen) => Some(S::Requesting),
            (S::Requesting, E::Succeeded) => Some(S::Success),
            (S::Requesting, E::Failed) => Some(S::Failed),
            (S::Success | S::Failed, E::Settled) => Some(S::Idle),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CycleState::Success | CycleState::Failed)
    }
}

/// Why a cycle ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleFailure {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("service rejected the request with status {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("compose editor not found")]
    EditorMissing,

    #[error("could not write the reply: {0}")]
    WriteFailed(String),
}

impl CycleFailure {
    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            CycleFailure::Rejected { detail, .. } if !detail.is_empty() => {
                format!("Error generating AI reply: {}", detail)
            }
            CycleFailure::EditorMissing => {
                "Could not find the compose area to insert the reply.".to_string()
            }
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

impl From<ReplyError> for CycleFailure {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::Transport(message) => CycleFailure::Transport(message),
            ReplyError::Rejected { status, detail } => CycleFailure::Rejected { status, detail },
            ReplyError::Malformed(message) => CycleFailure::Malformed(message),
        }
    }
}

/// How a requested cycle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The reply was written into `editor`.
    Success { editor: NodeId },
    Failed(CycleFailure),
    /// The container left the document while the request was in flight.
    Abandoned,
}
