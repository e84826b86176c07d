//! Reply-generation cycles.
//!
//! A cycle runs `Idle → ToneSelecting → Requesting → (Success | Failed) → Idle`
//! for one compose container. Cycles are single-flight per container and
//! tracked in a registry keyed by the container's stable [`NodeId`]; there is
//! no global "current cycle".
//!
//! [`NodeId`]: replykit_dom::NodeId

mod coordinator;
mod state;

pub use coordinator::{CycleTicket, ReplyCoordinator};
pub use state::{CycleEvent, CycleFailure, CycleOutcome, CycleState};
