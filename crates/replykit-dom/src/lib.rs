//! Host document model for ReplyKit.
//!
//! The engine never touches a host page directly. Everything it needs (scoped
//! selector queries, attribute and content writes, input/focus dispatch and a
//! stream of mutation signals) goes through the [`HostDocument`] trait.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  HostDocument   ┌──────────────────────┐
//! │  replykit-engine │ ──────────────► │ host page / Document │
//! │                  │ ◄────────────── │                      │
//! └──────────────────┘   HostSignal    └──────────────────────┘
//! ```
//!
//! [`Document`] is the in-memory implementation: an arena of nodes with
//! never-reused [`NodeId`]s, selectors and markup handled by `scraper`, and a
//! `tokio::sync::broadcast` channel carrying [`HostSignal`]s. It backs the
//! test suite and offline selector probing from JSON snapshots.

mod document;
mod error;
mod host;
mod node;
mod selector;
mod snapshot;

pub use document::Document;
pub use error::DomError;
pub use host::{HostDocument, SharedDocument};
pub use node::{HostSignal, NodeId};
pub use selector::Selector;
pub use snapshot::{DocumentSnapshot, SnapshotNode};
