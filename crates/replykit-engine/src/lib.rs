//! # ReplyKit Engine
//!
//! Keeps exactly one "AI Reply" control alive per compose surface of a foreign,
//! constantly re-rendering host page, and drives one reply-generation cycle
//! per click.
//!
//! ## Architecture
//!
//! ```text
//!   HostSignal ──► ObservationLoop ──debounce──► SurfaceInjector ──► control
//!                       │                          │        │
//!                       │ clicks                   │        └─ InjectionGuard
//!                       ▼                          ▼
//!                ReplyCoordinator ◄──────── ElementLocator ◄── SelectorCatalog
//!                  │    │     │
//!         ToneMenu ┘    │     └─► NotificationPresenter
//!                       ▼
//!                  ReplyClient (POST /api/generate-reply)
//! ```
//!
//! All host access goes through [`replykit_dom::HostDocument`]. Located
//! elements are plain ids that are re-resolved on every use; nothing caches a
//! node across the network suspension.

mod catalog;
mod client;
mod cycle;
mod engine;
mod error;
mod guard;
mod injector;
mod locator;
mod markup;
mod notify;
mod observer;
mod tone;

#[cfg(test)]
mod test_support;

pub use catalog::{SelectorCatalog, SelectorEntry, SelectorRule, UiRole};
pub use client::{HttpReplyClient, ReplyClient, ReplyRequest, EMPTY_CONTENT_SENTINEL};
pub use cycle::{CycleEvent, CycleFailure, CycleOutcome, CycleState, CycleTicket, ReplyCoordinator};
pub use engine::{EngineHandle, ReplyEngine};
pub use error::{CycleError, EngineError, ReplyError};
pub use guard::InjectionGuard;
pub use injector::{InjectOutcome, SkipReason, SurfaceInjector};
pub use locator::{ElementLocator, LocatedElement, ProbeResult};
pub use markup::{EngineNode, ATTR_CONTAINER, ATTR_KIND, ATTR_TONE};
pub use notify::{NotificationPresenter, NotificationTiming, Severity};
pub use observer::{ObservationLoop, ObserverTiming, SignalClass};
pub use tone::{OpenMenu, Tone, ToneMenu, UnknownTone};

pub use replykit_config::{ReadMode, SelectorScope};
