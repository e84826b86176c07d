//! Transient status notifications.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use replykit_config::NotificationConfig;
use replykit_dom::{DomError, HostDocument, NodeId, SharedDocument};

use crate::markup::{self, EngineNode};

const NOTIFICATION_CLASS: &str = "replykit-notification";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a notification stays up and how long its exit transition runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationTiming {
    pub display: Duration,
    pub exit: Duration,
}

impl NotificationTiming {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            display: Duration::from_millis(config.display_ms),
            exit: Duration::from_millis(config.exit_transition_ms),
        }
    }
}

impl Default for NotificationTiming {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
struct Shown {
    node: NodeId,
    generation: u64,
}

#[derive(Debug, Default)]
struct PresenterState {
    shown: Option<Shown>,
    generation: u64,
}

/// Shows one notification at a time. A new notification replaces the visible
/// one; each auto-dismisses after `display`, then `data-state="leaving"` for
/// `exit`, then removal.
pub struct NotificationPresenter<D: HostDocument> {
    doc: SharedDocument<D>,
    timing: NotificationTiming,
    state: Arc<Mutex<PresenterState>>,
}

impl<D: HostDocument> NotificationPresenter<D> {
    pub fn new(doc: SharedDocument<D>, timing: NotificationTiming) -> Self {
        Self {
            doc,
            timing,
            state: Arc::new(Mutex::new(PresenterState::default())),
        }
    }

    /// Show `message`. Must be called without holding the document lock.
    ///
    /// Auto-dismissal runs on the current tokio runtime; outside a runtime the
    /// notification stays until replaced.
    pub fn show(&self, message: &str, severity: Severity) -> Result<NodeId, DomError> {
        let (node, generation) = {
            let mut doc = self.doc.lock();
            let mut state = self.state.lock();

            if let Some(previous) = state.shown.take() {
                doc.remove(previous.node)?;
            }

            let node = markup::create(&mut *doc, EngineNode::Notification, NOTIFICATION_CLASS)?;
            doc.set_attribute(node, "data-severity", severity.as_str())?;
            doc.set_attribute(node, "data-state", "visible")?;
            doc.set_attribute(node, "role", "status")?;
            doc.set_text(node, message)?;
            let body = doc.body();
            doc.append_child(body, node)?;

            state.generation += 1;
            let generation = state.generation;
            state.shown = Some(Shown { node, generation });
            (node, generation)
        };

        debug!("Notification {} shown ({}): {}", node, severity, message);
        self.schedule_dismissal(generation);
        Ok(node)
    }

    /// The notification currently on screen.
    pub fn current(&self) -> Option<NodeId> {
        self.state.lock().shown.map(|shown| shown.node)
    }

    fn schedule_dismissal(&self, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No tokio runtime; notification will not auto-dismiss");
            return;
        };
        let doc = self.doc.clone();
        let state = self.state.clone();
        let timing = self.timing;

        runtime.spawn(async move {
            tokio::time::sleep(timing.display).await;
            if !begin_exit(&doc, &state, generation) {
                return;
            }
            tokio::time::sleep(timing.exit).await;
            finish_exit(&doc, &state, generation);
        });
    }
}

/// Mark the notification as leaving; false if it was already replaced.
fn begin_exit<D: HostDocument>(
    doc: &SharedDocument<D>,
    state: &Mutex<PresenterState>,
    generation: u64,
) -> bool {
    let mut doc = doc.lock();
    let state = state.lock();
    match state.shown {
        Some(shown) if shown.generation == generation => {
            if let Err(e) = doc.set_attribute(shown.node, "data-state", "leaving") {
                debug!("Notification {} vanished before exit: {}", shown.node, e);
            }
            true
        }
        _ => false,
    }
}

fn finish_exit<D: HostDocument>(
    doc: &SharedDocument<D>,
    state: &Mutex<PresenterState>,
    generation: u64,
) {
    let mut doc = doc.lock();
    let mut state = state.lock();
    if let Some(shown) = state.shown.filter(|s| s.generation == generation) {
        state.shown = None;
        if let Err(e) = doc.remove(shown.node) {
            debug!("Notification {} already removed: {}", shown.node, e);
        }
    }
}
