//! The reply cycle coordinator.

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use replykit_config::SettingsSource;
use replykit_dom::{DomError, HostDocument, NodeId, SharedDocument};

use super::state::{CycleEvent, CycleFailure, CycleOutcome, CycleState};
use crate::catalog::UiRole;
use crate::client::{ReplyClient, ReplyRequest};
use crate::error::{CycleError, ReplyError};
use crate::locator::ElementLocator;
use crate::markup::{self, EngineNode};
use crate::notify::{NotificationPresenter, Severity};
use crate::tone::{OpenMenu, Tone, ToneMenu};

const OVERLAY_CLASS: &str = "replykit-loading-overlay";
const OVERLAY_TEXT: &str = "Generating AI reply...";
const SUCCESS_MESSAGE: &str = "AI reply inserted.";

#[derive(Debug, Clone)]
struct CycleEntry {
    state: CycleState,
    control: NodeId,
    /// Quoted source captured when the menu opened.
    content: String,
}

/// A cycle that has entered `Requesting`. Must be handed to
/// [`ReplyCoordinator::execute`], which issues the single request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a ticket leaves its container Requesting until executed"]
pub struct CycleTicket {
    pub container: NodeId,
    pub control: NodeId,
    pub tone: Tone,
    pub content: String,
    pub overlay: NodeId,
}

/// Drives reply cycles for every compose container.
///
/// Lock order is document, then menu, then registry. No lock is held across
/// the network call.
pub struct ReplyCoordinator<D: HostDocument> {
    doc: SharedDocument<D>,
    locator: ElementLocator,
    client: Arc<dyn ReplyClient>,
    settings: Arc<dyn SettingsSource>,
    notifier: NotificationPresenter<D>,
    menu: Mutex<ToneMenu>,
    cycles: Mutex<HashMap<NodeId, CycleEntry>>,
}

impl<D: HostDocument> ReplyCoordinator<D> {
    pub fn new(
        doc: SharedDocument<D>,
        locator: ElementLocator,
        client: Arc<dyn ReplyClient>,
        settings: Arc<dyn SettingsSource>,
        notifier: NotificationPresenter<D>,
    ) -> Self {
        Self {
            doc,
            locator,
            client,
            settings,
            notifier,
            menu: Mutex::new(ToneMenu::new()),
            cycles: Mutex::new(HashMap::new()),
        }
    }

    /// Current state of `container`'s cycle.
    pub fn state(&self, container: NodeId) -> CycleState {
        self.cycles
            .lock()
            .get(&container)
            .map_or(CycleState::Idle, |entry| entry.state)
    }

    pub fn open_menu(&self) -> Option<OpenMenu> {
        self.menu.lock().current()
    }

    pub fn notifier(&self) -> &NotificationPresenter<D> {
        &self.notifier
    }

    /// Control click: capture the quoted source and present the tone menu.
    /// `target` may be the control or any node inside it. Returns the
    /// container.
    pub fn open(&self, target: NodeId) -> Result<NodeId, CycleError> {
        let mut doc = self.doc.lock();
        let (control, container) = resolve_control(&*doc, target)?;

        let mut menu = self.menu.lock();
        let mut cycles = self.cycles.lock();
        let state = cycles
            .get(&container)
            .map_or(CycleState::Idle, |entry| entry.state);
        let next = state
            .on(CycleEvent::ControlClicked)
            .ok_or(CycleError::Busy(container))?;

        let content = self
            .locator
            .read_content(&*doc, UiRole::QuotedSource, Some(container));
        if let Some(replaced) = menu.present(&mut *doc, control, container)? {
            if replaced.container != container {
                settle_dismissed(&mut cycles, replaced.container);
            }
        }

        debug!(
            "Cycle for {} selecting tone ({} chars of quoted source)",
            container,
            content.len()
        );
        cycles.insert(
            container,
            CycleEntry {
                state: next,
                control,
                content,
            },
        );
        Ok(container)
    }

    /// Outside click: dismiss the menu unless `target` lies inside it or
    /// inside the control that opened it.
    pub fn outside_click(&self, target: NodeId) -> Option<OpenMenu> {
        let mut doc = self.doc.lock();
        let mut menu = self.menu.lock();
        if menu.contains(&*doc, target) || menu.is_anchor(&*doc, target) {
            return None;
        }
        let dismissed = menu.dismiss(&mut *doc)?;
        settle_dismissed(&mut self.cycles.lock(), dismissed.container);
        debug!("Tone menu for {} dismissed by outside click", dismissed.container);
        Some(dismissed)
    }

    /// Dismiss the menu unconditionally.
    pub fn dismiss(&self) -> Option<OpenMenu> {
        let mut doc = self.doc.lock();
        let dismissed = self.menu.lock().dismiss(&mut *doc)?;
        settle_dismissed(&mut self.cycles.lock(), dismissed.container);
        Some(dismissed)
    }

    /// Tone choice: close the menu, show the loading overlay, disable the
    /// control and move to `Requesting`.
    pub fn choose(&self, option: NodeId) -> Result<CycleTicket, CycleError> {
        let mut doc = self.doc.lock();
        let mut menu = self.menu.lock();
        let (tone, open) = menu
            .chosen(&*doc, option)
            .ok_or(CycleError::UnknownControl(option))?;
        menu.dismiss(&mut *doc);

        let container = open.container;
        let mut cycles = self.cycles.lock();
        if !doc.is_attached(container) {
            cycles.remove(&container);
            return Err(CycleError::UnknownControl(container));
        }

        let Some(entry) = cycles.get_mut(&container) else {
            return Err(CycleError::NotSelecting(container));
        };
        let next = entry
            .state
            .on(CycleEvent::ToneChosen)
            .ok_or(CycleError::NotSelecting(container))?;

        let overlay = self.show_overlay(&mut *doc, container)?;
        if doc.is_attached(entry.control) {
            doc.set_attribute(entry.control, "aria-disabled", "true")?;
        }
        entry.state = next;

        info!("Requesting {} reply for container {}", tone, container);
        Ok(CycleTicket {
            container,
            control: entry.control,
            tone,
            content: entry.content.clone(),
            overlay,
        })
    }

    /// Issue the request for `ticket` and apply the result.
    pub async fn execute(&self, ticket: CycleTicket) -> CycleOutcome {
        let api_url = self.settings.api_url();
        let request = ReplyRequest::new(ticket.content.clone(), ticket.tone);
        let result = self.client.generate(&api_url, &request).await;

        let outcome = self.complete(&ticket, result);
        self.report(ticket.container, &outcome);
        outcome
    }

    /// Drop registry entries and menus whose container left the document.
    /// Called with the document already locked by the caller.
    pub fn prune(&self, doc: &mut D) -> usize {
        let mut menu = self.menu.lock();
        if let Some(open) = menu.current() {
            if !doc.is_attached(open.container) {
                menu.dismiss(doc);
            }
        }
        let selecting_for = menu.current().map(|open| open.container);

        let mut cycles = self.cycles.lock();
        let before = cycles.len();
        cycles.retain(|container, entry| match entry.state {
            CycleState::Requesting => true,
            CycleState::ToneSelecting => selecting_for == Some(*container),
            _ => doc.is_attached(*container),
        });
        let pruned = before - cycles.len();
        if pruned > 0 {
            debug!("Pruned {} stale reply cycles", pruned);
        }
        pruned
    }

    fn show_overlay(&self, doc: &mut D, container: NodeId) -> Result<NodeId, DomError> {
        let host = self
            .locator
            .locate(&*doc, UiRole::ComposeEditor, Some(container))
            .map(|found| found.node)
            .and_then(|editor| doc.parent(editor))
            .unwrap_or(container);

        let overlay = markup::create(doc, EngineNode::Overlay, OVERLAY_CLASS)?;
        doc.set_attribute(overlay, "aria-busy", "true")?;
        doc.set_text(overlay, OVERLAY_TEXT)?;
        doc.append_child(host, overlay)?;
        Ok(overlay)
    }

    fn complete(
        &self,
        ticket: &CycleTicket,
        result: Result<String, ReplyError>,
    ) -> CycleOutcome {
        let mut doc = self.doc.lock();
        let mut cycles = self.cycles.lock();
        let container = ticket.container;

        if !doc.is_attached(container) {
            cycles.remove(&container);
            // The control may have been carried into a live container.
            release(&mut *doc, ticket);
            debug!("Container {} detached mid-request; reply dropped", container);
            return CycleOutcome::Abandoned;
        }

        let outcome = match result {
            Ok(reply) => written(container, self.write_reply(&mut *doc, container, &reply)),
            Err(e) => CycleOutcome::Failed(e.into()),
        };
        release(&mut *doc, ticket);

        let event = match outcome {
            CycleOutcome::Success { .. } => CycleEvent::Succeeded,
            _ => CycleEvent::Failed,
        };
        let state = cycles
            .get(&container)
            .map_or(CycleState::Idle, |entry| entry.state);
        match state.on(event).and_then(|terminal| terminal.on(CycleEvent::Settled)) {
            Some(_) => {}
            None => warn!("Cycle for {} completed from unexpected state {:?}", container, state),
        }
        cycles.remove(&container);
        outcome
    }

    /// Write into the editor located now, not the one seen before the request.
    fn write_reply(&self, doc: &mut D, container: NodeId, reply: &str) -> Result<Option<NodeId>, DomError> {
        let Some(editor) = self
            .locator
            .locate(&*doc, UiRole::ComposeEditor, Some(container))
            .map(|found| found.node)
        else {
            return Ok(None);
        };

        match doc.tag_name(editor).as_deref() {
            Some("input") | Some("textarea") => doc.set_value(editor, reply)?,
            _ => doc.set_inner_html(editor, reply)?,
        }
        doc.dispatch_input(editor)?;
        doc.focus(editor)?;
        Ok(Some(editor))
    }

    fn report(&self, container: NodeId, outcome: &CycleOutcome) {
        let shown = match outcome {
            CycleOutcome::Success { editor } => {
                info!("Reply written into editor {} of container {}", editor, container);
                self.notifier.show(SUCCESS_MESSAGE, Severity::Success)
            }
            CycleOutcome::Failed(failure) => {
                warn!("Reply cycle for container {} failed: {}", container, failure);
                self.notifier.show(&failure.user_message(), Severity::Error)
            }
            CycleOutcome::Abandoned => return,
        };
        if let Err(e) = shown {
            warn!("Failed to show notification: {}", e);
        }
    }
}

/// Outcome of a reply write into `container`.
fn written(container: NodeId, result: Result<Option<NodeId>, DomError>) -> CycleOutcome {
    match result {
        Ok(Some(editor)) => CycleOutcome::Success { editor },
        Ok(None) => CycleOutcome::Failed(CycleFailure::EditorMissing),
        Err(e) => {
            warn!("Failed to write reply into container {}: {}", container, e);
            CycleOutcome::Failed(CycleFailure::WriteFailed(e.to_string()))
        }
    }
}

/// Remove the loading overlay and re-enable the control if it is still live.
fn release<D: HostDocument + ?Sized>(doc: &mut D, ticket: &CycleTicket) {
    if doc.is_attached(ticket.overlay) {
        if let Err(e) = doc.remove(ticket.overlay) {
            debug!("Could not remove overlay {}: {}", ticket.overlay, e);
        }
    }
    if doc.is_attached(ticket.control) {
        if let Err(e) = doc.remove_attribute(ticket.control, "aria-disabled") {
            debug!("Could not re-enable control {}: {}", ticket.control, e);
        }
    }
}

/// The control enclosing `target` and the live container it is bound to.
fn resolve_control<D: HostDocument + ?Sized>(
    doc: &D,
    target: NodeId,
) -> Result<(NodeId, NodeId), CycleError> {
    let control = markup::enclosing(doc, target, EngineNode::Control)
        .ok_or(CycleError::UnknownControl(target))?;
    let container =
        markup::bound_container(doc, control).ok_or(CycleError::UnknownControl(control))?;
    if !doc.is_attached(control) || !doc.is_attached(container) {
        return Err(CycleError::UnknownControl(control));
    }
    Ok((control, container))
}

fn settle_dismissed(cycles: &mut HashMap<NodeId, CycleEntry>, container: NodeId) {
    if let Some(entry) = cycles.get(&container) {
        if entry.state.on(CycleEvent::MenuDismissed) == Some(CycleState::Idle) {
            cycles.remove(&container);
        }
    }
}
