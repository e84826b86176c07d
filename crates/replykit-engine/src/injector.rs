//! Attaches the reply control to compose toolbars.

#[cfg(test)]
#[path = "injector_tests.rs"]
mod tests;

use std::fmt;

use tracing::{debug, info};

use replykit_dom::{DomError, HostDocument, NodeId};

use crate::catalog::UiRole;
use crate::guard::InjectionGuard;
use crate::locator::ElementLocator;
use crate::markup::{self, EngineNode};

const CONTROL_CLASS: &str = "replykit-reply-button";
const CONTROL_LABEL: &str = "AI Reply";

/// Result of one injection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    Injected { container: NodeId, control: NodeId },
    Skipped(SkipReason),
}

impl InjectOutcome {
    pub fn is_injected(&self) -> bool {
        matches!(self, InjectOutcome::Injected { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoWindow,
    NoToolbar,
    AlreadyPresent,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::NoWindow => "no-window",
            SkipReason::NoToolbar => "no-toolbar",
            SkipReason::AlreadyPresent => "already-present",
        })
    }
}

/// Locator plus guard: attaches at most one control per compose window.
#[derive(Debug, Clone)]
pub struct SurfaceInjector {
    locator: ElementLocator,
    guard: InjectionGuard,
}

impl SurfaceInjector {
    pub fn new(locator: ElementLocator) -> Self {
        Self {
            locator,
            guard: InjectionGuard::new(),
        }
    }

    pub fn locator(&self) -> &ElementLocator {
        &self.locator
    }

    /// Inject into the first resolvable compose window.
    pub fn try_inject<D: HostDocument + ?Sized>(&self, doc: &mut D) -> Result<InjectOutcome, DomError> {
        let Some(window) = self
            .locator
            .locate(&*doc, UiRole::ComposeWindow, None)
            .map(|found| found.node)
        else {
            return Ok(InjectOutcome::Skipped(SkipReason::NoWindow));
        };
        self.try_inject_into(doc, window)
    }

    /// Inject into every currently resolvable compose window.
    pub fn try_inject_all<D: HostDocument + ?Sized>(
        &self,
        doc: &mut D,
    ) -> Vec<Result<InjectOutcome, DomError>> {
        let windows = self.locator.locate_all(&*doc, UiRole::ComposeWindow, None);
        if windows.is_empty() {
            return vec![Ok(InjectOutcome::Skipped(SkipReason::NoWindow))];
        }
        windows
            .into_iter()
            .map(|window| self.try_inject_into(doc, window))
            .collect()
    }

    /// Inject into a specific compose window.
    pub fn try_inject_into<D: HostDocument + ?Sized>(
        &self,
        doc: &mut D,
        window: NodeId,
    ) -> Result<InjectOutcome, DomError> {
        let Some(toolbar) = self
            .locator
            .locate(&*doc, UiRole::Toolbar, Some(window))
            .map(|found| found.node)
        else {
            debug!("Compose window {} has no toolbar yet", window);
            return Ok(InjectOutcome::Skipped(SkipReason::NoToolbar));
        };

        if let Some(existing) = self.guard.existing_control(&*doc, window) {
            // A host re-render can carry our control into a new container.
            if !self.guard.is_bound(&*doc, existing, window) {
                debug!("Rebinding control {} to container {}", existing, window);
                self.guard.mark_injected(doc, existing, window)?;
            }
            return Ok(InjectOutcome::Skipped(SkipReason::AlreadyPresent));
        }

        let control = markup::create(doc, EngineNode::Control, CONTROL_CLASS)?;
        doc.set_attribute(control, "role", "button")?;
        doc.set_attribute(control, "tabindex", "0")?;
        doc.set_text(control, CONTROL_LABEL)?;
        self.guard.mark_injected(doc, control, window)?;
        doc.prepend_child(toolbar, control)?;

        info!("Injected reply control {} into container {}", control, window);
        Ok(InjectOutcome::Injected {
            container: window,
            control,
        })
    }
}
