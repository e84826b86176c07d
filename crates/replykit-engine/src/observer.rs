//! The observation loop.
//!
//! Host signals are classified, coalesced by a debounce window and turned
//! into injection scans. Clicks are routed straight to the coordinator. All
//! scans run on the loop's own task, so two scans never overlap.

#[cfg(test)]
#[path = "observer_tests.rs"]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use replykit_config::ObserverConfig;
use replykit_dom::{HostDocument, HostSignal, NodeId, SharedDocument};

use crate::cycle::ReplyCoordinator;
use crate::injector::{InjectOutcome, SurfaceInjector};
use crate::markup::{self, EngineNode};

/// Attribute changes on host nodes that can reveal a compose surface.
const WATCHED_ATTRIBUTES: [&str; 2] = ["role", "aria-label"];

/// Debounce windows for each kind of trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverTiming {
    /// When false, signals are consumed but scans inject nothing.
    pub enabled: bool,
    pub mutation: Duration,
    pub navigation: Duration,
    pub external: Duration,
    /// Longest a continuous burst may postpone a scan.
    pub max_delay: Duration,
}

impl ObserverTiming {
    pub fn from_config(config: &ObserverConfig) -> Self {
        Self {
            enabled: config.enabled,
            mutation: Duration::from_millis(config.mutation_debounce_ms),
            navigation: Duration::from_millis(config.navigation_settle_ms),
            external: Duration::from_millis(config.external_scan_settle_ms),
            max_delay: Duration::from_millis(config.max_debounce_ms),
        }
    }
}

impl Default for ObserverTiming {
    fn default() -> Self {
        Self::from_config(&ObserverConfig::default())
    }
}

/// What a host signal means to the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalClass {
    /// The host tree changed in a way that may add or drop a surface.
    Mutation,
    /// In-app navigation (hash or title change).
    Navigation,
    Click(NodeId),
    /// Engine-caused churn or events the loop does not act on.
    Ignore,
}

/// Classify `signal` against the current document.
pub fn classify<D: HostDocument + ?Sized>(doc: &D, signal: &HostSignal) -> SignalClass {
    match signal {
        HostSignal::ChildList {
            target,
            added,
            removed,
        } => {
            if markup::is_engine_owned(doc, *target) {
                return SignalClass::Ignore;
            }
            let own_additions = added.iter().all(|n| markup::is_engine_owned(doc, *n));
            // Losing a control must rescan even though the node is ours.
            let own_removals = removed.iter().all(|n| {
                markup::is_engine_owned(doc, *n)
                    && doc
                        .query_selector(*n, EngineNode::Control.selector())
                        .ok()
                        .flatten()
                        .is_none()
                    && markup::enclosing(doc, *n, EngineNode::Control).is_none()
            });
            if own_additions && own_removals {
                SignalClass::Ignore
            } else {
                SignalClass::Mutation
            }
        }
        HostSignal::Attribute { target, name } => {
            if WATCHED_ATTRIBUTES.contains(&name.as_str()) && !markup::is_engine_owned(doc, *target) {
                SignalClass::Mutation
            } else {
                SignalClass::Ignore
            }
        }
        HostSignal::HashChange { .. } | HostSignal::TitleChange { .. } => SignalClass::Navigation,
        HostSignal::Click { target } => SignalClass::Click(*target),
        HostSignal::Input { .. } => SignalClass::Ignore,
    }
}

/// A scheduled scan: the burst started at `first` and fires at `deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    first: Instant,
    deadline: Instant,
}

impl Pending {
    /// Push the deadline out to `now + delay`, capped at `first + max_delay`.
    fn extend(existing: Option<Pending>, now: Instant, delay: Duration, max_delay: Duration) -> Self {
        match existing {
            None => Self {
                first: now,
                deadline: now + delay.min(max_delay),
            },
            Some(pending) => Self {
                first: pending.first,
                deadline: pending
                    .deadline
                    .max(now + delay)
                    .min(pending.first + max_delay),
            },
        }
    }
}

/// Watches the host document and keeps controls injected.
pub struct ObservationLoop<D: HostDocument> {
    doc: SharedDocument<D>,
    injector: SurfaceInjector,
    coordinator: Arc<ReplyCoordinator<D>>,
    timing: ObserverTiming,
}

impl<D: HostDocument> ObservationLoop<D> {
    pub fn new(
        doc: SharedDocument<D>,
        injector: SurfaceInjector,
        coordinator: Arc<ReplyCoordinator<D>>,
        timing: ObserverTiming,
    ) -> Self {
        Self {
            doc,
            injector,
            coordinator,
            timing,
        }
    }

    /// One injection pass over every compose window. Returns how many
    /// controls were injected.
    pub fn scan(&self) -> usize {
        let mut doc = self.doc.lock();
        self.coordinator.prune(&mut *doc);
        if !self.timing.enabled {
            trace!("Observer disabled; scan skipped");
            return 0;
        }

        let mut injected = 0;
        for result in self.injector.try_inject_all(&mut *doc) {
            match result {
                Ok(InjectOutcome::Injected { .. }) => injected += 1,
                Ok(InjectOutcome::Skipped(reason)) => trace!("Injection skipped: {}", reason),
                Err(e) => warn!("Injection failed: {}", e),
            }
        }
        injected
    }

    /// Route a click to the coordinator: tone option, control, or outside.
    pub fn handle_click(&self, target: NodeId) {
        let (option, control) = {
            let doc = self.doc.lock();
            (
                markup::enclosing(&*doc, target, EngineNode::ToneOption),
                markup::enclosing(&*doc, target, EngineNode::Control),
            )
        };

        if option.is_some() {
            match self.coordinator.choose(target) {
                Ok(ticket) => {
                    let coordinator = self.coordinator.clone();
                    tokio::spawn(async move {
                        coordinator.execute(ticket).await;
                    });
                }
                Err(e) => debug!("Ignoring tone click on {}: {}", target, e),
            }
        } else if control.is_some() {
            if let Err(e) = self.coordinator.open(target) {
                debug!("Ignoring control click on {}: {}", target, e);
                // A busy control still counts as a click away from another
                // container's menu.
                self.coordinator.outside_click(target);
            }
        } else {
            self.coordinator.outside_click(target);
        }
    }

    /// Run until cancelled or the signal stream closes. Scans once
    /// immediately on start.
    pub async fn run(
        self,
        mut signals: broadcast::Receiver<HostSignal>,
        mut scan_requests: mpsc::Receiver<()>,
        cancel: CancellationToken,
    ) {
        info!("Observation loop started");
        let injected = self.scan();
        debug!("Initial scan injected {} controls", injected);

        let mut pending: Option<Pending> = None;
        let mut requests_open = true;

        loop {
            let deadline = pending.map(|p| p.deadline);
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Observation loop shutting down");
                    break;
                }
                received = signals.recv() => match received {
                    Ok(signal) => {
                        let class = {
                            let doc = self.doc.lock();
                            classify(&*doc, &signal)
                        };
                        match class {
                            SignalClass::Mutation => pending = Some(self.schedule(pending, self.timing.mutation)),
                            SignalClass::Navigation => {
                                debug!("Navigation detected: {:?}", signal);
                                pending = Some(self.schedule(pending, self.timing.navigation));
                            }
                            SignalClass::Click(target) => self.handle_click(target),
                            SignalClass::Ignore => {}
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Observation loop lagged by {} signals; rescanning", missed);
                        pending = Some(self.schedule(pending, self.timing.mutation));
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Host signal stream closed; observation loop stopping");
                        break;
                    }
                },
                request = scan_requests.recv(), if requests_open => match request {
                    Some(()) => {
                        debug!("External scan requested");
                        pending = Some(self.schedule(pending, self.timing.external));
                    }
                    None => requests_open = false,
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    pending = None;
                    let injected = self.scan();
                    if injected > 0 {
                        debug!("Scan injected {} controls", injected);
                    }
                }
            }
        }
    }

    fn schedule(&self, pending: Option<Pending>, delay: Duration) -> Pending {
        Pending::extend(pending, Instant::now(), delay, self.timing.max_delay)
    }
}
