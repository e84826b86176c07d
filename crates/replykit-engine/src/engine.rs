//! Engine assembly and lifecycle.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use replykit_config::{Config, SettingsSource};
use replykit_dom::{HostDocument, SharedDocument};

use crate::catalog::SelectorCatalog;
use crate::client::ReplyClient;
use crate::cycle::ReplyCoordinator;
use crate::error::EngineError;
use crate::injector::SurfaceInjector;
use crate::locator::ElementLocator;
use crate::notify::{NotificationPresenter, NotificationTiming};
use crate::observer::{ObservationLoop, ObserverTiming};

const SCAN_REQUEST_CAPACITY: usize = 16;

/// A fully wired engine for one host document.
pub struct ReplyEngine<D: HostDocument> {
    doc: SharedDocument<D>,
    locator: ElementLocator,
    injector: SurfaceInjector,
    coordinator: Arc<ReplyCoordinator<D>>,
    timing: ObserverTiming,
}

impl<D: HostDocument> ReplyEngine<D> {
    /// Build the engine. Selector overrides in `config` are validated here.
    pub fn new(
        doc: SharedDocument<D>,
        config: &Config,
        settings: Arc<dyn SettingsSource>,
        client: Arc<dyn ReplyClient>,
    ) -> Result<Self, EngineError> {
        let catalog = SelectorCatalog::gmail().with_overrides(&config.selectors)?;
        let locator = ElementLocator::new(Arc::new(catalog));
        let injector = SurfaceInjector::new(locator.clone());
        let notifier = NotificationPresenter::new(
            doc.clone(),
            NotificationTiming::from_config(&config.notifications),
        );
        let coordinator = Arc::new(ReplyCoordinator::new(
            doc.clone(),
            locator.clone(),
            client,
            settings,
            notifier,
        ));

        Ok(Self {
            doc,
            locator,
            injector,
            coordinator,
            timing: ObserverTiming::from_config(&config.observer),
        })
    }

    pub fn coordinator(&self) -> &Arc<ReplyCoordinator<D>> {
        &self.coordinator
    }

    pub fn injector(&self) -> &SurfaceInjector {
        &self.injector
    }

    pub fn locator(&self) -> &ElementLocator {
        &self.locator
    }

    pub fn document(&self) -> &SharedDocument<D> {
        &self.doc
    }

    /// Spawn the observation loop. Must be called inside a tokio runtime.
    pub fn start(&self) -> EngineHandle {
        // Subscribed before the spawn; the loop sees every later signal.
        let signals = self.doc.lock().subscribe();
        let (scans, requests) = mpsc::channel(SCAN_REQUEST_CAPACITY);
        let cancel = CancellationToken::new();

        let observer = ObservationLoop::new(
            self.doc.clone(),
            self.injector.clone(),
            self.coordinator.clone(),
            self.timing,
        );
        let task = tokio::spawn(observer.run(signals, requests, cancel.clone()));
        info!("Reply engine started");

        EngineHandle {
            scans,
            cancel,
            task,
        }
    }
}

/// Control handle for a running observation loop.
pub struct EngineHandle {
    scans: mpsc::Sender<()>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Ask for a scan after the external settle delay. Requests coalesce; a
    /// full queue already guarantees one.
    pub fn request_scan(&self) {
        match self.scans.try_send(()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(())) => debug!("Scan already queued"),
            Err(mpsc::error::TrySendError::Closed(())) => warn!("Observation loop is not running"),
        }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Signal the loop to stop without waiting for it.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Wait for the loop to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!("Observation loop task failed: {}", e);
        }
    }
}
