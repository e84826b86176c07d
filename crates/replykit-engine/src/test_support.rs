//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use replykit_dom::{Document, HostDocument, NodeId};

use crate::catalog::SelectorCatalog;
use crate::client::{ReplyClient, ReplyRequest};
use crate::error::ReplyError;
use crate::locator::ElementLocator;

/// Nodes of a Gmail-like reply compose surface.
pub(crate) struct Compose {
    pub window: NodeId,
    pub toolbar: NodeId,
    pub editor_parent: NodeId,
    pub editor: NodeId,
}

/// A thread message plus one open compose dialog.
pub(crate) fn gmail_page() -> (Document, Compose) {
    let mut doc = Document::new();
    let body = doc.body();

    let thread = doc.element(body, "div", &[("class", "adn")]).unwrap();
    let message = doc.element(thread, "div", &[("class", "a3s aiL")]).unwrap();
    doc.text(message, "  Hi, are you free Tuesday?  ").unwrap();

    let compose = add_compose(&mut doc);
    (doc, compose)
}

/// Append a compose dialog with toolbar and editor to the body.
pub(crate) fn add_compose(doc: &mut Document) -> Compose {
    let body = doc.body();
    let window = doc
        .element(
            body,
            "div",
            &[("role", "dialog"), ("aria-label", "New Message")],
        )
        .unwrap();
    let toolbar = doc.element(window, "div", &[("class", "aB gQ pE")]).unwrap();
    doc.element(toolbar, "div", &[("class", "send")]).unwrap();
    let editor_parent = doc.element(window, "div", &[("class", "Ar Au")]).unwrap();
    let editor = doc
        .element(
            editor_parent,
            "div",
            &[
                ("contenteditable", "true"),
                ("role", "textbox"),
                ("aria-label", "Message Body"),
            ],
        )
        .unwrap();
    Compose {
        window,
        toolbar,
        editor_parent,
        editor,
    }
}

pub(crate) fn gmail_locator() -> ElementLocator {
    ElementLocator::new(Arc::new(SelectorCatalog::gmail()))
}

/// Reply client returning a canned result and recording requests.
pub(crate) struct StubClient {
    result: Result<String, ReplyError>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, ReplyRequest)>>,
}

impl StubClient {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            result: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: ReplyError) -> Arc<Self> {
        Arc::new(Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, ReplyRequest)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl ReplyClient for StubClient {
    async fn generate(&self, api_base: &str, request: &ReplyRequest) -> Result<String, ReplyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .push((api_base.to_string(), request.clone()));
        self.result.clone()
    }

    async fn health_check(&self, _api_base: &str) -> Result<String, ReplyError> {
        Ok("API is running".to_string())
    }
}
