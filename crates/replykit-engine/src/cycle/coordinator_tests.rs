    use super::*;
    use crate::error::ReplyError;
    use crate::injector::{InjectOutcome, SurfaceInjector};
    use crate::notify::NotificationTiming;
    use crate::test_support::{gmail_locator, gmail_page, Compose, StubClient};
    use replykit_config::Config;
    use replykit_dom::Document;

    struct Harness {
        doc: SharedDocument<Document>,
        compose: Compose,
        control: NodeId,
        coordinator: ReplyCoordinator<Document>,
        client: Arc<StubClient>,
    }

    fn harness(client: Arc<StubClient>) -> Harness {
        let (mut doc, compose) = gmail_page();
        let outcome = SurfaceInjector::new(gmail_locator())
            .try_inject(&mut doc)
            .unwrap();
        let InjectOutcome::Injected { control, .. } = outcome else {
            panic!("Expected Injected, got {:?}", outcome);
        };

        let doc = Arc::new(Mutex::new(doc));
        let notifier = NotificationPresenter::new(doc.clone(), NotificationTiming::default());
        let coordinator = ReplyCoordinator::new(
            doc.clone(),
            gmail_locator(),
            client.clone(),
            Arc::new(Config::default()),
            notifier,
        );
        Harness {
            doc,
            compose,
            control,
            coordinator,
            client,
        }
    }

    impl Harness {
        fn option(&self, tone: Tone) -> NodeId {
            let menu = self.coordinator.open_menu().expect("menu open").menu;
            self.doc
                .lock()
                .query_selector(menu, &format!("[data-replykit-tone=\"{}\"]", tone))
                .unwrap()
                .expect("tone option")
        }

        fn notification_text(&self) -> Option<String> {
            let doc = self.doc.lock();
            doc.query_selector(doc.body(), EngineNode::Notification.selector())
                .unwrap()
                .map(|n| doc.text_content(n))
        }

        fn overlays(&self) -> usize {
            let doc = self.doc.lock();
            doc.query_selector_all(doc.body(), EngineNode::Overlay.selector())
                .unwrap()
                .len()
        }
    }

    #[test]
    fn test_open_presents_menu_and_captures_content() {
        let h = harness(StubClient::replying("unused"));
        let container = h.coordinator.open(h.control).unwrap();

        assert_eq!(container, h.compose.window);
        assert_eq!(h.coordinator.state(container), CycleState::ToneSelecting);
        let open = h.coordinator.open_menu().unwrap();
        assert_eq!(open.container, container);
        assert_eq!(open.anchor, h.control);
        assert!(h.doc.lock().is_attached(open.menu));
    }

    #[test]
    fn test_open_accepts_click_inside_control() {
        let h = harness(StubClient::replying("unused"));
        let icon = h.doc.lock().element(h.control, "span", &[]).unwrap();
        assert_eq!(h.coordinator.open(icon).unwrap(), h.compose.window);
    }

    #[test]
    fn test_open_rejects_foreign_node() {
        let h = harness(StubClient::replying("unused"));
        let result = h.coordinator.open(h.compose.toolbar);
        assert!(matches!(result, Err(CycleError::UnknownControl(_))));
    }

    #[test]
    fn test_choose_enters_requesting() {
        let h = harness(StubClient::replying("unused"));
        h.coordinator.open(h.control).unwrap();
        let ticket = h.coordinator.choose(h.option(Tone::Professional)).unwrap();

        assert_eq!(ticket.tone, Tone::Professional);
        assert_eq!(ticket.content, "Hi, are you free Tuesday?");
        assert_eq!(h.coordinator.state(ticket.container), CycleState::Requesting);
        assert!(h.coordinator.open_menu().is_none());

        let doc = h.doc.lock();
        assert_eq!(doc.parent(ticket.overlay), Some(h.compose.editor_parent));
        assert_eq!(doc.text_content(ticket.overlay), "Generating AI reply...");
        assert_eq!(
            doc.attribute(h.control, "aria-disabled").as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_click_while_requesting_is_rejected() {
        let h = harness(StubClient::replying("unused"));
        h.coordinator.open(h.control).unwrap();
        let _ticket = h.coordinator.choose(h.option(Tone::Friendly)).unwrap();

        let result = h.coordinator.open(h.control);
        assert!(matches!(result, Err(CycleError::Busy(c)) if c == h.compose.window));
        assert!(h.coordinator.open_menu().is_none());
        assert_eq!(h.overlays(), 1);
        assert_eq!(h.client.calls(), 0);
    }

    #[tokio::test]
    async fn test_execute_success_writes_editor() {
        let h = harness(StubClient::replying("Yes, Tuesday works for me."));
        h.coordinator.open(h.control).unwrap();
        let ticket = h.coordinator.choose(h.option(Tone::Professional)).unwrap();

        let outcome = h.coordinator.execute(ticket).await;
        assert_eq!(
            outcome,
            CycleOutcome::Success {
                editor: h.compose.editor
            }
        );

        {
            let doc = h.doc.lock();
            assert_eq!(doc.inner_html(h.compose.editor), "Yes, Tuesday works for me.");
            assert_eq!(doc.input_event_count(h.compose.editor), 1);
            assert_eq!(doc.focused(), Some(h.compose.editor));
            assert_eq!(doc.attribute(h.control, "aria-disabled"), None);
        }
        assert_eq!(h.overlays(), 0);
        assert_eq!(h.coordinator.state(h.compose.window), CycleState::Idle);

        let requests = h.client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://localhost:8080");
        assert_eq!(
            requests[0].1,
            ReplyRequest::new("Hi, are you free Tuesday?", Tone::Professional)
        );
    }

    #[tokio::test]
    async fn test_execute_failure_notifies_and_leaves_editor() {
        let h = harness(StubClient::failing(ReplyError::Rejected {
            status: 500,
            detail: String::new(),
        }));
        h.doc.lock().set_inner_html(h.compose.editor, "draft").unwrap();
        h.coordinator.open(h.control).unwrap();
        let ticket = h.coordinator.choose(h.option(Tone::Concise)).unwrap();

        let outcome = h.coordinator.execute(ticket).await;
        assert!(matches!(
            outcome,
            CycleOutcome::Failed(CycleFailure::Rejected { status: 500, .. })
        ));
        assert_eq!(h.doc.lock().inner_html(h.compose.editor), "draft");
        assert_eq!(h.overlays(), 0);
        assert_eq!(
            h.notification_text().as_deref(),
            Some("Error generating AI reply. Please try again.")
        );

        // The control is clickable again.
        assert!(h.coordinator.open(h.control).is_ok());
    }

    #[tokio::test]
    async fn test_editor_missing() {
        let h = harness(StubClient::replying("reply"));
        h.coordinator.open(h.control).unwrap();
        let ticket = h.coordinator.choose(h.option(Tone::Detailed)).unwrap();
        h.doc.lock().remove(h.compose.editor_parent).unwrap();

        let outcome = h.coordinator.execute(ticket).await;
        assert_eq!(outcome, CycleOutcome::Failed(CycleFailure::EditorMissing));
        assert_eq!(
            h.notification_text().as_deref(),
            Some("Could not find the compose area to insert the reply.")
        );
        assert_eq!(h.coordinator.state(h.compose.window), CycleState::Idle);
    }

    #[tokio::test]
    async fn test_container_removed_mid_request() {
        let h = harness(StubClient::replying("reply"));
        h.coordinator.open(h.control).unwrap();
        let ticket = h.coordinator.choose(h.option(Tone::Friendly)).unwrap();
        h.doc.lock().remove(h.compose.window).unwrap();

        let outcome = h.coordinator.execute(ticket).await;
        assert_eq!(outcome, CycleOutcome::Abandoned);
        assert_eq!(h.client.calls(), 1);
        assert_eq!(h.doc.lock().inner_html(h.compose.editor), "");
        assert_eq!(h.doc.lock().input_event_count(h.compose.editor), 0);
        assert_eq!(h.notification_text(), None);
        assert_eq!(h.coordinator.state(h.compose.window), CycleState::Idle);
    }

    #[tokio::test]
    async fn test_abandoned_cycle_reenables_rebound_control() {
        let h = harness(StubClient::replying("reply"));
        h.coordinator.open(h.control).unwrap();
        let ticket = h.coordinator.choose(h.option(Tone::Friendly)).unwrap();

        // Host re-render carries the toolbar, with our control, into a new dialog.
        let fresh = {
            let mut doc = h.doc.lock();
            let fresh = crate::test_support::add_compose(&mut doc);
            doc.append_child(fresh.window, h.compose.toolbar).unwrap();
            doc.remove(h.compose.window).unwrap();
            fresh
        };

        let outcome = h.coordinator.execute(ticket).await;
        assert_eq!(outcome, CycleOutcome::Abandoned);
        let doc = h.doc.lock();
        assert!(doc.is_attached(h.control));
        assert_eq!(doc.attribute(h.control, "aria-disabled"), None);
        assert_eq!(doc.inner_html(fresh.editor), "");
    }

    #[test]
    fn test_write_error_is_not_editor_missing() {
        let container = NodeId::from_raw(3);
        let editor = NodeId::from_raw(9);

        assert_eq!(
            written(container, Ok(Some(editor))),
            CycleOutcome::Success { editor }
        );
        assert_eq!(
            written(container, Ok(None)),
            CycleOutcome::Failed(CycleFailure::EditorMissing)
        );
        let outcome = written(container, Err(DomError::NotAnElement(editor)));
        assert_eq!(
            outcome,
            CycleOutcome::Failed(CycleFailure::WriteFailed("Not an element: #9".to_string()))
        );
        let CycleOutcome::Failed(failure) = outcome else {
            unreachable!();
        };
        assert_eq!(failure.user_message(), "Error generating AI reply. Please try again.");
    }

    #[tokio::test]
    async fn test_empty_quoted_source_sends_sentinel() {
        let h = harness(StubClient::replying("ok"));
        {
            let mut doc = h.doc.lock();
            let thread = doc
                .query_selector(doc.body(), ".adn")
                .unwrap()
                .unwrap();
            doc.remove(thread).unwrap();
        }
        h.coordinator.open(h.control).unwrap();
        let ticket = h.coordinator.choose(h.option(Tone::Concise)).unwrap();
        h.coordinator.execute(ticket).await;

        assert_eq!(h.client.requests()[0].1.email_content, "No email content found");
    }

    #[tokio::test]
    async fn test_textarea_editor_receives_value() {
        let h = harness(StubClient::replying("Sounds good"));
        let textarea = {
            let mut doc = h.doc.lock();
            doc.remove(h.compose.editor).unwrap();
            doc.element(
                h.compose.editor_parent,
                "textarea",
                &[("contenteditable", "true")],
            )
            .unwrap()
        };
        // Only div editors are in the catalog; point it at the textarea.
        let locator = ElementLocator::new(Arc::new(
            crate::catalog::SelectorCatalog::gmail().with_rule(
                UiRole::ComposeEditor,
                vec![crate::catalog::SelectorEntry::new("textarea")],
            ),
        ));
        let coordinator = ReplyCoordinator::new(
            h.doc.clone(),
            locator,
            h.client.clone(),
            Arc::new(Config::default()),
            NotificationPresenter::new(h.doc.clone(), NotificationTiming::default()),
        );

        coordinator.open(h.control).unwrap();
        let menu = coordinator.open_menu().unwrap().menu;
        let option = h
            .doc
            .lock()
            .query_selector(menu, "[data-replykit-tone=\"Friendly\"]")
            .unwrap()
            .unwrap();
        let ticket = coordinator.choose(option).unwrap();
        let outcome = coordinator.execute(ticket).await;

        assert_eq!(outcome, CycleOutcome::Success { editor: textarea });
        assert_eq!(h.doc.lock().value(textarea).as_deref(), Some("Sounds good"));
    }

    #[test]
    fn test_overlay_falls_back_to_window() {
        let h = harness(StubClient::replying("unused"));
        h.doc.lock().remove(h.compose.editor_parent).unwrap();
        h.coordinator.open(h.control).unwrap();
        let ticket = h.coordinator.choose(h.option(Tone::Concise)).unwrap();
        assert_eq!(h.doc.lock().parent(ticket.overlay), Some(h.compose.window));
    }

    #[test]
    fn test_outside_click_dismisses_menu() {
        let h = harness(StubClient::replying("unused"));
        h.coordinator.open(h.control).unwrap();
        let menu = h.coordinator.open_menu().unwrap().menu;
        let heading = h.doc.lock().children(menu)[0];

        assert_eq!(h.coordinator.outside_click(heading), None);
        assert_eq!(h.coordinator.outside_click(h.control), None);
        assert!(h.coordinator.open_menu().is_some());

        let dismissed = h.coordinator.outside_click(h.compose.toolbar).unwrap();
        assert_eq!(dismissed.menu, menu);
        assert!(!h.doc.lock().is_attached(menu));
        assert_eq!(h.coordinator.state(h.compose.window), CycleState::Idle);
    }

    #[test]
    fn test_choose_without_menu_is_rejected() {
        let h = harness(StubClient::replying("unused"));
        h.coordinator.open(h.control).unwrap();
        let option = h.option(Tone::Concise);
        h.coordinator.dismiss();

        assert!(matches!(
            h.coordinator.choose(option),
            Err(CycleError::UnknownControl(_))
        ));
        assert_eq!(h.overlays(), 0);
    }

    #[test]
    fn test_menu_moves_between_containers() {
        let h = harness(StubClient::replying("unused"));
        let second = {
            let mut doc = h.doc.lock();
            let second = crate::test_support::add_compose(&mut doc);
            SurfaceInjector::new(gmail_locator())
                .try_inject_into(&mut *doc, second.window)
                .unwrap();
            second
        };
        let second_control = h
            .doc
            .lock()
            .query_selector(second.toolbar, EngineNode::Control.selector())
            .unwrap()
            .unwrap();

        h.coordinator.open(h.control).unwrap();
        h.coordinator.open(second_control).unwrap();

        assert_eq!(h.coordinator.state(h.compose.window), CycleState::Idle);
        assert_eq!(h.coordinator.state(second.window), CycleState::ToneSelecting);
        assert_eq!(h.coordinator.open_menu().unwrap().container, second.window);
    }

    #[test]
    fn test_prune_drops_detached_containers() {
        let h = harness(StubClient::replying("unused"));
        h.coordinator.open(h.control).unwrap();

        let mut doc = h.doc.lock();
        doc.remove(h.compose.window).unwrap();
        assert_eq!(h.coordinator.prune(&mut *doc), 1);
        drop(doc);

        assert!(h.coordinator.open_menu().is_none());
        assert_eq!(h.coordinator.state(h.compose.window), CycleState::Idle);
    }
