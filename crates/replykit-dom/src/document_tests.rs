    use super::*;

    fn compose_doc() -> (Document, NodeId, NodeId, NodeId) {
        let mut doc = Document::new();
        let body = doc.body();
        let dialog = doc
            .element(body, "div", &[("role", "dialog"), ("aria-label", "New Message")])
            .unwrap();
        let toolbar = doc.element(dialog, "div", &[("role", "toolbar")]).unwrap();
        let editor = doc
            .element(
                dialog,
                "div",
                &[("contenteditable", "true"), ("role", "textbox")],
            )
            .unwrap();
        (doc, dialog, toolbar, editor)
    }

    #[test]
    fn test_new_document_has_attached_body() {
        let doc = Document::new();
        assert!(doc.is_attached(doc.body()));
        assert_eq!(doc.tag_name(doc.body()).as_deref(), Some("body"));
    }

    #[test]
    fn test_query_selector_document_order() {
        let (mut doc, dialog, toolbar, _) = compose_doc();
        let second = doc.element(dialog, "div", &[("role", "toolbar")]).unwrap();

        let first = doc.query_selector(doc.body(), "[role=\"toolbar\"]").unwrap();
        assert_eq!(first, Some(toolbar));

        let all = doc.query_selector_all(doc.body(), "[role=\"toolbar\"]").unwrap();
        assert_eq!(all, vec![toolbar, second]);
    }

    #[test]
    fn test_query_selector_excludes_scope() {
        let (doc, dialog, _, _) = compose_doc();
        let found = doc.query_selector(dialog, "div[role=\"dialog\"]").unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_query_selector_invalid() {
        let doc = Document::new();
        let result = doc.query_selector(doc.body(), "div[");
        assert!(matches!(result, Err(DomError::InvalidSelector { .. })));
    }

    #[test]
    fn test_prepend_child_goes_first() {
        let (mut doc, _, toolbar, _) = compose_doc();
        let existing = doc.element(toolbar, "span", &[]).unwrap();
        let button = doc.create_element("div");
        doc.prepend_child(toolbar, button).unwrap();
        assert_eq!(doc.children(toolbar), vec![button, existing]);
    }

    #[test]
    fn test_remove_detaches_subtree() {
        let (mut doc, dialog, toolbar, editor) = compose_doc();
        doc.remove(dialog).unwrap();

        assert!(!doc.is_attached(dialog));
        assert!(!doc.is_attached(toolbar));
        assert!(!doc.is_attached(editor));
        // Detached nodes stay addressable.
        assert_eq!(doc.attribute(dialog, "role").as_deref(), Some("dialog"));
        assert_eq!(doc.query_selector(doc.body(), "div").unwrap(), None);
    }

    #[test]
    fn test_remove_clears_focus_inside() {
        let (mut doc, dialog, _, editor) = compose_doc();
        doc.focus(editor).unwrap();
        doc.remove(dialog).unwrap();
        assert_eq!(doc.focused(), None);
    }

    #[test]
    fn test_cannot_remove_body() {
        let mut doc = Document::new();
        let body = doc.body();
        assert!(matches!(
            doc.remove(body),
            Err(DomError::HierarchyRequest(_))
        ));
    }

    #[test]
    fn test_append_rejects_cycle() {
        let (mut doc, dialog, toolbar, _) = compose_doc();
        let result = doc.append_child(toolbar, dialog);
        assert!(matches!(result, Err(DomError::HierarchyRequest(_))));
    }

    #[test]
    fn test_append_moves_existing_node() {
        let (mut doc, dialog, toolbar, editor) = compose_doc();
        doc.append_child(toolbar, editor).unwrap();
        assert_eq!(doc.parent(editor), Some(toolbar));
        assert!(!doc.children(dialog).contains(&editor));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let (mut doc, dialog, _, _) = compose_doc();
        doc.remove(dialog).unwrap();
        let fresh = doc.create_element("div");
        assert!(fresh > dialog);
        assert_ne!(fresh, dialog);
    }

    #[test]
    fn test_text_content_and_set_text() {
        let (mut doc, dialog, toolbar, _) = compose_doc();
        doc.text(toolbar, "Send").unwrap();
        doc.set_text(dialog, "Replaced").unwrap();
        assert_eq!(doc.text_content(dialog), "Replaced");
        assert!(!doc.is_attached(toolbar));
    }

    #[test]
    fn test_inner_html_is_parsed_into_nodes() {
        let (mut doc, _, _, editor) = compose_doc();
        doc.set_inner_html(editor, "Hello <b>there</b>").unwrap();
        assert_eq!(doc.inner_html(editor), "Hello <b>there</b>");
        assert_eq!(doc.text_content(editor), "Hello there");

        let bold = doc.query_selector(editor, "b").unwrap().unwrap();
        assert_eq!(doc.parent(bold), Some(editor));
        assert_eq!(doc.children(editor).len(), 2);
    }

    #[test]
    fn test_inner_html_markup_is_queryable() {
        let (mut doc, dialog, _, editor) = compose_doc();
        doc.set_inner_html(
            editor,
            "<p class=\"greeting\">Hi &amp; welcome<br>Bye</p><!-- note -->",
        )
        .unwrap();

        let line_break = doc
            .query_selector(dialog, "[role=textbox] > p.greeting > br")
            .unwrap();
        assert!(line_break.is_some());
        assert_eq!(doc.text_content(editor), "Hi & welcomeBye");
        assert_eq!(
            doc.inner_html(editor),
            "<p class=\"greeting\">Hi &amp; welcome<br>Bye</p>"
        );
    }

    #[tokio::test]
    async fn test_inner_html_is_one_mutation() {
        let (mut doc, _, _, editor) = compose_doc();
        let old = doc.text(editor, "draft").unwrap();
        let mut rx = doc.subscribe();

        doc.set_inner_html(editor, "<span>a</span><span>b</span>").unwrap();
        let HostSignal::ChildList {
            target,
            added,
            removed,
        } = rx.recv().await.unwrap()
        else {
            panic!("Expected a child list signal");
        };
        assert_eq!(target, editor);
        assert_eq!(added, doc.children(editor));
        assert_eq!(added.len(), 2);
        assert_eq!(removed, vec![old]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_inner_html_serializes_elements() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.element(body, "div", &[("class", "a\"b")]).unwrap();
        doc.text(div, "x < y").unwrap();
        assert_eq!(
            doc.inner_html(body),
            "<div class=\"a&quot;b\">x &lt; y</div>"
        );
    }

    #[test]
    fn test_value_prefers_property_over_attribute() {
        let mut doc = Document::new();
        let body = doc.body();
        let input = doc.element(body, "input", &[("value", "attr")]).unwrap();
        assert_eq!(doc.value(input).as_deref(), Some("attr"));
        doc.set_value(input, "typed").unwrap();
        assert_eq!(doc.value(input).as_deref(), Some("typed"));
    }

    #[test]
    fn test_attribute_set_and_remove() {
        let (mut doc, _, toolbar, _) = compose_doc();
        doc.set_attribute(toolbar, "Aria-Label", "Formatting").unwrap();
        assert_eq!(doc.attribute(toolbar, "aria-label").as_deref(), Some("Formatting"));
        doc.remove_attribute(toolbar, "aria-label").unwrap();
        assert_eq!(doc.attribute(toolbar, "aria-label"), None);
    }

    #[test]
    fn test_text_node_is_not_element() {
        let mut doc = Document::new();
        let body = doc.body();
        let text = doc.text(body, "hi").unwrap();
        assert!(matches!(
            doc.set_attribute(text, "a", "b"),
            Err(DomError::NotAnElement(_))
        ));
    }

    #[test]
    fn test_closest_and_contains() {
        let (mut doc, dialog, toolbar, _) = compose_doc();
        let icon = doc.element(toolbar, "span", &[]).unwrap();
        assert_eq!(
            doc.closest(icon, "div[role=\"dialog\"]").unwrap(),
            Some(dialog)
        );
        assert_eq!(doc.closest(icon, "span").unwrap(), Some(icon));
        assert!(doc.contains(dialog, icon));
        assert!(!doc.contains(icon, dialog));
    }

    #[test]
    fn test_dispatch_input_and_focus() {
        let (mut doc, _, _, editor) = compose_doc();
        doc.dispatch_input(editor).unwrap();
        doc.dispatch_input(editor).unwrap();
        doc.focus(editor).unwrap();
        assert_eq!(doc.input_event_count(editor), 2);
        assert_eq!(doc.focused(), Some(editor));
    }

    #[tokio::test]
    async fn test_signals_for_mutations_and_navigation() {
        let mut doc = Document::new();
        let mut rx = doc.subscribe();
        let body = doc.body();

        let div = doc.element(body, "div", &[]).unwrap();
        doc.set_attribute(div, "role", "dialog").unwrap();
        doc.set_location_hash("#inbox?compose=new");
        doc.set_title("Compose");
        doc.click(div).unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            HostSignal::ChildList {
                target: body,
                added: vec![div],
                removed: vec![]
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            HostSignal::Attribute {
                target: div,
                name: "role".to_string()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            HostSignal::HashChange {
                hash: "#inbox?compose=new".to_string()
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            HostSignal::TitleChange {
                title: "Compose".to_string()
            }
        );
        assert_eq!(rx.recv().await.unwrap(), HostSignal::Click { target: div });
    }

    #[tokio::test]
    async fn test_remove_signals_removed_node() {
        let (mut doc, dialog, _, _) = compose_doc();
        let mut rx = doc.subscribe();
        doc.remove(dialog).unwrap();
        assert_eq!(
            rx.recv().await.unwrap(),
            HostSignal::ChildList {
                target: doc.body(),
                added: vec![],
                removed: vec![dialog]
            }
        );
    }
