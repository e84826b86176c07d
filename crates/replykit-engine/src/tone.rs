//! Tone vocabulary and the transient tone menu.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use replykit_dom::{DomError, HostDocument, NodeId};

use crate::markup::{self, EngineNode, ATTR_TONE};

const MENU_CLASS: &str = "replykit-tone-menu";
const MENU_HEADING: &str = "Select tone for AI reply:";

/// Tone requested for a generated reply. Serialized as the capitalized name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tone {
    Professional,
    Friendly,
    Concise,
    Detailed,
}

impl Tone {
    pub const ALL: [Tone; 4] = [Tone::Professional, Tone::Friendly, Tone::Concise, Tone::Detailed];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "Professional",
            Tone::Friendly => "Friendly",
            Tone::Concise => "Concise",
            Tone::Detailed => "Detailed",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown tone: {0}")]
pub struct UnknownTone(pub String);

impl FromStr for Tone {
    type Err = UnknownTone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|tone| tone.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTone(s.to_string()))
    }
}

/// The menu currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMenu {
    pub menu: NodeId,
    pub anchor: NodeId,
    pub container: NodeId,
}

/// At most one tone menu exists at a time; presenting a new one removes the
/// previous one.
#[derive(Debug, Default)]
pub struct ToneMenu {
    open: Option<OpenMenu>,
}

impl ToneMenu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<OpenMenu> {
        self.open
    }

    /// Show the menu for `container`, anchored at `anchor`. Returns whatever
    /// menu was replaced.
    pub fn present<D: HostDocument + ?Sized>(
        &mut self,
        doc: &mut D,
        anchor: NodeId,
        container: NodeId,
    ) -> Result<Option<OpenMenu>, DomError> {
        let replaced = self.dismiss(doc);

        let menu = markup::create(doc, EngineNode::ToneMenu, MENU_CLASS)?;
        markup::bind_container(doc, menu, container)?;
        doc.set_attribute(menu, "role", "menu")?;

        let heading = doc.create_element("div");
        doc.set_attribute(heading, "class", "replykit-tone-heading")?;
        doc.set_text(heading, MENU_HEADING)?;
        doc.append_child(menu, heading)?;

        for tone in Tone::ALL {
            let option = markup::create(doc, EngineNode::ToneOption, "replykit-tone-option")?;
            doc.set_attribute(option, ATTR_TONE, tone.as_str())?;
            doc.set_attribute(option, "role", "menuitem")?;
            doc.set_text(option, tone.as_str())?;
            doc.append_child(menu, option)?;
        }

        let body = doc.body();
        doc.append_child(body, menu)?;
        debug!("Tone menu {} opened for container {}", menu, container);

        self.open = Some(OpenMenu {
            menu,
            anchor,
            container,
        });
        Ok(replaced)
    }

    /// Remove the open menu, if any.
    pub fn dismiss<D: HostDocument + ?Sized>(&mut self, doc: &mut D) -> Option<OpenMenu> {
        let open = self.open.take()?;
        if let Err(e) = doc.remove(open.menu) {
            debug!("Tone menu {} already gone: {}", open.menu, e);
        }
        Some(open)
    }

    /// Whether `node` lies inside the open menu.
    pub fn contains<D: HostDocument + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.open.is_some_and(|open| doc.contains(open.menu, node))
    }

    /// Whether `node` lies inside the control that opened the menu.
    pub fn is_anchor<D: HostDocument + ?Sized>(&self, doc: &D, node: NodeId) -> bool {
        self.open.is_some_and(|open| doc.contains(open.anchor, node))
    }

    /// The tone and menu owner for a click on `node`, if it hit an option of
    /// the open menu.
    pub fn chosen<D: HostDocument + ?Sized>(&self, doc: &D, node: NodeId) -> Option<(Tone, OpenMenu)> {
        let open = self.open?;
        let option = markup::enclosing(doc, node, EngineNode::ToneOption)?;
        if !doc.contains(open.menu, option) {
            return None;
        }
        let tone = doc.attribute(option, ATTR_TONE)?.parse().ok()?;
        Some((tone, open))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replykit_dom::Document;

    fn options(doc: &Document, menu: NodeId) -> Vec<NodeId> {
        doc.query_selector_all(menu, EngineNode::ToneOption.selector())
            .unwrap()
    }

    #[test]
    fn test_tone_parse_and_display() {
        assert_eq!("professional".parse::<Tone>().unwrap(), Tone::Professional);
        assert_eq!(" Concise ".parse::<Tone>().unwrap(), Tone::Concise);
        assert_eq!(Tone::Detailed.to_string(), "Detailed");
        assert_eq!("Snarky".parse::<Tone>(), Err(UnknownTone("Snarky".to_string())));
    }

    #[test]
    fn test_tone_serializes_capitalized() {
        let json = serde_json::to_string(&Tone::Friendly).unwrap();
        assert_eq!(json, "\"Friendly\"");
    }

    #[test]
    fn test_present_builds_menu() {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.element(body, "div", &[]).unwrap();
        let anchor = doc.element(container, "div", &[]).unwrap();
        let mut menu = ToneMenu::new();

        assert_eq!(menu.present(&mut doc, anchor, container).unwrap(), None);
        let open = menu.current().unwrap();

        assert_eq!(doc.parent(open.menu), Some(body));
        assert!(doc.text_content(open.menu).starts_with("Select tone for AI reply:"));
        let tones: Vec<String> = options(&doc, open.menu)
            .into_iter()
            .map(|o| doc.text_content(o))
            .collect();
        assert_eq!(tones, vec!["Professional", "Friendly", "Concise", "Detailed"]);
    }

    #[test]
    fn test_single_menu_system_wide() {
        let mut doc = Document::new();
        let body = doc.body();
        let a = doc.element(body, "div", &[]).unwrap();
        let b = doc.element(body, "div", &[]).unwrap();
        let mut menu = ToneMenu::new();

        menu.present(&mut doc, a, a).unwrap();
        let first = menu.current().unwrap();
        let replaced = menu.present(&mut doc, b, b).unwrap();

        assert_eq!(replaced, Some(first));
        assert!(!doc.is_attached(first.menu));
        let menus = doc
            .query_selector_all(body, EngineNode::ToneMenu.selector())
            .unwrap();
        assert_eq!(menus.len(), 1);
    }

    #[test]
    fn test_chosen_and_dismiss() {
        let mut doc = Document::new();
        let body = doc.body();
        let container = doc.element(body, "div", &[]).unwrap();
        let mut menu = ToneMenu::new();
        menu.present(&mut doc, container, container).unwrap();
        let open = menu.current().unwrap();

        let concise = options(&doc, open.menu)[2];
        let (tone, owner) = menu.chosen(&doc, concise).unwrap();
        assert_eq!(tone, Tone::Concise);
        assert_eq!(owner.container, container);
        assert!(menu.contains(&doc, concise));
        assert!(menu.chosen(&doc, body).is_none());

        assert_eq!(menu.dismiss(&mut doc), Some(open));
        assert!(!doc.is_attached(open.menu));
        assert_eq!(menu.dismiss(&mut doc), None);
        assert!(menu.chosen(&doc, concise).is_none());
    }
}
