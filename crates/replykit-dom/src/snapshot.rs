//! JSON snapshots of a host document.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::DomError;
use crate::host::HostDocument;
use crate::node::NodeId;

/// Serializable document tree, used for fixtures and offline selector probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub hash: String,
    pub body: SnapshotNode,
}

/// One node of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text(String),
    /// Host markup, parsed into nodes on load.
    Markup {
        markup: String,
    },
    Element {
        tag: String,
        #[serde(default)]
        attributes: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default)]
        children: Vec<SnapshotNode>,
    },
}

impl DocumentSnapshot {
    pub fn from_json(json: &str) -> Result<Self, DomError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, DomError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String, DomError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Document {
    /// Build a document from a snapshot. The snapshot root's children become
    /// the body's children; the root's own attributes are copied onto the body.
    pub fn from_snapshot(snapshot: &DocumentSnapshot) -> Result<Self, DomError> {
        let mut doc = Document::new();
        let body = doc.body();
        if let SnapshotNode::Element {
            attributes,
            children,
            ..
        } = &snapshot.body
        {
            for (name, value) in attributes {
                doc.set_attribute(body, name, value)?;
            }
            for child in children {
                build_node(&mut doc, body, child)?;
            }
        }
        doc.set_title(&snapshot.title);
        doc.set_location_hash(&snapshot.hash);
        Ok(doc)
    }
}

fn build_node(doc: &mut Document, parent: NodeId, node: &SnapshotNode) -> Result<(), DomError> {
    match node {
        SnapshotNode::Text(text) => {
            doc.text(parent, text)?;
        }
        SnapshotNode::Markup { markup } => {
            doc.markup(parent, markup)?;
        }
        SnapshotNode::Element {
            tag,
            attributes,
            value,
            children,
        } => {
            let pairs: Vec<(&str, &str)> = attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            let id = doc.element(parent, tag, &pairs)?;
            if let Some(v) = value {
                doc.set_value(id, v)?;
            }
            for child in children {
                build_node(doc, id, child)?;
            }
        }
    }
    Ok(())
}
