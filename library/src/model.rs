//! Node-level vocabulary shared by the host traits and the connector logic.
//!
//! The host graph is the only store: a connector or a proxy is just a node whose
//! name carries a marker prefix and whose knobs carry the label and color.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Name prefix marking an anchor node.
pub const CONNECTOR_KEY: &str = "Connector";
/// Name prefix marking a proxy node wired to an anchor.
pub const CONNECTED_KEY: &str = "Connected";

/// Undo entry text for every gesture.
pub const UNDO_EVENT_TEXT: &str = "Label Connector";

pub mod knobs {
    pub const LABEL: &str = "label";
    pub const TILE_COLOR: &str = "tile_color";
    pub const HIDE_INPUT: &str = "hide_input";
    pub const NOTE_FONT_SIZE: &str = "note_font_size";
    pub const NOTE_FONT: &str = "note_font";
    /// Hidden text knob on a proxy holding the name of its connector.
    pub const CONNECTOR_REF: &str = "connector_ref";
    /// Button knob on a proxy that jumps to its connector.
    pub const JUMP_TO_SOURCE: &str = "jump_to_source";
}

pub mod classes {
    /// Anchor node type.
    pub const DOT: &str = "Dot";
    /// General-purpose node type, used both as connector and as thumbnail-less proxy.
    pub const NOOP: &str = "NoOp";
    /// Proxy kind showing a thumbnail of its input.
    pub const POSTAGE_STAMP: &str = "PostageStamp";
    pub const VIEWER: &str = "Viewer";

    /// Node types the registry scans for connectors, in scan order.
    pub const CONNECTOR_CLASSES: [&str; 2] = [DOT, NOOP];
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a node's top-left corner in graph space.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// On-canvas size of a node.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum KnobValue {
    Int(i64),
    Bool(bool),
    Text(String),
    Color(u32),
    /// One-click control; the host binds it to an action by knob name.
    Button,
}

impl KnobValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            KnobValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<u32> {
        match self {
            KnobValue::Color(c) => Some(*c),
            KnobValue::Int(i) => u32::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            KnobValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// A connector as seen by one registry snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Connector {
    pub id: NodeId,
    pub name: String,
    pub label: String,
    pub tile_color: u32,
}

/// Normalizes user text into a label: trimmed and upper-cased.
pub fn normalize_label(text: &str) -> String {
    text.trim().to_uppercase()
}

pub fn labels_match(a: &str, b: &str) -> bool {
    a.to_uppercase() == b.to_uppercase()
}
