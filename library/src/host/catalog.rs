//! Node classes known to the in-memory host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::Size;

/// Kind of data a node produces. Wiring is rejected when the consumer does not
/// accept the producer's kind.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Image,
    Deep,
    Scene,
}

impl StreamKind {
    pub const ALL: [StreamKind; 3] = [StreamKind::Image, StreamKind::Deep, StreamKind::Scene];
}

#[derive(Clone, Debug)]
pub struct NodeClassInfo {
    pub max_inputs: usize,
    /// Whether the class carries the `hide_input` knob, i.e. can consume a connection.
    pub hide_input: bool,
    /// `None` passes the kind of input 0 through.
    pub output: Option<StreamKind>,
    pub accepts: Vec<StreamKind>,
    pub default_color: u32,
    pub size: Size,
}

impl NodeClassInfo {
    fn new(max_inputs: usize, output: Option<StreamKind>, accepts: &[StreamKind]) -> Self {
        Self {
            max_inputs,
            hide_input: max_inputs > 0,
            output,
            accepts: accepts.to_vec(),
            default_color: 0x7F7F_7FFF,
            size: Size {
                width: 80,
                height: 18,
            },
        }
    }

    fn color(mut self, color: u32) -> Self {
        self.default_color = color;
        self
    }

    fn size(mut self, width: i32, height: i32) -> Self {
        self.size = Size { width, height };
        self
    }

    fn without_hide_input(mut self) -> Self {
        self.hide_input = false;
        self
    }

    pub fn accepts(&self, kind: StreamKind) -> bool {
        self.accepts.contains(&kind)
    }
}

#[derive(Clone, Debug)]
pub struct ClassCatalog {
    classes: HashMap<String, NodeClassInfo>,
}

impl ClassCatalog {
    pub fn empty() -> Self {
        Self {
            classes: HashMap::new(),
        }
    }

    pub fn register(&mut self, class: &str, info: NodeClassInfo) {
        self.classes.insert(class.to_string(), info);
    }

    pub fn get(&self, class: &str) -> Option<&NodeClassInfo> {
        self.classes.get(class)
    }
}

impl Default for ClassCatalog {
    fn default() -> Self {
        use StreamKind::*;

        let mut catalog = Self::empty();
        catalog.register(
            "Dot",
            NodeClassInfo::new(1, None, &StreamKind::ALL)
                .color(0xCCCC_CC00)
                .size(12, 12),
        );
        catalog.register(
            "NoOp",
            NodeClassInfo::new(1, None, &StreamKind::ALL).color(0x9B9B_9BFF),
        );
        catalog.register(
            "PostageStamp",
            NodeClassInfo::new(1, Some(Image), &[Image])
                .color(0x8A7D_5CFF)
                .size(80, 78),
        );
        catalog.register(
            "Read",
            NodeClassInfo::new(0, Some(Image), &[]).color(0xB3B3_B3FF).size(80, 78),
        );
        catalog.register(
            "DeepRead",
            NodeClassInfo::new(0, Some(Deep), &[]).color(0x3B4F_7FFF).size(80, 78),
        );
        catalog.register(
            "Camera",
            NodeClassInfo::new(0, Some(Scene), &[]).color(0xC064_64FF),
        );
        catalog.register(
            "Grade",
            NodeClassInfo::new(2, Some(Image), &[Image]).color(0x7AA9_FFFF),
        );
        catalog.register(
            "Blur",
            NodeClassInfo::new(2, Some(Image), &[Image]).color(0xCC80_4EFF),
        );
        catalog.register(
            "Merge",
            NodeClassInfo::new(3, Some(Image), &[Image]).color(0x4B5E_C6FF),
        );
        catalog.register(
            "DeepMerge",
            NodeClassInfo::new(2, Some(Deep), &[Deep]).color(0x3B4F_7FFF),
        );
        catalog.register(
            "ScanlineRender",
            NodeClassInfo::new(3, Some(Image), &[Image, Scene]).color(0xC064_64FF),
        );
        catalog.register(
            "Viewer",
            NodeClassInfo::new(10, None, &StreamKind::ALL).color(0xFF99_00FF),
        );
        catalog.register(
            "Backdrop",
            NodeClassInfo::new(0, None, &[])
                .without_hide_input()
                .color(0x8E8E_38FF)
                .size(300, 200),
        );
        catalog
    }
}
