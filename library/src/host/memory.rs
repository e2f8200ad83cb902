//! In-memory host graph.
//!
//! Keeps nodes in insertion order, validates wiring against a [`ClassCatalog`],
//! and records undo steps as whole-graph snapshots.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::catalog::{ClassCatalog, NodeClassInfo, StreamKind};
use super::{NodeGraphEditor, NodeGraphSource};
use crate::color::AUTO_COLOR;
use crate::error::{ConnectorError, Result};
use crate::model::{KnobValue, NodeId, Position, Size, knobs};

/// Passthrough chains longer than this are treated as plain images.
const MAX_STREAM_DEPTH: usize = 64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub class: String,
    pub name: String,
    #[serde(default)]
    pub knobs: BTreeMap<String, KnobValue>,
    #[serde(default)]
    pub hidden_knobs: BTreeSet<String>,
    #[serde(default)]
    pub inputs: Vec<Option<NodeId>>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub selected: bool,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ViewerState {
    pub node: NodeId,
    pub active_input: Option<usize>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
struct GraphState {
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    viewer: Option<ViewerState>,
}

#[derive(Debug)]
pub struct MemoryGraph {
    state: GraphState,
    catalog: ClassCatalog,
    undo_stack: Vec<(String, GraphState)>,
    redo_stack: Vec<(String, GraphState)>,
    undo_depth: usize,
    pending: Option<(String, GraphState)>,
    cursor: Position,
    messages: Vec<String>,
    zoomed: Vec<Vec<NodeId>>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::with_catalog(ClassCatalog::default())
    }

    pub fn with_catalog(catalog: ClassCatalog) -> Self {
        Self {
            state: GraphState::default(),
            catalog,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            undo_depth: 0,
            pending: None,
            cursor: Position::default(),
            messages: Vec::new(),
            zoomed: Vec::new(),
        }
    }

    /// Loads a scene. Knobs and input slots a class always has are filled in
    /// when the file leaves them out.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut state: GraphState = serde_json::from_str(json)?;
        let mut graph = Self::new();
        for node in &mut state.nodes {
            let info = graph
                .catalog
                .get(&node.class)
                .ok_or_else(|| ConnectorError::UnknownClass(node.class.clone()))?;
            for (knob, value) in default_knobs(info) {
                node.knobs.entry(knob).or_insert(value);
            }
            if node.inputs.len() < info.max_inputs {
                node.inputs.resize(info.max_inputs, None);
            }
        }
        graph.state = state;
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.state)?)
    }

    pub fn catalog(&self) -> &ClassCatalog {
        &self.catalog
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.state.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.state.nodes.iter().find(|n| n.id == id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord> {
        self.state
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(ConnectorError::NodeNotFound(id))
    }

    /// Creates a node with a given name and label, at a given position.
    pub fn add_node(&mut self, class: &str, name: &str, label: &str, position: Position) -> Result<NodeId> {
        let id = self.create_node(class)?;
        self.set_name(id, name)?;
        self.set_knob(id, knobs::LABEL, KnobValue::Text(label.to_string()))?;
        self.set_position(id, position)?;
        Ok(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.state.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }

    /// Sets where nodes created without a reference node are dropped.
    pub fn set_cursor(&mut self, position: Position) {
        self.cursor = position;
    }

    pub fn set_active_viewer(&mut self, viewer: NodeId, active_input: Option<usize>) {
        self.state.viewer = Some(ViewerState {
            node: viewer,
            active_input,
        });
    }

    pub fn stream_of(&self, id: NodeId) -> Option<StreamKind> {
        let mut current = id;
        for _ in 0..MAX_STREAM_DEPTH {
            let node = self.node(current)?;
            let info = self.catalog.get(&node.class)?;
            if let Some(kind) = info.output {
                return Some(kind);
            }
            match node.inputs.first().copied().flatten() {
                Some(upstream) => current = upstream,
                None => return Some(StreamKind::Image),
            }
        }
        Some(StreamKind::Image)
    }

    fn is_upstream_of(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut stack = vec![of];
        let mut seen = BTreeSet::new();
        while let Some(id) = stack.pop() {
            if id == candidate {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.node(id) {
                stack.extend(node.inputs.iter().flatten().copied());
            }
        }
        false
    }

    fn unique_name(&self, base: &str, exclude: NodeId) -> String {
        let taken = |candidate: &str| {
            self.state
                .nodes
                .iter()
                .any(|n| n.id != exclude && n.name == candidate)
        };
        let stem = base.trim_end_matches(|c: char| c.is_ascii_digit());
        if !taken(base) && stem != base {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}{}", stem, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn undo(&mut self) -> bool {
        if self.undo_depth > 0 {
            warn!("Undo requested inside an open transaction");
            return false;
        }
        match self.undo_stack.pop() {
            Some((text, previous)) => {
                let current = std::mem::replace(&mut self.state, previous);
                self.redo_stack.push((text, current));
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        if self.undo_depth > 0 {
            return false;
        }
        match self.redo_stack.pop() {
            Some((text, next)) => {
                let current = std::mem::replace(&mut self.state, next);
                self.undo_stack.push((text, current));
                true
            }
            None => false,
        }
    }

    pub fn undo_steps(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn undo_texts(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|(t, _)| t.as_str()).collect()
    }

    pub fn in_transaction(&self) -> bool {
        self.undo_depth > 0
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    /// Selections framed by `zoom_to_selection`, oldest first.
    pub fn zoom_history(&self) -> &[Vec<NodeId>] {
        &self.zoomed
    }
}

fn default_knobs(info: &NodeClassInfo) -> BTreeMap<String, KnobValue> {
    let mut knob_map = BTreeMap::new();
    knob_map.insert(knobs::LABEL.to_string(), KnobValue::Text(String::new()));
    knob_map.insert(knobs::TILE_COLOR.to_string(), KnobValue::Color(AUTO_COLOR));
    knob_map.insert(knobs::NOTE_FONT_SIZE.to_string(), KnobValue::Int(11));
    if info.hide_input {
        knob_map.insert(knobs::HIDE_INPUT.to_string(), KnobValue::Bool(false));
    }
    knob_map
}

impl NodeGraphSource for MemoryGraph {
    fn all_nodes(&self) -> Vec<NodeId> {
        self.state.nodes.iter().map(|n| n.id).collect()
    }

    fn class(&self, id: NodeId) -> Option<String> {
        self.node(id).map(|n| n.class.clone())
    }

    fn name(&self, id: NodeId) -> Option<String> {
        self.node(id).map(|n| n.name.clone())
    }

    fn knob(&self, id: NodeId, knob: &str) -> Option<KnobValue> {
        self.node(id).and_then(|n| n.knobs.get(knob).cloned())
    }

    fn position(&self, id: NodeId) -> Option<Position> {
        self.node(id).map(|n| n.position)
    }

    fn screen_size(&self, id: NodeId) -> Size {
        self.node(id)
            .and_then(|n| self.catalog.get(&n.class))
            .map(|info| info.size)
            .unwrap_or_default()
    }

    fn input(&self, id: NodeId, slot: usize) -> Option<NodeId> {
        self.node(id)
            .and_then(|n| n.inputs.get(slot).copied().flatten())
    }

    fn connected_inputs(&self, id: NodeId) -> usize {
        self.node(id)
            .map(|n| n.inputs.iter().flatten().count())
            .unwrap_or(0)
    }

    fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        self.state
            .nodes
            .iter()
            .filter(|n| n.inputs.iter().flatten().any(|i| *i == id))
            .map(|n| n.id)
            .collect()
    }

    fn selected_nodes(&self) -> Vec<NodeId> {
        self.state
            .nodes
            .iter()
            .filter(|n| n.selected)
            .map(|n| n.id)
            .collect()
    }

    fn default_node_color(&self, class: &str) -> u32 {
        self.catalog
            .get(class)
            .map(|info| info.default_color)
            .unwrap_or(AUTO_COLOR)
    }

    fn default_position(&self) -> Position {
        self.cursor
    }

    fn active_viewer(&self) -> Option<NodeId> {
        self.state
            .viewer
            .map(|v| v.node)
            .filter(|id| self.node(*id).is_some())
    }

    fn active_viewer_input(&self, viewer: NodeId) -> Option<usize> {
        self.state
            .viewer
            .filter(|v| v.node == viewer)
            .and_then(|v| v.active_input)
    }
}

impl NodeGraphEditor for MemoryGraph {
    fn create_node(&mut self, class: &str) -> Result<NodeId> {
        let info = self
            .catalog
            .get(class)
            .ok_or_else(|| ConnectorError::UnknownClass(class.to_string()))?;

        let knob_map = default_knobs(info);
        let id = NodeId::new();
        let name = self.unique_name(class, id);
        self.state.nodes.push(NodeRecord {
            id,
            class: class.to_string(),
            name,
            knobs: knob_map,
            hidden_knobs: BTreeSet::new(),
            inputs: vec![None; info.max_inputs],
            position: self.cursor,
            selected: false,
        });
        debug!("Created {} node {}", class, id);
        Ok(id)
    }

    fn delete_node(&mut self, id: NodeId) -> Result<()> {
        let before = self.state.nodes.len();
        self.state.nodes.retain(|n| n.id != id);
        if self.state.nodes.len() == before {
            return Err(ConnectorError::NodeNotFound(id));
        }
        for node in &mut self.state.nodes {
            for input in node.inputs.iter_mut() {
                if *input == Some(id) {
                    *input = None;
                }
            }
        }
        if self.state.viewer.is_some_and(|v| v.node == id) {
            self.state.viewer = None;
        }
        Ok(())
    }

    fn set_name(&mut self, id: NodeId, name: &str) -> Result<String> {
        let unique = self.unique_name(name, id);
        self.node_mut(id)?.name = unique.clone();
        Ok(unique)
    }

    fn set_knob(&mut self, id: NodeId, knob: &str, value: KnobValue) -> Result<()> {
        self.node_mut(id)?.knobs.insert(knob.to_string(), value);
        Ok(())
    }

    fn set_hidden_knob(&mut self, id: NodeId, knob: &str, value: KnobValue) -> Result<()> {
        let node = self.node_mut(id)?;
        node.knobs.insert(knob.to_string(), value);
        node.hidden_knobs.insert(knob.to_string());
        Ok(())
    }

    fn set_input(&mut self, id: NodeId, slot: usize, source: Option<NodeId>) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if slot >= node.inputs.len() {
            return false;
        }
        if let Some(src) = source {
            let Some(kind) = self.stream_of(src) else {
                return false;
            };
            let accepted = self
                .catalog
                .get(&node.class)
                .is_some_and(|info| info.accepts(kind));
            if !accepted || self.is_upstream_of(id, src) {
                debug!("Rejected wiring {} -> {}[{}]", src, id, slot);
                return false;
            }
        }
        match self.node_mut(id) {
            Ok(node) => {
                node.inputs[slot] = source;
                true
            }
            Err(_) => false,
        }
    }

    fn set_position(&mut self, id: NodeId, position: Position) -> Result<()> {
        self.node_mut(id)?.position = position;
        Ok(())
    }

    fn set_selected(&mut self, id: NodeId, selected: bool) {
        if let Ok(node) = self.node_mut(id) {
            node.selected = selected;
        }
    }

    fn zoom_to_selection(&mut self) {
        let selection = self.selected_nodes();
        self.zoomed.push(selection);
    }

    fn set_viewer_input(&mut self, viewer: NodeId, slot: usize, source: Option<NodeId>) -> bool {
        match self.node_mut(viewer) {
            Ok(node) if slot < node.inputs.len() => {
                node.inputs[slot] = source;
                true
            }
            _ => false,
        }
    }

    fn activate_viewer_input(&mut self, viewer: NodeId, slot: usize) {
        self.set_active_viewer(viewer, Some(slot));
    }

    fn begin_undo(&mut self, text: &str) {
        if self.undo_depth == 0 {
            self.pending = Some((text.to_string(), self.state.clone()));
        }
        self.undo_depth += 1;
    }

    fn end_undo(&mut self) {
        if self.undo_depth == 0 {
            warn!("end_undo without matching begin_undo");
            return;
        }
        self.undo_depth -= 1;
        if self.undo_depth > 0 {
            return;
        }
        if let Some((text, snapshot)) = self.pending.take() {
            if snapshot != self.state {
                self.undo_stack.push((text, snapshot));
                self.redo_stack.clear();
            }
        }
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_nodes_get_numbered_names() {
        let mut graph = MemoryGraph::new();
        let a = graph.create_node("Dot").unwrap();
        let b = graph.create_node("Dot").unwrap();
        assert_eq!(graph.name(a).as_deref(), Some("Dot1"));
        assert_eq!(graph.name(b).as_deref(), Some("Dot2"));
    }

    #[test]
    fn renaming_to_a_taken_prefix_appends_a_number() {
        let mut graph = MemoryGraph::new();
        let a = graph.create_node("Dot").unwrap();
        let b = graph.create_node("Dot").unwrap();
        assert_eq!(graph.set_name(a, "Connector").unwrap(), "Connector1");
        assert_eq!(graph.set_name(b, "Connector").unwrap(), "Connector2");
        assert_eq!(graph.set_name(a, "Connector1").unwrap(), "Connector1");
    }

    #[test]
    fn unknown_class_is_an_error() {
        let mut graph = MemoryGraph::new();
        assert!(matches!(
            graph.create_node("Nope"),
            Err(ConnectorError::UnknownClass(_))
        ));
    }

    #[test]
    fn deep_stream_is_rejected_by_postage_stamp() {
        let mut graph = MemoryGraph::new();
        let deep = graph.create_node("DeepRead").unwrap();
        let dot = graph.create_node("Dot").unwrap();
        assert!(graph.set_input(dot, 0, Some(deep)));
        let stamp = graph.create_node("PostageStamp").unwrap();
        assert!(!graph.set_input(stamp, 0, Some(dot)));
        let noop = graph.create_node("NoOp").unwrap();
        assert!(graph.set_input(noop, 0, Some(dot)));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut graph = MemoryGraph::new();
        let a = graph.create_node("Grade").unwrap();
        let b = graph.create_node("Grade").unwrap();
        assert!(graph.set_input(b, 0, Some(a)));
        assert!(!graph.set_input(a, 0, Some(b)));
        assert!(!graph.set_input(a, 0, Some(a)));
    }

    #[test]
    fn deleting_a_node_clears_inputs_pointing_at_it() {
        let mut graph = MemoryGraph::new();
        let read = graph.create_node("Read").unwrap();
        let grade = graph.create_node("Grade").unwrap();
        assert!(graph.set_input(grade, 0, Some(read)));
        graph.delete_node(read).unwrap();
        assert_eq!(graph.input(grade, 0), None);
        assert!(graph.dependents(read).is_empty());
    }

    #[test]
    fn nested_transactions_make_one_undo_step() {
        let mut graph = MemoryGraph::new();
        graph.begin_undo("outer");
        graph.create_node("Dot").unwrap();
        graph.begin_undo("inner");
        graph.create_node("Dot").unwrap();
        graph.end_undo();
        assert!(graph.in_transaction());
        graph.end_undo();

        assert_eq!(graph.undo_steps(), 1);
        assert_eq!(graph.undo_texts(), vec!["outer"]);
        assert!(graph.undo());
        assert!(graph.all_nodes().is_empty());
        assert!(graph.redo());
        assert_eq!(graph.all_nodes().len(), 2);
    }

    #[test]
    fn empty_transaction_leaves_no_undo_step() {
        let mut graph = MemoryGraph::new();
        graph.begin_undo("noop");
        graph.end_undo();
        assert_eq!(graph.undo_steps(), 0);
    }

    #[test]
    fn json_round_trip_keeps_nodes() {
        let mut graph = MemoryGraph::new();
        let id = graph
            .add_node("Dot", "Connector1", "PLATE", Position::new(10, 20))
            .unwrap();
        let json = graph.to_json().unwrap();
        let restored = MemoryGraph::from_json(&json).unwrap();
        assert_eq!(restored.label(id), "PLATE");
        assert_eq!(restored.position(id), Some(Position::new(10, 20)));
    }

    #[test]
    fn json_with_unknown_class_is_rejected() {
        let json = r#"{"nodes":[{"id":"6f1c3c52-8d5b-4e1e-9a57-1d2b8a0c0f11","class":"Alien","name":"Alien1"}]}"#;
        assert!(matches!(
            MemoryGraph::from_json(json),
            Err(ConnectorError::UnknownClass(_))
        ));
    }

    #[test]
    fn loaded_nodes_get_class_knobs_and_slots() {
        let json = r#"{ "nodes": [ {
            "id": "00000000-0000-0000-0000-000000000001",
            "class": "Grade",
            "name": "Grade1"
        } ] }"#;
        let graph = MemoryGraph::from_json(json).unwrap();
        let id = graph.all_nodes()[0];
        assert!(graph.accepts_inputs(id));
        assert_eq!(graph.node(id).unwrap().inputs.len(), 2);
        assert_eq!(graph.label(id), "");
    }
}
