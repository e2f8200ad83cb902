//! Trait definitions decoupling the connector logic from the host graph editor.
//!
//! The host implements [`NodeGraphSource`] for queries and [`NodeGraphEditor`] for
//! mutations. [`MemoryGraph`] is a complete in-memory host used by tests and the
//! demo application.

pub mod catalog;
pub mod memory;

pub use catalog::{ClassCatalog, NodeClassInfo, StreamKind};
pub use memory::MemoryGraph;

use crate::color::AUTO_COLOR;
use crate::error::Result;
use crate::model::{KnobValue, NodeId, Position, Size, knobs};

/// Read-only view of the host graph.
pub trait NodeGraphSource {
    /// All nodes in graph iteration order.
    fn all_nodes(&self) -> Vec<NodeId>;

    /// Nodes of one class, in graph iteration order.
    fn nodes_of_class(&self, class: &str) -> Vec<NodeId> {
        self.all_nodes()
            .into_iter()
            .filter(|id| self.class(*id).as_deref() == Some(class))
            .collect()
    }

    fn contains(&self, id: NodeId) -> bool {
        self.class(id).is_some()
    }

    fn class(&self, id: NodeId) -> Option<String>;

    fn name(&self, id: NodeId) -> Option<String>;

    fn knob(&self, id: NodeId, knob: &str) -> Option<KnobValue>;

    fn has_knob(&self, id: NodeId, knob: &str) -> bool {
        self.knob(id, knob).is_some()
    }

    /// Whether the node exposes the `hide_input` capability, i.e. can consume a connection.
    fn accepts_inputs(&self, id: NodeId) -> bool {
        self.has_knob(id, knobs::HIDE_INPUT)
    }

    /// The `label` knob, empty when unset.
    fn label(&self, id: NodeId) -> String {
        self.knob(id, knobs::LABEL)
            .and_then(|v| v.as_text().map(str::to_string))
            .unwrap_or_default()
    }

    /// The raw `tile_color` knob; `0` means automatic.
    fn tile_color(&self, id: NodeId) -> u32 {
        self.knob(id, knobs::TILE_COLOR)
            .and_then(|v| v.as_color())
            .unwrap_or(AUTO_COLOR)
    }

    fn position(&self, id: NodeId) -> Option<Position>;

    fn screen_size(&self, id: NodeId) -> Size;

    /// Upstream node wired into `slot`, if any.
    fn input(&self, id: NodeId, slot: usize) -> Option<NodeId>;

    /// Number of input slots that are currently wired.
    fn connected_inputs(&self, id: NodeId) -> usize;

    /// Nodes reading `id` through regular or hidden inputs.
    ///
    /// Hosts answer this by walking the whole graph, so callers should treat it as
    /// O(graph size).
    fn dependents(&self, id: NodeId) -> Vec<NodeId>;

    fn selected_nodes(&self) -> Vec<NodeId>;

    /// Color the host paints a node of `class` with when it is on automatic.
    fn default_node_color(&self, class: &str) -> u32;

    /// Where the host drops a node created without a reference node.
    fn default_position(&self) -> Position;

    fn active_viewer(&self) -> Option<NodeId>;

    fn active_viewer_input(&self, viewer: NodeId) -> Option<usize>;
}

/// Mutation interface of the host graph.
pub trait NodeGraphEditor: NodeGraphSource {
    fn create_node(&mut self, class: &str) -> Result<NodeId>;

    fn delete_node(&mut self, id: NodeId) -> Result<()>;

    /// Renames a node. The host makes the name unique and returns the final name.
    fn set_name(&mut self, id: NodeId, name: &str) -> Result<String>;

    /// Sets a knob, creating it when the node does not have it yet.
    fn set_knob(&mut self, id: NodeId, knob: &str, value: KnobValue) -> Result<()>;

    /// Sets a knob that is kept out of the node's property panel.
    fn set_hidden_knob(&mut self, id: NodeId, knob: &str, value: KnobValue) -> Result<()>;

    /// Wires `source` into `slot`. Returns whether the host accepted the wiring.
    fn set_input(&mut self, id: NodeId, slot: usize, source: Option<NodeId>) -> bool;

    fn set_position(&mut self, id: NodeId, position: Position) -> Result<()>;

    fn set_selected(&mut self, id: NodeId, selected: bool);

    fn clear_selection(&mut self) {
        for id in self.selected_nodes() {
            self.set_selected(id, false);
        }
    }

    fn zoom_to_selection(&mut self);

    /// Rewires a viewer input without touching the processing graph.
    fn set_viewer_input(&mut self, viewer: NodeId, slot: usize, source: Option<NodeId>) -> bool;

    fn activate_viewer_input(&mut self, viewer: NodeId, slot: usize);

    fn begin_undo(&mut self, text: &str);

    fn end_undo(&mut self);

    /// Blocking message to the user.
    fn message(&mut self, text: &str);
}

/// Everything the connector logic needs from a host.
pub trait HostGraph: NodeGraphEditor {}

impl<T: NodeGraphEditor> HostGraph for T {}
