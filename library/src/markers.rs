//! Predicates over the naming convention.

use crate::host::NodeGraphSource;
use crate::model::{CONNECTED_KEY, NodeId};
use crate::registry::is_connector_name;
use crate::settings::Settings;

pub fn is_connector<G: NodeGraphSource + ?Sized>(graph: &G, id: NodeId) -> bool {
    graph.name(id).is_some_and(|name| is_connector_name(&name))
}

pub fn is_proxy<G: NodeGraphSource + ?Sized>(graph: &G, id: NodeId) -> bool {
    graph
        .name(id)
        .is_some_and(|name| name.starts_with(CONNECTED_KEY))
}

/// A proxy with exactly one input whose label equals its own.
pub fn is_correctly_connected<G: NodeGraphSource + ?Sized>(graph: &G, id: NodeId) -> bool {
    if graph.connected_inputs(id) != 1 {
        return false;
    }
    let Some(upstream) = graph.input(id, 0) else {
        return false;
    };
    graph.label(id) == graph.label(upstream) && is_proxy(graph, id)
}

/// Whether a node can be offered as a connection target at all.
///
/// Nodes without the `hide_input` knob have no inputs worth wiring; ignored
/// classes (viewers by default) are never targets either.
pub fn can_accept_input<G: NodeGraphSource + ?Sized>(
    graph: &G,
    settings: &Settings,
    id: NodeId,
) -> bool {
    let Some(class) = graph.class(id) else {
        return false;
    };
    graph.accepts_inputs(id) && !settings.is_ignored_class(&class)
}
