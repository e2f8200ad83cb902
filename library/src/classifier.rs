//! Decides, per invocation, whether the selection is resolved silently or which
//! popup variant has to be shown.

use log::{debug, warn};

use crate::host::HostGraph;
use crate::markers::{can_accept_input, is_connector, is_correctly_connected};
use crate::model::{Connector, NodeId, knobs, labels_match};
use crate::mutator::connect_to_connector;
use crate::registry::ConnectorRegistry;
use crate::settings::Settings;

/// A popup the classifier asks the session to open.
#[derive(Clone, Debug, PartialEq)]
pub enum PopupRequest {
    /// Connector picker; `target` is the node the new proxy will feed.
    Picker { target: Option<NodeId> },
    /// Rename, colorize, select children.
    ConnectorOptions { connectors: Vec<NodeId> },
    /// Jump to parent, re-connect.
    ChildrenOptions { proxy: NodeId },
    Color { connectors: Vec<NodeId> },
    /// Name a new connector, or rename `node` when it already is one.
    Naming { node: Option<NodeId> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    /// The gesture was fully resolved without a popup.
    Handled { connected: usize },
    Open(PopupRequest),
}

/// Connector the node's hidden back reference points at, if its label still matches.
fn referenced_connector<'a, G: HostGraph + ?Sized>(
    graph: &G,
    registry: &'a ConnectorRegistry,
    node: NodeId,
    label: &str,
) -> Option<&'a Connector> {
    let name = graph.knob(node, knobs::CONNECTOR_REF)?;
    registry
        .find_by_name(name.as_text()?)
        .filter(|c| labels_match(&c.label, label))
}

/// Wires every labeled, not yet correctly connected node to the connector holding
/// its label. Returns how many nodes were connected.
fn connect_matching<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    registry: &ConnectorRegistry,
    selection: &[NodeId],
) -> usize {
    let mut connected = 0;
    for &node in selection {
        if is_connector(graph, node) {
            continue;
        }
        let label = graph.label(node);
        if label.is_empty() || is_correctly_connected(graph, node) {
            continue;
        }
        let Some(connector) = referenced_connector(graph, registry, node, &label)
            .or_else(|| registry.find_by_label(&label))
        else {
            continue;
        };
        match connect_to_connector(graph, settings, node, connector) {
            Ok(()) => {
                debug!("Connected {:?} to '{}'", graph.name(node), connector.label);
                connected += 1;
            }
            Err(e) => warn!("Could not connect {:?}: {}", graph.name(node), e),
        }
    }
    connected
}

/// Classifies the selection. Silent connections are performed on `graph` directly,
/// so callers wrap this in an undo scope.
///
/// With `force_ui` a single selected node always gets a popup: the picker unless
/// the node is a connector or cannot take inputs.
pub fn resolve_context<G: HostGraph + ?Sized>(
    graph: &mut G,
    settings: &Settings,
    registry: &ConnectorRegistry,
    selection: &[NodeId],
    force_ui: bool,
) -> Resolution {
    let only_connectors = selection.iter().all(|id| is_connector(graph, *id));

    if force_ui && selection.len() == 1 {
        let node = selection[0];
        let request = if only_connectors {
            PopupRequest::ConnectorOptions {
                connectors: vec![node],
            }
        } else if !can_accept_input(graph, settings, node) {
            PopupRequest::Naming { node: Some(node) }
        } else {
            PopupRequest::Picker { target: Some(node) }
        };
        debug!("Forced popup: {:?}", request);
        return Resolution::Open(request);
    }

    let connected = connect_matching(graph, settings, registry, selection);

    if (selection.len() > 1 || connected > 0) && !only_connectors {
        debug!("Resolved silently, {} connection(s)", connected);
        return Resolution::Handled { connected };
    }

    let request = match selection.first() {
        None => PopupRequest::Picker { target: None },
        Some(_) if only_connectors => PopupRequest::ConnectorOptions {
            connectors: selection.to_vec(),
        },
        Some(&node) if is_correctly_connected(graph, node) => {
            PopupRequest::ChildrenOptions { proxy: node }
        }
        Some(&node) if !can_accept_input(graph, settings, node) => {
            PopupRequest::Naming { node: Some(node) }
        }
        Some(&node) => PopupRequest::Picker { target: Some(node) },
    };
    debug!("Opening popup: {:?}", request);
    Resolution::Open(request)
}
