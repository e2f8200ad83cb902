//! Scans the host graph for connectors.
//!
//! A snapshot is rebuilt on every call; the graph stays the only source of truth.

use log::error;
use std::collections::{BTreeSet, HashSet};

use crate::host::NodeGraphSource;
use crate::model::{CONNECTOR_KEY, Connector, NodeId, classes};

/// Connectors skipped because an earlier connector already holds their label.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DuplicateLabelReport {
    /// `(node name, label)` of every skipped connector, in scan order.
    pub skipped: Vec<(String, String)>,
}

impl DuplicateLabelReport {
    pub fn is_empty(&self) -> bool {
        self.skipped.is_empty()
    }

    /// One combined message naming every skipped connector.
    pub fn message(&self) -> String {
        let mut message = String::from("Skipped following Connectors (Label already used):\n\n");
        for (name, label) in &self.skipped {
            message.push_str(&format!("{} '{}'\n", name, label));
        }
        message
    }
}

/// Connectors sorted by label, plus whatever was skipped while building the list.
#[derive(Clone, Debug, Default)]
pub struct ConnectorRegistry {
    connectors: Vec<Connector>,
    duplicates: DuplicateLabelReport,
}

impl ConnectorRegistry {
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn into_connectors(self) -> Vec<Connector> {
        self.connectors
    }

    pub fn duplicates(&self) -> &DuplicateLabelReport {
        &self.duplicates
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.iter()
    }

    /// Exact, case-insensitive label lookup.
    pub fn find_by_label(&self, label: &str) -> Option<&Connector> {
        let wanted = label.to_uppercase();
        self.connectors
            .iter()
            .find(|c| c.label.to_uppercase() == wanted)
    }

    pub fn find_by_id(&self, id: NodeId) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.name == name)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.connectors.iter().map(|c| c.label.as_str()).collect()
    }
}

pub fn is_connector_name(name: &str) -> bool {
    name.starts_with(CONNECTOR_KEY)
}

/// Anchor-typed nodes named as connectors, labeled or not, in scan order.
fn connector_nodes<G: NodeGraphSource + ?Sized>(graph: &G) -> Vec<(NodeId, String, String)> {
    classes::CONNECTOR_CLASSES
        .iter()
        .flat_map(|class| graph.nodes_of_class(class))
        .filter_map(|id| {
            let name = graph.name(id)?;
            is_connector_name(&name).then(|| (id, name, graph.label(id)))
        })
        .collect()
}

/// All labeled connectors, first-seen wins on label collisions, sorted by label.
pub fn list_connectors<G: NodeGraphSource + ?Sized>(graph: &G) -> ConnectorRegistry {
    let mut seen = HashSet::new();
    let mut registry = ConnectorRegistry::default();

    for (id, name, label) in connector_nodes(graph) {
        if label.is_empty() {
            continue;
        }
        if !seen.insert(label.to_uppercase()) {
            error!(
                "Double label entry found on connectors, skipping: {} '{}'",
                name, label
            );
            registry.duplicates.skipped.push((name, label));
            continue;
        }
        registry.connectors.push(Connector {
            id,
            name,
            tile_color: graph.tile_color(id),
            label,
        });
    }

    registry
        .connectors
        .sort_by_key(|c| c.label.to_uppercase());
    registry
}

/// Every label currently held by a connector, upper-cased.
pub fn list_connector_labels<G: NodeGraphSource + ?Sized>(graph: &G) -> BTreeSet<String> {
    connector_nodes(graph)
        .into_iter()
        .filter(|(_, _, label)| !label.is_empty())
        .map(|(_, _, label)| label.to_uppercase())
        .collect()
}
