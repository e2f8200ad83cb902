pub mod classifier;
pub mod color;
pub mod error;
pub mod host;
pub mod markers;
pub mod model;
pub mod mutator;
pub mod popup;
pub mod registry;
pub mod session;
pub mod settings;
pub mod transaction;

pub use classifier::{PopupRequest, Resolution};
pub use error::{ConnectorError, Result};
pub use host::{HostGraph, MemoryGraph, NodeGraphEditor, NodeGraphSource};
pub use model::{Connector, KnobValue, NodeId, Position};
pub use session::ConnectorSession;
pub use settings::Settings;

/// Loads a graph scene and lists its connectors, sorted by label.
pub fn connectors_from_json(json: &str) -> Result<Vec<Connector>> {
    let graph = MemoryGraph::from_json(json)?;
    Ok(registry::list_connectors(&graph).into_connectors())
}
