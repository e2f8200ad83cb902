use thiserror::Error;

use crate::model::NodeId;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Label already in use: {0}")]
    LabelInUse(String),
    #[error("Label is empty")]
    EmptyLabel,
    #[error("Wiring rejected: input {input} of node {node}")]
    WiringRejected { node: NodeId, input: usize },
    #[error("No active viewer input available")]
    ViewerUnavailable,
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Unknown node class: {0}")]
    UnknownClass(String),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConnectorError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        ConnectorError::InvalidFormat(msg.into())
    }

    /// Errors the session swallows instead of reporting them to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, ConnectorError::ViewerUnavailable)
    }
}

pub type Result<T, E = ConnectorError> = std::result::Result<T, E>;
