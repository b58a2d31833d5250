use crate::types::LayoutType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("node `{id}` has a non-finite position, size or weight")]
    NonFiniteCoordinate { id: String },
    #[error("node `{id}` has a negative size")]
    NegativeSize { id: String },
    #[error("duplicate node id `{id}`")]
    DuplicateNodeId { id: String },
    #[error("connection references unknown node `{id}`")]
    UnknownEndpoint { id: String },
    #[error("unknown layout type `{name}`")]
    UnknownLayoutType { name: String },
    #[error("invalid layout configuration: {reason}")]
    InvalidConfig { reason: String },
    #[error("no nodes to lay out")]
    EmptyNodeSet,
    #[error("{kind} layout produced non-finite coordinates")]
    NumericalInstability { kind: LayoutType },
    #[error("{kind} layout failed: {reason}")]
    StrategyFailed { kind: LayoutType, reason: String },
}

impl LayoutError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LayoutError>;
