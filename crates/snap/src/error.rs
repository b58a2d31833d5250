#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SnapError {
    #[error("`{id}` has a non-finite coordinate")]
    NonFiniteCoordinate { id: String },
    #[error("duplicate item id `{id}`")]
    DuplicateItemId { id: String },
    #[error("unknown item `{id}`")]
    UnknownItem { id: String },
    #[error("need at least {required} items, got {actual}")]
    NotEnoughItems { required: usize, actual: usize },
    #[error("duplicate magnetic target id `{id}`")]
    DuplicateTargetId { id: String },
    #[error("unknown magnetic target `{id}`")]
    UnknownTarget { id: String },
    #[error("invalid snap configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl SnapError {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SnapError>;
