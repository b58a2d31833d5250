use canvas_layout::LayoutError;
use canvas_snap::SnapError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Snap(#[from] SnapError),
    #[error("failed to read configuration `{}`", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed configuration")]
    ConfigJson(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
