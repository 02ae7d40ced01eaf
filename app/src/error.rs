use std::path::PathBuf;

use ember_core::resource::ResourceError;
use ember_ecs::{ComponentNotRegistered, HierarchyError};

/// Errors surfaced by the application layer.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("failed to serialize config: {0}")]
    ConfigWrite(#[from] ron::Error),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error(transparent)]
    ComponentNotRegistered(#[from] ComponentNotRegistered),
    #[error("scene setup failed: {0}")]
    Scene(String),
}
