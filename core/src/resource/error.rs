use crate::binary::DecodeError;

/// Errors produced while resolving or loading resources.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// The source has no file at the resolved path.
    #[error("resource not found: {0}")]
    NotFound(String),
    /// Reading from the source failed.
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The GUID is empty or would escape the resource directory.
    #[error("invalid resource GUID: {0:?}")]
    InvalidGuid(String),
    /// `get` was called for a type that was never registered.
    #[error("resource type {0} is not registered")]
    UnregisteredType(&'static str),
    /// The GUID is already cached as a different type.
    #[error("resource {guid} is cached as {cached}, requested as {requested}")]
    TypeMismatch {
        guid: String,
        cached: &'static str,
        requested: &'static str,
    },
    /// The payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ResourceError {
    /// Misuse of the cache rather than a bad or missing file: an
    /// unregistered type, a GUID clash between types or an invalid GUID.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ResourceError::UnregisteredType(_)
                | ResourceError::TypeMismatch { .. }
                | ResourceError::InvalidGuid(_)
        )
    }

    /// Wraps an IO error, mapping `NotFound` to [`ResourceError::NotFound`].
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            ResourceError::NotFound(path)
        } else {
            ResourceError::Io { path, source: err }
        }
    }
}
