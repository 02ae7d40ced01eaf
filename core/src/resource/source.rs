use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use super::ResourceError;

/// Byte-level backend the [`ResourceCache`](super::ResourceCache) reads from.
///
/// Paths are relative, use forward slashes and already carry the resource
/// extension (`"<guid>.ani"`).
pub trait ResourceSource: Send + Sync + 'static {
    /// Reads the entire file at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError>;

    /// Whether a file exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Reads resources from a directory on disk.
///
/// A relative path resolves to `directory + "/" + path`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    directory: String,
}

impl DirectorySource {
    pub fn new(directory: impl Into<String>) -> Self {
        let mut directory = directory.into();
        while directory.len() > 1 && directory.ends_with('/') {
            directory.pop();
        }
        Self { directory }
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Full filesystem path for a relative resource path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        PathBuf::from(format!("{}/{}", self.directory, path))
    }
}

impl ResourceSource for DirectorySource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        let full = self.resolve(path);
        std::fs::read(&full).map_err(|e| ResourceError::io(full.display().to_string(), e))
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn describe(&self) -> String {
        format!("directory '{}'", self.directory)
    }
}

/// In-memory resource source for tests and embedded assets.
///
/// Clones share the same file table, so files can be added after the
/// source has been handed to a cache.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a file.
    pub fn insert(&self, path: impl Into<String>, data: Vec<u8>) {
        self.files.write().insert(path.into(), data);
    }

    pub fn remove(&self, path: &str) -> Option<Vec<u8>> {
        self.files.write().remove(path)
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl ResourceSource for MemorySource {
    fn read(&self, path: &str) -> Result<Vec<u8>, ResourceError> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(path.to_owned()))
    }

    fn exists(&self, path: &str) -> bool {
        self.files.read().contains_key(path)
    }

    fn describe(&self) -> String {
        format!("memory ({} files)", self.len())
    }
}
