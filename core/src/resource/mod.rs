//! GUID-addressed resource loading.
//!
//! - [`Resource`] - a type the cache can decode, with its file extension
//! - [`ResourceSource`] - where bytes come from ([`DirectorySource`], [`MemorySource`])
//! - [`ResourceCache`] - shared cache resolving `directory/<guid><extension>`
//!   on first use and evicting unreferenced entries on an explicit sweep

mod cache;
mod error;
mod source;

pub use cache::ResourceCache;
pub use error::ResourceError;
pub use source::{DirectorySource, MemorySource, ResourceSource};

/// A decodable resource type.
///
/// The cache calls [`load`](Resource::load) on first request and
/// [`unload`](Resource::unload) when a garbage sweep evicts the entry.
pub trait Resource: Sized + Send + Sync + 'static {
    /// File extension including the leading dot.
    const EXTENSION: &'static str;

    fn load(guid: &str, bytes: &[u8]) -> Result<Self, ResourceError>;

    fn unload(&mut self) {}
}
