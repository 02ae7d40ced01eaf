use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{DirectorySource, Resource, ResourceError, ResourceSource};

type ErasedResource = dyn Any + Send + Sync;

struct Registration {
    extension: &'static str,
    type_name: &'static str,
}

struct Entry {
    value: Arc<ErasedResource>,
    type_id: TypeId,
    type_name: &'static str,
    unload: fn(&mut ErasedResource),
}

fn unload_erased<T: Resource>(value: &mut ErasedResource) {
    if let Some(value) = value.downcast_mut::<T>() {
        value.unload();
    }
}

#[derive(Default)]
struct CacheState {
    registrations: HashMap<TypeId, Registration>,
    entries: HashMap<String, Entry>,
}

/// Shared, lazily-populated cache of decoded resources keyed by GUID.
///
/// Handles are plain `Arc<T>`. Dropping the last outside handle does not
/// free anything; entries are evicted by [`collect_garbage`](Self::collect_garbage).
///
/// ```ignore
/// let cache = Arc::new(ResourceCache::new("assets"));
/// cache.register::<Animation>();
/// let walk: Arc<Animation> = cache.get("c0ffee")?; // reads assets/c0ffee.ani
/// ```
pub struct ResourceCache {
    source: Box<dyn ResourceSource>,
    state: Mutex<CacheState>,
}

impl ResourceCache {
    /// Cache reading from `directory` on disk.
    pub fn new(directory: impl Into<String>) -> Self {
        Self::with_source(DirectorySource::new(directory))
    }

    pub fn with_source(source: impl ResourceSource) -> Self {
        Self {
            source: Box::new(source),
            state: Mutex::new(CacheState::default()),
        }
    }

    pub fn source(&self) -> &dyn ResourceSource {
        self.source.as_ref()
    }

    /// Registers `T` so it can be requested with [`get`](Self::get).
    /// Registering twice is a no-op.
    pub fn register<T: Resource>(&self) {
        let mut state = self.state.lock();
        state
            .registrations
            .entry(TypeId::of::<T>())
            .or_insert_with(|| {
                log::debug!(
                    "registered resource type {} ({})",
                    std::any::type_name::<T>(),
                    T::EXTENSION
                );
                Registration {
                    extension: T::EXTENSION,
                    type_name: std::any::type_name::<T>(),
                }
            });
    }

    /// Type names of the registered resource types, sorted.
    pub fn registered_types(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .state
            .lock()
            .registrations
            .values()
            .map(|r| r.type_name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn is_registered<T: Resource>(&self) -> bool {
        self.state
            .lock()
            .registrations
            .contains_key(&TypeId::of::<T>())
    }

    /// Source-relative path `guid + extension` of a registered type.
    pub fn path_of<T: Resource>(&self, guid: &str) -> Result<String, ResourceError> {
        let state = self.state.lock();
        let registration = state
            .registrations
            .get(&TypeId::of::<T>())
            .ok_or(ResourceError::UnregisteredType(std::any::type_name::<T>()))?;
        Ok(format!("{}{}", guid, registration.extension))
    }

    /// Returns the resource for `guid`, loading it on first request.
    ///
    /// Failed loads are not cached; the next call retries.
    pub fn get<T: Resource>(&self, guid: &str) -> Result<Arc<T>, ResourceError> {
        validate_guid(guid)?;
        let requested = std::any::type_name::<T>();
        let mut state = self.state.lock();

        let Some(registration) = state.registrations.get(&TypeId::of::<T>()) else {
            log::error!("resource type {} requested before registration", requested);
            return Err(ResourceError::UnregisteredType(requested));
        };
        let path = format!("{}{}", guid, registration.extension);

        if let Some(entry) = state.entries.get(guid) {
            return entry
                .value
                .clone()
                .downcast::<T>()
                .map_err(|_| ResourceError::TypeMismatch {
                    guid: guid.to_owned(),
                    cached: entry.type_name,
                    requested,
                });
        }

        let bytes = self.source.read(&path).inspect_err(|e| {
            log::warn!("failed to read {} from {}: {}", path, self.source.describe(), e);
        })?;
        let resource = Arc::new(T::load(guid, &bytes)?);
        state.entries.insert(
            guid.to_owned(),
            Entry {
                value: resource.clone(),
                type_id: TypeId::of::<T>(),
                type_name: requested,
                unload: unload_erased::<T>,
            },
        );
        Ok(resource)
    }

    /// Like [`get`](Self::get), but treats structural errors as fatal.
    ///
    /// Missing, unreadable or undecodable files are logged and give `None`.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not registered, `guid` is cached as another type or
    /// `guid` is invalid; see [`ResourceError::is_structural`].
    pub fn load<T: Resource>(&self, guid: &str) -> Option<Arc<T>> {
        match self.get::<T>(guid) {
            Ok(resource) => Some(resource),
            Err(err) if err.is_structural() => {
                log::error!("{err}");
                panic!("{err}");
            }
            Err(err) => {
                log::warn!("resource {guid} unavailable: {err}");
                None
            }
        }
    }

    /// Inserts an already-built resource under `guid`, replacing any entry.
    pub fn insert<T: Resource>(&self, guid: impl Into<String>, resource: T) -> Arc<T> {
        let resource = Arc::new(resource);
        self.state.lock().entries.insert(
            guid.into(),
            Entry {
                value: resource.clone(),
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
                unload: unload_erased::<T>,
            },
        );
        resource
    }

    /// Whether `guid` is cached.
    pub fn contains(&self, guid: &str) -> bool {
        self.state.lock().entries.contains_key(guid)
    }

    /// Whether `guid` is cached as a `T`.
    pub fn contains_typed<T: Resource>(&self, guid: &str) -> bool {
        self.state
            .lock()
            .entries
            .get(guid)
            .is_some_and(|e| e.type_id == TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Evicts every entry only the cache still references, calling
    /// [`Resource::unload`] on each. Returns the number evicted.
    pub fn collect_garbage(&self) -> usize {
        let mut state = self.state.lock();
        let unused: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, e)| Arc::strong_count(&e.value) == 1)
            .map(|(guid, _)| guid.clone())
            .collect();

        for guid in &unused {
            if let Some(mut entry) = state.entries.remove(guid) {
                if let Some(value) = Arc::get_mut(&mut entry.value) {
                    (entry.unload)(value);
                }
                log::info!("evicted resource {} ({})", guid, entry.type_name);
            }
        }
        unused.len()
    }

    /// Drops every entry. Resources still held elsewhere stay alive with
    /// their holders and are not unloaded.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        for (guid, mut entry) in state.entries.drain() {
            match Arc::get_mut(&mut entry.value) {
                Some(value) => (entry.unload)(value),
                None => log::debug!("resource {} still referenced while clearing", guid),
            }
        }
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResourceCache")
            .field("source", &self.source.describe())
            .field(
                "registered",
                &state.registrations.values().map(|r| r.type_name).collect::<Vec<_>>(),
            )
            .field("entries", &state.entries.len())
            .finish()
    }
}

fn validate_guid(guid: &str) -> Result<(), ResourceError> {
    let escapes = guid.starts_with('/') || guid.split(['/', '\\']).any(|s| s == "..");
    if guid.is_empty() || escapes {
        return Err(ResourceError::InvalidGuid(guid.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::MemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static UNLOADS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct Blob(Vec<u8>);

    impl Resource for Blob {
        const EXTENSION: &'static str = ".blob";

        fn load(_guid: &str, bytes: &[u8]) -> Result<Self, ResourceError> {
            Ok(Blob(bytes.to_vec()))
        }

        fn unload(&mut self) {
            UNLOADS.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Debug)]
    struct Text(String);

    impl Resource for Text {
        const EXTENSION: &'static str = ".txt";

        fn load(_guid: &str, bytes: &[u8]) -> Result<Self, ResourceError> {
            Ok(Text(String::from_utf8_lossy(bytes).into_owned()))
        }
    }

    fn cache_with(files: &[(&str, &[u8])]) -> ResourceCache {
        let source = MemorySource::new();
        for (path, data) in files {
            source.insert(*path, data.to_vec());
        }
        ResourceCache::with_source(source)
    }

    #[test]
    fn unregistered_type_is_an_error() {
        let cache = cache_with(&[("a.blob", b"1")]);
        assert!(matches!(
            cache.get::<Blob>("a"),
            Err(ResourceError::UnregisteredType(_))
        ));
    }

    #[test]
    #[should_panic(expected = "is not registered")]
    fn load_panics_on_unregistered_type() {
        let cache = cache_with(&[("a.blob", b"1")]);
        cache.load::<Blob>("a");
    }

    #[test]
    fn load_tolerates_missing_files() {
        let cache = cache_with(&[("a.blob", b"1")]);
        cache.register::<Blob>();
        assert!(cache.load::<Blob>("missing").is_none());
        assert_eq!(cache.load::<Blob>("a").map(|b| b.0.clone()), Some(b"1".to_vec()));
    }

    #[test]
    fn registered_types_are_listed() {
        let cache = cache_with(&[]);
        cache.register::<Text>();
        cache.register::<Blob>();
        cache.register::<Blob>();
        let names = cache.registered_types();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("Blob")));
        assert!(names.iter().any(|n| n.ends_with("Text")));
        assert!(format!("{cache:?}").contains("Text"));
    }

    #[test]
    fn loads_once_per_guid() {
        let cache = cache_with(&[("a.blob", b"12")]);
        cache.register::<Blob>();
        let first = cache.get::<Blob>("a").unwrap();
        let second = cache.get::<Blob>("a").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.0, b"12");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_file_is_not_cached() {
        let cache = cache_with(&[]);
        cache.register::<Blob>();
        assert!(matches!(
            cache.get::<Blob>("nope"),
            Err(ResourceError::NotFound(_))
        ));
        assert!(!cache.contains("nope"));
    }

    #[test]
    fn gc_evicts_only_unreferenced_entries() {
        let cache = cache_with(&[("a.blob", b"1"), ("b.blob", b"2")]);
        cache.register::<Blob>();
        let held = cache.get::<Blob>("a").unwrap();
        drop(cache.get::<Blob>("b").unwrap());
        assert_eq!(cache.len(), 2);

        let before = UNLOADS.load(Ordering::SeqCst);
        assert_eq!(cache.collect_garbage(), 1);
        assert!(UNLOADS.load(Ordering::SeqCst) > before);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));

        drop(held);
        assert_eq!(cache.collect_garbage(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn same_guid_different_type_is_rejected() {
        let cache = cache_with(&[("x.blob", b"1"), ("x.txt", b"hi")]);
        cache.register::<Blob>();
        cache.register::<Text>();
        let _blob = cache.get::<Blob>("x").unwrap();
        assert!(matches!(
            cache.get::<Text>("x"),
            Err(ResourceError::TypeMismatch { .. })
        ));
        assert!(cache.contains_typed::<Blob>("x"));
    }

    #[test]
    fn escaping_guids_are_rejected() {
        let cache = cache_with(&[]);
        cache.register::<Blob>();
        for guid in ["", "../secret", "/etc/passwd", "a/../../b"] {
            assert!(matches!(
                cache.get::<Blob>(guid),
                Err(ResourceError::InvalidGuid(_))
            ));
        }
    }

    #[test]
    fn inserted_resources_are_served() {
        let cache = cache_with(&[]);
        cache.register::<Text>();
        cache.insert("greeting", Text("hello".into()));
        assert_eq!(cache.get::<Text>("greeting").unwrap().0, "hello");
        assert_eq!(cache.path_of::<Text>("greeting").unwrap(), "greeting.txt");
    }
}
