use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

/// Error returned when a singleton resource has not been inserted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("resource `{type_name}` does not exist, insert it before use")]
pub struct MissingResource {
    /// The name of the missing resource type.
    pub type_name: &'static str,
}

impl MissingResource {
    pub fn of<T: 'static>() -> Self {
        Self {
            type_name: type_name::<T>(),
        }
    }
}

/// A single type-erased resource.
struct ResourceEntry {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Container for typed singleton resources.
///
/// Resources are global values stored once per World: event queues, render
/// queues, shared caches. Access follows the World's borrow: `&World` gives
/// shared access, `&mut World` exclusive access.
pub(crate) struct Resources {
    entries: HashMap<TypeId, ResourceEntry>,
}

impl Resources {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Inserts or replaces a resource of type T, returning the previous value.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        let previous = self.entries.insert(
            TypeId::of::<T>(),
            ResourceEntry {
                value: Box::new(value),
                type_name: type_name::<T>(),
            },
        )?;
        previous.value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    /// Removes a resource of type T, returning it if present.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        let entry = self.entries.remove(&TypeId::of::<T>())?;
        entry.value.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: 'static>(&self) -> Result<&T, MissingResource> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .ok_or_else(MissingResource::of::<T>)
    }

    pub fn get_mut<T: 'static>(&mut self) -> Result<&mut T, MissingResource> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_mut::<T>())
            .ok_or_else(MissingResource::of::<T>)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Names of every stored resource type, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}
