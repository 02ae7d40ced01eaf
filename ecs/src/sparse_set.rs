use std::any::Any;

/// Typed sparse set storing components of type T.
///
/// Uses a sparse array (entity index → dense index) and a dense array
/// (contiguous component data + entity mapping) for O(1) insert/remove/get
/// and cache-friendly iteration.
///
/// Removal swaps the last dense element into the freed slot, so dense order
/// is insertion order perturbed by removals and references are only valid
/// until the next structural mutation of this set.
pub struct SparseSet<T: 'static> {
    /// Sparse array: `entity_index -> dense_index`. `None` means the entity
    /// does not have this component.
    sparse: Vec<Option<u32>>,
    /// Dense array of component values (contiguous for iteration).
    dense: Vec<T>,
    /// Entity indices corresponding to each dense element.
    entities: Vec<u32>,
}

impl<T: 'static> SparseSet<T> {
    /// Creates a new empty sparse set.
    pub fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            entities: Vec::new(),
        }
    }

    /// Inserts a component for the given entity index.
    /// If the entity already has this component, the value is replaced.
    pub fn set(&mut self, entity_index: u32, value: T) {
        let idx = entity_index as usize;

        if idx >= self.sparse.len() {
            self.sparse.resize(idx + 1, None);
        }

        if let Some(dense_idx) = self.sparse[idx] {
            self.dense[dense_idx as usize] = value;
        } else {
            let dense_idx = self.dense.len() as u32;
            self.sparse[idx] = Some(dense_idx);
            self.dense.push(value);
            self.entities.push(entity_index);
        }
    }

    /// Removes a component for the given entity index.
    /// Returns the removed value, or `None` if the entity did not have this component.
    pub fn remove(&mut self, entity_index: u32) -> Option<T> {
        let idx = entity_index as usize;
        let dense_idx = (*self.sparse.get(idx)?)? as usize;
        self.sparse[idx] = None;

        let last_dense = self.dense.len() - 1;
        if dense_idx != last_dense {
            // Swap-remove: move last element into the removed slot
            let swapped_entity = self.entities[last_dense];
            self.sparse[swapped_entity as usize] = Some(dense_idx as u32);
            self.entities[dense_idx] = swapped_entity;
        }

        self.entities.pop();
        Some(self.dense.swap_remove(dense_idx))
    }

    /// Returns a reference to the component for the given entity index.
    pub fn get(&self, entity_index: u32) -> Option<&T> {
        let dense_idx = (*self.sparse.get(entity_index as usize)?)? as usize;
        Some(&self.dense[dense_idx])
    }

    /// Returns a mutable reference to the component for the given entity index.
    pub fn get_mut(&mut self, entity_index: u32) -> Option<&mut T> {
        let dense_idx = (*self.sparse.get(entity_index as usize)?)? as usize;
        Some(&mut self.dense[dense_idx])
    }

    /// Returns whether the entity has this component.
    pub fn contains(&self, entity_index: u32) -> bool {
        matches!(self.sparse.get(entity_index as usize), Some(Some(_)))
    }

    /// Returns the number of components stored.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Returns whether this sparse set is empty.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    /// Removes every component, keeping allocations.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.entities.clear();
    }

    /// Reserves capacity for at least `additional` more components.
    pub fn reserve(&mut self, additional: usize) {
        self.dense.reserve(additional);
        self.entities.reserve(additional);
    }

    /// Dense component values.
    pub fn data(&self) -> &[T] {
        &self.dense
    }

    /// Dense component values (mutable).
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.dense
    }

    /// Returns a slice of entity indices in dense order.
    pub fn entities(&self) -> &[u32] {
        &self.entities
    }

    /// Iterates over `(entity_index, &component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.entities.iter().copied().zip(self.dense.iter())
    }

    /// Iterates over `(entity_index, &mut component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.entities.iter().copied().zip(self.dense.iter_mut())
    }
}

impl<T: 'static> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Type-erased operation function signatures
type RemoveFn = fn(&mut dyn Any, u32) -> bool;
type ContainsFn = fn(&dyn Any, u32) -> bool;
type LenFn = fn(&dyn Any) -> usize;

/// A type-erased sparse set that stores components of a single type.
///
/// Lets the [`World`](crate::World) remove or probe components of an entity
/// without knowing their types. Used internally.
pub(crate) struct ComponentStorage {
    inner: Box<dyn Any + Send + Sync>,
    /// Human-readable type name for error messages.
    type_name: &'static str,
    /// Type-erased remove operation for entity deletion.
    remove_fn: RemoveFn,
    /// Type-erased contains check.
    contains_fn: ContainsFn,
    len_fn: LenFn,
}

const STORAGE_TYPE: &str = "component storage holds the type it was created for";

impl ComponentStorage {
    /// Creates a new component storage for type `T`.
    pub fn new<T: Send + Sync + 'static>() -> Self {
        Self {
            inner: Box::new(SparseSet::<T>::new()),
            type_name: std::any::type_name::<T>(),
            remove_fn: |any, entity_index| {
                let set = any.downcast_mut::<SparseSet<T>>().expect(STORAGE_TYPE);
                set.remove(entity_index).is_some()
            },
            contains_fn: |any, entity_index| {
                let set = any.downcast_ref::<SparseSet<T>>().expect(STORAGE_TYPE);
                set.contains(entity_index)
            },
            len_fn: |any| {
                let set = any.downcast_ref::<SparseSet<T>>().expect(STORAGE_TYPE);
                set.len()
            },
        }
    }

    /// Downcasts to the typed sparse set.
    pub fn typed<T: 'static>(&self) -> &SparseSet<T> {
        self.inner.downcast_ref::<SparseSet<T>>().unwrap_or_else(|| {
            panic!(
                "storage of `{}` accessed as `{}`",
                self.type_name,
                std::any::type_name::<T>()
            )
        })
    }

    /// Downcasts to the typed sparse set (mutable).
    pub fn typed_mut<T: 'static>(&mut self) -> &mut SparseSet<T> {
        let type_name = self.type_name;
        self.inner.downcast_mut::<SparseSet<T>>().unwrap_or_else(|| {
            panic!(
                "storage of `{}` accessed as `{}`",
                type_name,
                std::any::type_name::<T>()
            )
        })
    }

    /// Returns the human-readable type name of the stored component.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Removes a component by entity index (type-erased). Returns true if removed.
    pub fn remove_untyped(&mut self, entity_index: u32) -> bool {
        (self.remove_fn)(self.inner.as_mut(), entity_index)
    }

    /// Checks if the entity has this component (type-erased).
    pub fn contains_untyped(&self, entity_index: u32) -> bool {
        (self.contains_fn)(self.inner.as_ref(), entity_index)
    }

    /// Number of stored components (type-erased).
    pub fn len_untyped(&self) -> usize {
        (self.len_fn)(self.inner.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut set = SparseSet::<u32>::new();
        set.set(5, 42);
        assert_eq!(set.get(5), Some(&42));
    }

    #[test]
    fn set_replace() {
        let mut set = SparseSet::<u32>::new();
        set.set(5, 42);
        set.set(5, 99);
        assert_eq!(set.get(5), Some(&99));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_returns_value() {
        let mut set = SparseSet::<u32>::new();
        set.set(5, 42);
        assert_eq!(set.remove(5), Some(42));
        assert_eq!(set.get(5), None);
    }

    #[test]
    fn remove_nonexistent() {
        let mut set = SparseSet::<u32>::new();
        assert_eq!(set.remove(5), None);
        set.set(1, 1);
        assert_eq!(set.remove(0), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn contains() {
        let mut set = SparseSet::<u32>::new();
        assert!(!set.contains(5));
        set.set(5, 42);
        assert!(set.contains(5));
        set.remove(5);
        assert!(!set.contains(5));
    }

    #[test]
    fn iteration_follows_dense_order() {
        let mut set = SparseSet::<&str>::new();
        set.set(1, "a");
        set.set(5, "b");
        set.set(3, "c");

        let items: Vec<_> = set.iter().collect();
        assert_eq!(items, vec![(1, &"a"), (5, &"b"), (3, &"c")]);
        assert_eq!(set.data(), &["a", "b", "c"]);
        assert_eq!(set.entities(), &[1, 5, 3]);
    }

    #[test]
    fn swap_remove_correctness() {
        let mut set = SparseSet::<u32>::new();
        set.set(0, 10);
        set.set(1, 20);
        set.set(2, 30);

        // Remove middle element (dense index 1), last element (entity 2) swaps in
        set.remove(1);

        assert_eq!(set.get(0), Some(&10));
        assert_eq!(set.get(1), None);
        assert_eq!(set.get(2), Some(&30));
        assert_eq!(set.entities(), &[0, 2]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn dense_and_sparse_stay_consistent_under_churn() {
        let mut set = SparseSet::<u32>::new();
        let mut model = std::collections::HashMap::new();
        // Deterministic pseudo-random op sequence.
        let mut x: u32 = 0x9e37_79b9;
        for step in 0..2_000u32 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            let id = x % 64;
            if x % 3 == 0 {
                assert_eq!(set.remove(id), model.remove(&id));
            } else {
                set.set(id, step);
                model.insert(id, step);
            }
            for probe in 0..64 {
                assert_eq!(set.contains(probe), model.contains_key(&probe));
                assert_eq!(set.get(probe), model.get(&probe));
            }
            for (i, e) in set.entities().iter().enumerate() {
                assert_eq!(set.get(*e), Some(&set.data()[i]));
            }
        }
    }

    #[test]
    fn clear_empties_the_set() {
        let mut set = SparseSet::<u32>::new();
        set.set(3, 1);
        set.set(9, 2);
        set.clear();
        assert!(set.is_empty());
        assert!(!set.contains(3));
        set.set(3, 5);
        assert_eq!(set.get(3), Some(&5));
    }

    #[test]
    fn remove_untyped_works() {
        let mut storage = ComponentStorage::new::<u32>();
        storage.typed_mut::<u32>().set(5, 42);
        assert!(storage.contains_untyped(5));
        assert_eq!(storage.len_untyped(), 1);
        assert!(storage.remove_untyped(5));
        assert!(!storage.contains_untyped(5));
        assert!(!storage.remove_untyped(5));
    }

    #[test]
    #[should_panic(expected = "storage of `u32` accessed as `f32`")]
    fn typed_access_with_wrong_type_panics() {
        let storage = ComponentStorage::new::<u32>();
        let _ = storage.typed::<f32>();
    }
}
