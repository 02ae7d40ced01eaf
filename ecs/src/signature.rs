use fixedbitset::FixedBitSet;

/// Number of distinct component types a world can register.
pub const MAX_COMPONENTS: usize = 64;

/// Index of a registered component type, also its signature bit.
pub type ComponentId = usize;

/// Fixed-width bitset of component types.
///
/// Bit *i* set means component type *i* is present (on an entity) or
/// required (by a system). A system matches an entity when the system's
/// signature is a subset of the entity's.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ComponentSignature {
    bits: FixedBitSet,
}

impl Default for ComponentSignature {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentSignature {
    /// An empty signature.
    pub fn new() -> Self {
        Self {
            bits: FixedBitSet::with_capacity(MAX_COMPONENTS),
        }
    }

    /// Builds a signature from component ids.
    pub fn from_ids(ids: impl IntoIterator<Item = ComponentId>) -> Self {
        let mut sig = Self::new();
        for id in ids {
            sig.set(id);
        }
        sig
    }

    /// # Panics
    ///
    /// Panics if `id >= MAX_COMPONENTS`.
    pub fn set(&mut self, id: ComponentId) {
        assert!(id < MAX_COMPONENTS, "component id {id} out of range");
        self.bits.insert(id);
    }

    pub fn unset(&mut self, id: ComponentId) {
        if id < MAX_COMPONENTS {
            self.bits.set(id, false);
        }
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.bits.contains(id)
    }

    /// Every bit of `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &ComponentSignature) -> bool {
        self.bits.is_subset(&other.bits)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    pub fn count(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Set component ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.bits.ones()
    }
}

impl std::fmt::Debug for ComponentSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.ids()).finish()
    }
}
