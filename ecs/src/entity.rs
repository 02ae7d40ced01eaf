/// A generational entity handle.
///
/// - **index**: slot in the entity allocator, used as the sparse-set key
/// - **generation**: bumped every time the slot is freed, so a handle kept
///   past deletion never matches the slot's next occupant
///
/// Two simultaneously alive entities never share an index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index of this entity.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the generation of this entity's slot.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Packs index and generation into one `u64` (generation high).
    pub fn to_bits(&self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    /// Inverse of [`to_bits`](Self::to_bits).
    pub fn from_bits(bits: u64) -> Self {
        Self::new(bits as u32, (bits >> 32) as u32)
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Allocates and recycles entity slots.
///
/// Freed slots go on a LIFO free list; the slot's generation is bumped on
/// free so stale handles stop matching.
pub(crate) struct EntityAllocator {
    /// Generation per slot. Index = entity index.
    generations: Vec<u32>,
    /// Alive flag per slot.
    alive: Vec<bool>,
    /// Free list of recyclable indices (LIFO stack).
    free_list: Vec<u32>,
    /// Total number of currently alive entities.
    count: u32,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            count: 0,
        }
    }

    /// Allocates a new entity, reusing a recycled slot if available.
    pub fn allocate(&mut self) -> Entity {
        self.count += 1;

        if let Some(index) = self.free_list.pop() {
            self.alive[index as usize] = true;
            Entity::new(index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            Entity::new(index, 0)
        }
    }

    /// Allocates `count` entities, reusing recycled slots first.
    pub fn allocate_many(&mut self, count: u32) -> Vec<Entity> {
        let mut entities = Vec::with_capacity(count as usize);

        let reuse = count.min(self.free_list.len() as u32);
        let split = self.free_list.len() - reuse as usize;
        for index in self.free_list.drain(split..).rev() {
            self.alive[index as usize] = true;
            entities.push(Entity::new(index, self.generations[index as usize]));
        }

        let fresh = count - reuse;
        if fresh > 0 {
            let start = self.generations.len() as u32;
            self.generations
                .resize(self.generations.len() + fresh as usize, 0);
            self.alive.resize(self.alive.len() + fresh as usize, true);
            entities.extend((0..fresh).map(|i| Entity::new(start + i, 0)));
        }

        self.count += count;
        entities
    }

    /// Frees an entity. Returns false if already dead or the handle is stale.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let idx = entity.index() as usize;
        self.alive[idx] = false;
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free_list.push(entity.index());
        self.count -= 1;
        true
    }

    /// Returns whether the entity is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        let idx = entity.index() as usize;
        idx < self.alive.len() && self.alive[idx] && self.generations[idx] == entity.generation()
    }

    /// Returns the number of alive entities.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Number of slots ever allocated.
    pub fn capacity(&self) -> usize {
        self.alive.len()
    }

    /// Returns the alive entity at the given index, or `None` if the slot is free.
    pub fn entity_at_index(&self, index: u32) -> Option<Entity> {
        let idx = index as usize;
        if idx < self.alive.len() && self.alive[idx] {
            Some(Entity::new(index, self.generations[idx]))
        } else {
            None
        }
    }

    /// Iterates over all currently alive entities in index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(idx, _)| Entity::new(idx as u32, self.generations[idx]))
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
