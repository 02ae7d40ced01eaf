use std::any::{TypeId, type_name};
use std::collections::{BTreeMap, HashMap};

use crate::component::{Component, Reflect};
use crate::entity::{Entity, EntityAllocator};
use crate::hierarchy::{Hierarchy, HierarchyError};
use crate::resource::{MissingResource, Resources};
use crate::signature::{ComponentId, ComponentSignature, MAX_COMPONENTS};
use crate::sparse_set::{ComponentStorage, SparseSet};

/// Error returned when a component type has not been registered in the [`World`].
///
/// This happens when calling [`World::insert`] or [`World::add_component`]
/// on a type that was never passed to [`World::register_component`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("component type `{type_name}` has never been registered, call register_component() first")]
pub struct ComponentNotRegistered {
    /// The name of the unregistered component type.
    pub type_name: &'static str,
}

impl ComponentNotRegistered {
    fn of<T: 'static>() -> Self {
        Self {
            type_name: type_name::<T>(),
        }
    }
}

/// Error returned when every signature bit is already assigned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot register `{type_name}`: all {capacity} component signature bits are in use")]
pub struct SignatureFull {
    pub type_name: &'static str,
    pub capacity: usize,
}

/// A structural change waiting to be applied to system membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityChange {
    /// The entity was created or its signature changed.
    Updated(Entity),
    /// The entity was deleted. Carries its last signature.
    Deleted(Entity, ComponentSignature),
}

impl EntityChange {
    pub fn entity(&self) -> Entity {
        match self {
            Self::Updated(entity) | Self::Deleted(entity, _) => *entity,
        }
    }
}

struct Registered {
    id: ComponentId,
    storage: ComponentStorage,
}

/// Type-erased reflection operations for a single component type.
struct ReflectEntry {
    has_fn: fn(&World, Entity) -> bool,
    get_fn: fn(&World, Entity) -> Option<&dyn Reflect>,
    get_mut_fn: fn(&mut World, Entity) -> Option<&mut dyn Reflect>,
    remove_fn: fn(&mut World, Entity) -> bool,
    /// Inserts a default instance (None if T doesn't impl Default).
    insert_default_fn: Option<fn(&mut World, Entity)>,
}

/// Entity registry: entities, component storages, signatures, hierarchy
/// and singleton resources.
///
/// Every structural mutation (entity created or deleted, component added or
/// removed) is appended to a change log. The [`Scheduler`](crate::Scheduler)
/// drains it to keep system membership in sync.
///
/// # Example
///
/// ```
/// use ember_ecs::World;
///
/// #[derive(Default)]
/// struct Health(f32);
///
/// let mut world = World::new();
/// world.register_component::<Health>();
///
/// let entity = world.create_entity("arena");
/// world.add_component::<Health>(entity).unwrap().0 = 100.0;
/// assert!(world.has_component::<Health>(entity));
/// assert_eq!(world.get_component::<Health>(entity).map(|h| h.0), Some(100.0));
/// ```
pub struct World {
    entities: EntityAllocator,
    components: HashMap<TypeId, Registered>,
    /// Registered type names, indexed by component id.
    component_names: Vec<&'static str>,
    /// Signature per entity index.
    signatures: Vec<ComponentSignature>,
    /// Scene tag per entity index.
    scenes: Vec<String>,
    hierarchy: Hierarchy,
    resources: Resources,
    changes: Vec<EntityChange>,
    /// Reflection metadata for registered component types, keyed by name.
    reflect_entries: BTreeMap<&'static str, ReflectEntry>,
}

impl World {
    /// Creates a new empty world.
    pub fn new() -> Self {
        Self {
            entities: EntityAllocator::new(),
            components: HashMap::new(),
            component_names: Vec::new(),
            signatures: Vec::new(),
            scenes: Vec::new(),
            hierarchy: Hierarchy::new(),
            resources: Resources::new(),
            changes: Vec::new(),
            reflect_entries: BTreeMap::new(),
        }
    }

    // ---- Component registration ----

    /// Registers a component type and assigns it a signature bit.
    ///
    /// Idempotent: registering the same type again returns its existing id.
    ///
    /// # Panics
    ///
    /// Panics if [`MAX_COMPONENTS`] types are already registered.
    pub fn register_component<T: Send + Sync + 'static>(&mut self) -> ComponentId {
        match self.try_register_component::<T>() {
            Ok(id) => id,
            Err(err) => {
                log::error!("{err}");
                panic!("{err}");
            }
        }
    }

    /// Like [`register_component`](World::register_component), but reports
    /// an exhausted signature instead of panicking.
    pub fn try_register_component<T: Send + Sync + 'static>(
        &mut self,
    ) -> Result<ComponentId, SignatureFull> {
        if let Some(registered) = self.components.get(&TypeId::of::<T>()) {
            return Ok(registered.id);
        }
        let id = self.component_names.len();
        if id >= MAX_COMPONENTS {
            return Err(SignatureFull {
                type_name: type_name::<T>(),
                capacity: MAX_COMPONENTS,
            });
        }
        self.components.insert(
            TypeId::of::<T>(),
            Registered {
                id,
                storage: ComponentStorage::new::<T>(),
            },
        );
        self.component_names.push(type_name::<T>());
        log::trace!("registered component `{}` as bit {id}", type_name::<T>());
        Ok(id)
    }

    /// Signature bit of `T`, if registered.
    pub fn component_id<T: 'static>(&self) -> Option<ComponentId> {
        self.components.get(&TypeId::of::<T>()).map(|r| r.id)
    }

    /// Type name registered under `id`.
    pub fn component_name(&self, id: ComponentId) -> Option<&'static str> {
        self.component_names.get(id).copied()
    }

    /// Number of registered component types.
    pub fn component_count(&self) -> usize {
        self.component_names.len()
    }

    /// Registers a component type with reflection support.
    ///
    /// The component can then be enumerated, read and removed by name. Use
    /// [`register_reflected_default`](World::register_reflected_default) to
    /// also allow inserting it by name.
    pub fn register_reflected<T: Component>(&mut self) -> ComponentId {
        let id = self.register_component::<T>();
        self.reflect_entries.insert(
            T::NAME,
            ReflectEntry {
                has_fn: |world, entity| world.get_component::<T>(entity).is_some(),
                get_fn: |world, entity| {
                    world
                        .get_component::<T>(entity)
                        .map(|c| c as &dyn Reflect)
                },
                get_mut_fn: |world, entity| {
                    world
                        .get_component_mut::<T>(entity)
                        .map(|c| c as &mut dyn Reflect)
                },
                remove_fn: |world, entity| world.remove_component::<T>(entity).is_some(),
                insert_default_fn: None,
            },
        );
        id
    }

    /// Like [`register_reflected`](World::register_reflected), and enables
    /// [`insert_default_by_name`](World::insert_default_by_name).
    pub fn register_reflected_default<T: Component + Default>(&mut self) -> ComponentId {
        let id = self.register_reflected::<T>();
        if let Some(entry) = self.reflect_entries.get_mut(T::NAME) {
            entry.insert_default_fn = Some(|world, entity| {
                if world.insert(entity, T::default()).is_err() {
                    log::warn!("cannot insert default `{}`", T::NAME);
                }
            });
        }
        id
    }

    // ---- Entity management ----

    /// Creates an entity tagged with `scene`. Its signature starts empty.
    pub fn create_entity(&mut self, scene: &str) -> Entity {
        let entity = self.entities.allocate();
        self.init_slot(entity, scene);
        entity
    }

    /// Creates `count` entities at once, reusing freed slots first.
    pub fn create_entities(&mut self, scene: &str, count: u32) -> Vec<Entity> {
        let entities = self.entities.allocate_many(count);
        for &entity in &entities {
            self.init_slot(entity, scene);
        }
        entities
    }

    fn init_slot(&mut self, entity: Entity, scene: &str) {
        let index = entity.index() as usize;
        if index >= self.signatures.len() {
            self.signatures.resize_with(index + 1, ComponentSignature::new);
            self.scenes.resize_with(index + 1, String::new);
        }
        self.signatures[index].clear();
        scene.clone_into(&mut self.scenes[index]);
        self.changes.push(EntityChange::Updated(entity));
    }

    /// Deletes an entity together with all of its descendants.
    ///
    /// Children are deleted before their parents; every deleted entity loses
    /// all of its components, leaves the hierarchy and is reported to the
    /// change log with its last signature. Returns `false` if the entity was
    /// already dead.
    pub fn delete_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.is_alive(entity) {
            return false;
        }

        let subtree = self.hierarchy.subtree(entity);
        for &doomed in subtree.iter().rev() {
            let index = doomed.index();
            for registered in self.components.values_mut() {
                registered.storage.remove_untyped(index);
            }
            let signature = std::mem::take(&mut self.signatures[index as usize]);
            self.scenes[index as usize].clear();
            self.hierarchy.remove(doomed);
            self.entities.deallocate(doomed);
            self.changes.push(EntityChange::Deleted(doomed, signature));
            log::trace!("deleted {doomed}");
        }
        true
    }

    /// Deletes every entity.
    pub fn clear(&mut self) {
        let alive: Vec<_> = self.entities.iter_alive().collect();
        for entity in alive {
            self.delete_entity(entity);
        }
        self.hierarchy.clear();
    }

    /// Returns whether the entity is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Returns the number of alive entities.
    pub fn entity_count(&self) -> u32 {
        self.entities.count()
    }

    /// Iterates over all currently alive entities in index order.
    pub fn iter_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    /// Scene tag the entity was created with.
    pub fn scene_of(&self, entity: Entity) -> Option<&str> {
        if !self.is_alive(entity) {
            return None;
        }
        self.scenes.get(entity.index() as usize).map(String::as_str)
    }

    /// Alive entities created for `scene`.
    pub fn entities_in_scene<'a>(&'a self, scene: &'a str) -> impl Iterator<Item = Entity> + 'a {
        self.entities
            .iter_alive()
            .filter(move |e| self.scenes[e.index() as usize] == scene)
    }

    /// Component signature of an alive entity.
    pub fn signature(&self, entity: Entity) -> Option<&ComponentSignature> {
        if !self.is_alive(entity) {
            return None;
        }
        self.signatures.get(entity.index() as usize)
    }

    // ---- Components ----

    /// Adds a default-constructed `T` and returns it for initialisation.
    ///
    /// An existing `T` is replaced.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn add_component<T: Default + Send + Sync + 'static>(
        &mut self,
        entity: Entity,
    ) -> Result<&mut T, ComponentNotRegistered> {
        self.insert(entity, T::default())?;
        let storage = self.storage_mut::<T>().ok_or_else(ComponentNotRegistered::of::<T>)?;
        storage
            .get_mut(entity.index())
            .ok_or_else(ComponentNotRegistered::of::<T>)
    }

    /// Inserts a component on an entity, replacing an existing value.
    ///
    /// # Errors
    ///
    /// Returns [`ComponentNotRegistered`] if `T` has never been registered.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive.
    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), ComponentNotRegistered> {
        assert!(
            self.entities.is_alive(entity),
            "cannot insert component on dead entity {entity}"
        );

        let registered = self
            .components
            .get_mut(&TypeId::of::<T>())
            .ok_or_else(ComponentNotRegistered::of::<T>)?;
        registered
            .storage
            .typed_mut::<T>()
            .set(entity.index(), component);

        let signature = &mut self.signatures[entity.index() as usize];
        if !signature.contains(registered.id) {
            signature.set(registered.id);
            self.changes.push(EntityChange::Updated(entity));
        }
        Ok(())
    }

    /// Removes a component from an entity, returning it.
    pub fn remove_component<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        let registered = self.components.get_mut(&TypeId::of::<T>())?;
        let value = registered.storage.typed_mut::<T>().remove(entity.index())?;
        self.signatures[entity.index() as usize].unset(registered.id);
        self.changes.push(EntityChange::Updated(entity));
        Some(value)
    }

    pub fn get_component<T: 'static>(&self, entity: Entity) -> Option<&T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage::<T>()?.get(entity.index())
    }

    pub fn get_component_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.entities.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.get_mut(entity.index())
    }

    /// Signature test: `false` for dead entities and unregistered types.
    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        match (self.component_id::<T>(), self.signature(entity)) {
            (Some(id), Some(signature)) => signature.contains(id),
            _ => false,
        }
    }

    /// Typed storage of `T`, if registered.
    pub fn storage<T: 'static>(&self) -> Option<&SparseSet<T>> {
        self.components
            .get(&TypeId::of::<T>())
            .map(|r| r.storage.typed::<T>())
    }

    /// Mutable typed storage of `T`, if registered.
    ///
    /// Values can be changed in place; adding or removing entries must go
    /// through the world so signatures stay in sync.
    pub fn storage_mut<T: 'static>(&mut self) -> Option<&mut SparseSet<T>> {
        self.components
            .get_mut(&TypeId::of::<T>())
            .map(|r| r.storage.typed_mut::<T>())
    }

    /// Number of entities holding a component of type `id`.
    pub fn component_len(&self, id: ComponentId) -> usize {
        self.components
            .values()
            .find(|r| r.id == id)
            .map_or(0, |r| r.storage.len_untyped())
    }

    // ---- Change log ----

    /// Changes recorded since the last [`take_changes`](World::take_changes).
    pub fn pending_changes(&self) -> &[EntityChange] {
        &self.changes
    }

    /// Drains the change log.
    pub fn take_changes(&mut self) -> Vec<EntityChange> {
        std::mem::take(&mut self.changes)
    }

    // ---- Hierarchy ----

    /// Parents `child` under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if the link would create a cycle, or either entity is dead.
    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        if let Err(err) = self.try_set_parent(child, parent) {
            log::error!("rejected re-parenting: {err}");
            panic!("rejected re-parenting: {err}");
        }
    }

    /// Parents `child` under `parent`, or reports why the link was rejected.
    /// A rejected call leaves the hierarchy untouched.
    pub fn try_set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), HierarchyError> {
        for entity in [child, parent] {
            if !self.is_alive(entity) {
                return Err(HierarchyError::DeadEntity(entity));
            }
        }
        self.hierarchy.try_set_parent(child, parent)
    }

    /// Detaches `child` from its parent. Returns the former parent.
    pub fn remove_parent(&mut self, child: Entity) -> Option<Entity> {
        if !self.is_alive(child) {
            return None;
        }
        self.hierarchy.remove_parent(child)
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.hierarchy.parent(entity)
    }

    pub fn children(&self, entity: Entity) -> Option<&[Entity]> {
        self.hierarchy.children(entity)
    }

    /// Returns `true` if `ancestor` is on the parent chain of `entity`.
    pub fn is_ancestor(&self, ancestor: Entity, entity: Entity) -> bool {
        self.hierarchy.is_ancestor(ancestor, entity)
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    // ---- Resources ----

    /// Inserts or replaces a singleton resource, returning the previous one.
    pub fn insert_resource<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.resources.insert(value)
    }

    pub fn remove_resource<T: 'static>(&mut self) -> Option<T> {
        self.resources.remove::<T>()
    }

    pub fn has_resource<T: 'static>(&self) -> bool {
        self.resources.contains::<T>()
    }

    /// Shared access to a resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource does not exist.
    pub fn resource<T: 'static>(&self) -> &T {
        match self.resources.get::<T>() {
            Ok(value) => value,
            Err(err) => missing(err),
        }
    }

    /// Exclusive access to a resource.
    ///
    /// # Panics
    ///
    /// Panics if the resource does not exist.
    pub fn resource_mut<T: 'static>(&mut self) -> &mut T {
        match self.resources.get_mut::<T>() {
            Ok(value) => value,
            Err(err) => missing(err),
        }
    }

    pub fn get_resource<T: 'static>(&self) -> Option<&T> {
        self.resources.get::<T>().ok()
    }

    pub fn get_resource_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.resources.get_mut::<T>().ok()
    }

    pub fn try_resource<T: 'static>(&self) -> Result<&T, MissingResource> {
        self.resources.get::<T>()
    }

    pub fn try_resource_mut<T: 'static>(&mut self) -> Result<&mut T, MissingResource> {
        self.resources.get_mut::<T>()
    }

    /// Temporarily takes a resource out of the world so `f` can use it
    /// alongside `&mut World`. The resource is put back afterwards.
    pub fn resource_scope<T: Send + Sync + 'static, R>(
        &mut self,
        f: impl FnOnce(&mut World, &mut T) -> R,
    ) -> Result<R, MissingResource> {
        let mut value = self
            .resources
            .remove::<T>()
            .ok_or_else(MissingResource::of::<T>)?;
        let result = f(self, &mut value);
        self.resources.insert(value);
        Ok(result)
    }

    /// Names of every stored resource type.
    pub fn resource_names(&self) -> Vec<&'static str> {
        self.resources.type_names()
    }

    pub fn resource_count(&self) -> usize {
        self.resources.len()
    }

    // ---- Reflection ----

    /// Reflected component `name` on `entity`.
    pub fn reflect(&self, entity: Entity, name: &str) -> Option<&dyn Reflect> {
        let entry = self.reflect_entries.get(name)?;
        (entry.get_fn)(self, entity)
    }

    /// Mutable reflected component `name` on `entity`.
    pub fn reflect_mut(&mut self, entity: Entity, name: &str) -> Option<&mut dyn Reflect> {
        let get_mut = self.reflect_entries.get(name)?.get_mut_fn;
        get_mut(self, entity)
    }

    /// Names of reflected components present on `entity`, sorted.
    pub fn reflected_components_of(&self, entity: Entity) -> Vec<&'static str> {
        self.reflect_entries
            .iter()
            .filter(|(_, entry)| (entry.has_fn)(self, entity))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Names of every reflected component type, sorted.
    pub fn reflected_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.reflect_entries.keys().copied()
    }

    /// Removes reflected component `name` from `entity`.
    pub fn remove_by_name(&mut self, entity: Entity, name: &str) -> bool {
        match self.reflect_entries.get(name).map(|entry| entry.remove_fn) {
            Some(remove) => remove(self, entity),
            None => false,
        }
    }

    /// Inserts a default instance of reflected component `name`. Returns
    /// `false` if the type is unknown or was registered without `Default`.
    pub fn insert_default_by_name(&mut self, entity: Entity, name: &str) -> bool {
        let Some(insert) = self
            .reflect_entries
            .get(name)
            .and_then(|entry| entry.insert_default_fn)
        else {
            return false;
        };
        if !self.is_alive(entity) {
            return false;
        }
        insert(self, entity);
        true
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn missing(err: MissingResource) -> ! {
    log::error!("{err}");
    panic!("{err}");
}
