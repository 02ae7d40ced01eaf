use crate::hierarchy::HierarchyError;
use crate::schedule::{FrameStats, Scheduler};
use crate::system::{FrameContext, System};
use crate::world::{ComponentNotRegistered, World};
use crate::Entity;

/// A [`World`] paired with its [`Scheduler`].
///
/// The structural helpers refresh system membership right away, so hooks
/// have run by the time they return. Direct world access through
/// [`world_mut`](Ecs::world_mut) defers that to the next
/// [`refresh`](Ecs::refresh) or [`run_frame`](Ecs::run_frame).
pub struct Ecs {
    world: World,
    scheduler: Scheduler,
}

impl Ecs {
    /// An empty world with the built-in components registered.
    pub fn new() -> Self {
        let mut world = World::new();
        crate::components::register_builtin_components(&mut world);
        Self {
            world,
            scheduler: Scheduler::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Appends a system; see [`Scheduler::add_system`].
    pub fn add_system<S: System>(&mut self, system: S) {
        self.scheduler.add_system(&mut self.world, system);
    }

    pub fn system<S: System>(&self) -> Option<&S> {
        self.scheduler.system::<S>()
    }

    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        self.scheduler.system_mut::<S>()
    }

    pub fn refresh(&mut self) {
        self.scheduler.refresh(&mut self.world);
    }

    pub fn create_entity(&mut self, scene: &str) -> Entity {
        let entity = self.world.create_entity(scene);
        self.refresh();
        entity
    }

    /// Deletes the entity and its descendants.
    pub fn delete_entity(&mut self, entity: Entity) -> bool {
        let deleted = self.world.delete_entity(entity);
        self.refresh();
        deleted
    }

    /// Inserts a default `T` on `entity`.
    pub fn add_component<T: Default + Send + Sync + 'static>(
        &mut self,
        entity: Entity,
    ) -> Result<(), ComponentNotRegistered> {
        self.world.add_component::<T>(entity)?;
        self.refresh();
        Ok(())
    }

    pub fn insert<T: Send + Sync + 'static>(
        &mut self,
        entity: Entity,
        component: T,
    ) -> Result<(), ComponentNotRegistered> {
        self.world.insert(entity, component)?;
        self.refresh();
        Ok(())
    }

    pub fn remove_component<T: 'static>(&mut self, entity: Entity) -> Option<T> {
        let removed = self.world.remove_component::<T>(entity);
        self.refresh();
        removed
    }

    /// # Panics
    ///
    /// Panics if the link would create a cycle; see [`World::set_parent`].
    pub fn set_parent(&mut self, child: Entity, parent: Entity) {
        self.world.set_parent(child, parent);
        self.refresh();
    }

    pub fn try_set_parent(&mut self, child: Entity, parent: Entity) -> Result<(), HierarchyError> {
        self.world.try_set_parent(child, parent)?;
        self.refresh();
        Ok(())
    }

    /// Deletes every entity, running the deregistration hooks.
    pub fn clear(&mut self) {
        self.world.clear();
        self.refresh();
    }

    pub fn run_frame(&mut self, frame: &FrameContext<'_>) -> FrameStats {
        self.scheduler.run_frame(&mut self.world, frame)
    }
}

impl Default for Ecs {
    fn default() -> Self {
        Self::new()
    }
}
