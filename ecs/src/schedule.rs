use std::any::TypeId;

use crate::signature::ComponentSignature;
use crate::sparse_set::SparseSet;
use crate::system::{ComponentSet, ErasedSystem, FrameContext, System};
use crate::world::{EntityChange, World};
use crate::Entity;

/// Number of refresh passes before hooks that keep mutating the world are
/// considered runaway.
const MAX_REFRESH_PASSES: usize = 64;

struct StoredSystem {
    system: Box<dyn ErasedSystem>,
    type_id: TypeId,
    type_name: &'static str,
    required: ComponentSignature,
    /// Member entities keyed by index. The dense data is the update order.
    members: SparseSet<Entity>,
}

impl StoredSystem {
    fn is_member(&self, entity: Entity) -> bool {
        self.members.get(entity.index()) == Some(&entity)
    }
}

/// Outcome of one [`Scheduler::run_frame`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Systems whose state mask allowed them to run.
    pub systems_run: usize,
    /// Systems that returned an error.
    pub errors: usize,
}

/// Ordered list of systems with per-system entity membership.
///
/// Systems run in registration order, one after another. Membership follows
/// the world's change log: [`refresh`](Scheduler::refresh) adds entities
/// whose signature now covers a system's required set and removes those that
/// no longer do, calling the system's hooks exactly once per transition.
///
/// # Example
///
/// ```ignore
/// let mut scheduler = Scheduler::new();
/// scheduler.add_system(&mut world, TransformSystem);
/// scheduler.add_system(&mut world, RenderCollectSystem::default());
///
/// let frame = FrameContext::new("main", 1.0 / 60.0);
/// scheduler.run_frame(&mut world, &frame);
/// ```
pub struct Scheduler {
    /// Registered systems, in registration order.
    systems: Vec<StoredSystem>,
    /// Reused buffer for the per-system entity snapshot.
    snapshot: Vec<Entity>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            snapshot: Vec::new(),
        }
    }

    /// Registers a system instance after all previously added ones.
    ///
    /// Registers the system's required component types and immediately
    /// matches every alive entity against them.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same type has already been registered.
    pub fn add_system<S: System>(&mut self, world: &mut World, system: S) {
        let type_id = TypeId::of::<S>();
        let type_name = std::any::type_name::<S>();
        if self.systems.iter().any(|s| s.type_id == type_id) {
            log::error!("duplicate system type: {type_name} is already registered");
            panic!("duplicate system type: {type_name} is already registered");
        }

        let required = S::Required::register(world);
        log::debug!(
            "registered system {} requiring {:?}",
            system.name(),
            S::Required::type_names()
        );
        self.systems.push(StoredSystem {
            system: Box::new(system),
            type_id,
            type_name,
            required,
            members: SparseSet::new(),
        });

        let index = self.systems.len() - 1;
        let alive: Vec<Entity> = world.iter_entities().collect();
        for entity in alive {
            self.sync_entity(index, world, entity);
        }
        self.refresh(world);
    }

    /// Applies the world's pending changes to every membership list.
    ///
    /// Hooks may mutate the world; their own changes are applied in follow-up
    /// passes until the change log is empty.
    pub fn refresh(&mut self, world: &mut World) {
        for _ in 0..MAX_REFRESH_PASSES {
            let changes = world.take_changes();
            if changes.is_empty() {
                return;
            }
            for change in changes {
                match change {
                    EntityChange::Updated(entity) => {
                        if !world.is_alive(entity) {
                            continue;
                        }
                        for index in 0..self.systems.len() {
                            self.sync_entity(index, world, entity);
                        }
                    }
                    EntityChange::Deleted(entity, _) => {
                        for index in 0..self.systems.len() {
                            self.leave(index, world, entity);
                        }
                    }
                }
            }
        }
        log::warn!(
            "membership refresh still had {} pending changes after {MAX_REFRESH_PASSES} passes",
            world.pending_changes().len()
        );
    }

    fn sync_entity(&mut self, index: usize, world: &mut World, entity: Entity) {
        let matches = world
            .signature(entity)
            .is_some_and(|signature| self.systems[index].required.is_subset_of(signature));
        let stored = &mut self.systems[index];
        let member = stored.is_member(entity);

        if matches && !member {
            stored.members.set(entity.index(), entity);
            log::trace!("{entity} joined {}", stored.type_name);
            stored.system.on_register(world, entity);
        } else if !matches && member {
            self.leave(index, world, entity);
        }
    }

    fn leave(&mut self, index: usize, world: &mut World, entity: Entity) {
        let stored = &mut self.systems[index];
        if !stored.is_member(entity) {
            return;
        }
        stored.members.remove(entity.index());
        log::trace!("{entity} left {}", stored.type_name);
        stored.system.on_deregister(world, entity);
    }

    /// Runs one frame.
    ///
    /// Systems run in registration order; those whose state mask excludes
    /// `frame.state` are skipped. Membership is refreshed before the first
    /// system and after each one, so later systems see the structural
    /// changes made by earlier ones. A system error is logged and the frame
    /// continues.
    pub fn run_frame(&mut self, world: &mut World, frame: &FrameContext<'_>) -> FrameStats {
        let mut stats = FrameStats::default();
        self.refresh(world);

        for index in 0..self.systems.len() {
            let stored = &mut self.systems[index];
            if !stored.system.state_mask().allows(frame.state) {
                continue;
            }

            self.snapshot.clear();
            self.snapshot.extend_from_slice(stored.members.data());
            stats.systems_run += 1;

            if let Err(err) = stored.system.update(world, &self.snapshot, frame) {
                stats.errors += 1;
                log::error!(
                    "system {} failed in frame {}: {err}",
                    stored.system.name(),
                    frame.frame_index
                );
            }

            self.refresh(world);
        }
        stats
    }

    /// Member entities of system `S`, in update order.
    pub fn members<S: System>(&self) -> Option<&[Entity]> {
        self.find::<S>().map(|stored| stored.members.data())
    }

    /// The registered instance of `S`.
    pub fn system<S: System>(&self) -> Option<&S> {
        self.find::<S>()?.system.as_any().downcast_ref::<S>()
    }

    pub fn system_mut<S: System>(&mut self) -> Option<&mut S> {
        let type_id = TypeId::of::<S>();
        self.systems
            .iter_mut()
            .find(|s| s.type_id == type_id)?
            .system
            .as_any_mut()
            .downcast_mut::<S>()
    }

    fn find<S: System>(&self) -> Option<&StoredSystem> {
        let type_id = TypeId::of::<S>();
        self.systems.iter().find(|s| s.type_id == type_id)
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// System names in registration order.
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
