use crate::components::{Collider, Transform};
use crate::events::Events;
use crate::physics::{CollisionEvent, PhysicsBackend, dispatch_collision_callbacks};
use crate::system::{FrameContext, System, SystemError};
use crate::{Entity, World};

/// Steps a [`PhysicsBackend`] over every entity with a `Transform` and a
/// `Collider`.
///
/// The contacts of each step are appended to `Events<CollisionEvent>`
/// (added on first use) and delivered to the `CollisionCallbacks` of both
/// entities before the system returns.
pub struct PhysicsSystem {
    backend: Box<dyn PhysicsBackend>,
    steps: u64,
}

impl PhysicsSystem {
    pub fn new(backend: impl PhysicsBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            steps: 0,
        }
    }

    pub fn backend(&self) -> &dyn PhysicsBackend {
        self.backend.as_ref()
    }

    /// Number of completed simulation steps.
    pub fn step_count(&self) -> u64 {
        self.steps
    }
}

impl System for PhysicsSystem {
    type Required = (Transform, Collider);

    fn on_register(&mut self, world: &mut World, entity: Entity) {
        self.backend.body_added(world, entity);
    }

    fn on_deregister(&mut self, _world: &mut World, entity: Entity) {
        self.backend.body_removed(entity);
    }

    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        let events = self.backend.step(world, entities, frame.delta_time);
        self.steps += 1;

        if !world.has_resource::<Events<CollisionEvent>>() {
            world.add_event::<CollisionEvent>();
        }
        if !events.is_empty() {
            log::trace!("physics step {} produced {} contacts", self.steps, events.len());
            world
                .try_resource_mut::<Events<CollisionEvent>>()?
                .send_batch(events.iter().copied());
            dispatch_collision_callbacks(world, &events);
        }
        Ok(())
    }
}
