//! Contract between the ECS and a physics collaborator.
//!
//! A [`PhysicsBackend`] simulates the entities holding a
//! [`Transform`] and a [`Collider`] and reports contacts as
//! [`CollisionEvent`]s keyed by entity pair. The
//! [`PhysicsSystem`](crate::systems::PhysicsSystem) publishes them through
//! `Events<CollisionEvent>` and calls the [`CollisionCallbacks`] of both
//! entities synchronously during its update.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::components::{Collider, Transform};
use crate::{Entity, World};

/// Contact lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollisionPhase {
    Enter,
    Stay,
    Exit,
}

/// Solid contact or trigger overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollisionKind {
    Collision,
    Trigger,
}

/// One contact between two entities during one physics step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollisionEvent {
    pub phase: CollisionPhase,
    pub kind: CollisionKind,
    pub a: Entity,
    pub b: Entity,
}

impl CollisionEvent {
    pub fn new(phase: CollisionPhase, kind: CollisionKind, a: Entity, b: Entity) -> Self {
        Self { phase, kind, a, b }
    }

    pub fn involves(&self, entity: Entity) -> bool {
        self.a == entity || self.b == entity
    }

    /// The entity on the other side of the contact from `entity`.
    pub fn other(&self, entity: Entity) -> Option<Entity> {
        if self.a == entity {
            Some(self.b)
        } else if self.b == entity {
            Some(self.a)
        } else {
            None
        }
    }
}

/// Physics simulation supplied by the host application.
pub trait PhysicsBackend: Send {
    /// Advances the simulation by `delta_time` seconds over `bodies`, writing
    /// results back to their transforms, and returns this step's contacts.
    fn step(&mut self, world: &mut World, bodies: &[Entity], delta_time: f32)
    -> Vec<CollisionEvent>;

    /// A body joined the simulation.
    fn body_added(&mut self, _world: &mut World, _entity: Entity) {}

    /// A body left the simulation. The entity may already be deleted.
    fn body_removed(&mut self, _entity: Entity) {}
}

/// Shared collision handler: receives the world, the entity owning the
/// callback and the event.
pub type CollisionHandler = Arc<dyn Fn(&mut World, Entity, &CollisionEvent) + Send + Sync>;

#[derive(Clone)]
struct Subscription {
    kind: Option<CollisionKind>,
    phase: Option<CollisionPhase>,
    handler: CollisionHandler,
}

/// Per-entity collision subscriptions.
#[derive(Clone, Default, crate::Component)]
pub struct CollisionCallbacks {
    #[reflect(skip)]
    subscriptions: Vec<Subscription>,
}

impl CollisionCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to one kind and phase, e.g. trigger enter.
    #[must_use]
    pub fn on(
        mut self,
        kind: CollisionKind,
        phase: CollisionPhase,
        handler: impl Fn(&mut World, Entity, &CollisionEvent) + Send + Sync + 'static,
    ) -> Self {
        self.subscriptions.push(Subscription {
            kind: Some(kind),
            phase: Some(phase),
            handler: Arc::new(handler),
        });
        self
    }

    /// Subscribes to every event involving the entity.
    #[must_use]
    pub fn on_any(
        mut self,
        handler: impl Fn(&mut World, Entity, &CollisionEvent) + Send + Sync + 'static,
    ) -> Self {
        self.subscriptions.push(Subscription {
            kind: None,
            phase: None,
            handler: Arc::new(handler),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Handlers interested in `event`.
    pub fn matching(&self, event: &CollisionEvent) -> Vec<CollisionHandler> {
        self.subscriptions
            .iter()
            .filter(|s| s.kind.is_none_or(|k| k == event.kind))
            .filter(|s| s.phase.is_none_or(|p| p == event.phase))
            .map(|s| Arc::clone(&s.handler))
            .collect()
    }
}

impl std::fmt::Debug for CollisionCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollisionCallbacks")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

/// Calls the handlers of both entities of every event.
pub fn dispatch_collision_callbacks(world: &mut World, events: &[CollisionEvent]) {
    for event in events {
        for entity in [event.a, event.b] {
            let handlers = match world.get_component::<CollisionCallbacks>(entity) {
                Some(callbacks) => callbacks.matching(event),
                None => continue,
            };
            for handler in handlers {
                handler(world, entity, event);
            }
        }
    }
}

/// Overlap-only backend comparing bounding spheres of world positions.
///
/// No dynamics: transforms are left untouched. Pairs are tracked across
/// steps to report enter, stay and exit.
#[derive(Debug, Default)]
pub struct OverlapPhysics {
    contacts: BTreeSet<(Entity, Entity, CollisionKind)>,
}

impl OverlapPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs currently in contact.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}

impl PhysicsBackend for OverlapPhysics {
    fn step(
        &mut self,
        world: &mut World,
        bodies: &[Entity],
        _delta_time: f32,
    ) -> Vec<CollisionEvent> {
        let shapes: Vec<_> = bodies
            .iter()
            .filter_map(|&e| {
                let transform = world.get_component::<Transform>(e)?;
                let collider = world.get_component::<Collider>(e)?;
                let scale = transform.world.scale.max();
                Some((e, transform.world.position, collider.clone(), scale))
            })
            .collect();

        let mut current = BTreeSet::new();
        for (i, (a, pa, ca, sa)) in shapes.iter().enumerate() {
            for (b, pb, cb, sb) in &shapes[i + 1..] {
                if !ca.interacts_with(cb) {
                    continue;
                }
                let reach = ca.shape.bounding_radius() * sa + cb.shape.bounding_radius() * sb;
                if (pa - pb).norm_squared() <= reach * reach {
                    let kind = if ca.is_trigger || cb.is_trigger {
                        CollisionKind::Trigger
                    } else {
                        CollisionKind::Collision
                    };
                    let (a, b) = if a < b { (*a, *b) } else { (*b, *a) };
                    current.insert((a, b, kind));
                }
            }
        }

        let mut events = Vec::new();
        for &(a, b, kind) in &current {
            let phase = if self.contacts.contains(&(a, b, kind)) {
                CollisionPhase::Stay
            } else {
                CollisionPhase::Enter
            };
            events.push(CollisionEvent::new(phase, kind, a, b));
        }
        for &(a, b, kind) in self.contacts.difference(&current) {
            events.push(CollisionEvent::new(CollisionPhase::Exit, kind, a, b));
        }
        self.contacts = current;
        events
    }

    fn body_removed(&mut self, entity: Entity) {
        self.contacts.retain(|&(a, b, _)| a != entity && b != entity);
    }
}
