use std::any::Any;

use ember_core::resource::ResourceError;

use crate::hierarchy::HierarchyError;
use crate::resource::MissingResource;
use crate::signature::ComponentSignature;
use crate::state::{GameState, GameStateMask};
use crate::world::{ComponentNotRegistered, World};
use crate::Entity;

/// Per-frame values handed to every system update.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    /// Name of the scene being simulated.
    pub scene: &'a str,
    /// Seconds since the previous frame.
    pub delta_time: f32,
    pub state: GameState,
    /// Zero-based frame counter.
    pub frame_index: u64,
}

impl<'a> FrameContext<'a> {
    /// A running frame with index 0.
    pub fn new(scene: &'a str, delta_time: f32) -> Self {
        Self {
            scene,
            delta_time,
            state: GameState::Running,
            frame_index: 0,
        }
    }

    #[must_use]
    pub fn with_state(mut self, state: GameState) -> Self {
        self.state = state;
        self
    }

    #[must_use]
    pub fn with_frame_index(mut self, frame_index: u64) -> Self {
        self.frame_index = frame_index;
        self
    }
}

/// Error returned by [`System::update`]. Logged by the scheduler; the
/// frame continues with the next system.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Resource(#[from] MissingResource),
    #[error(transparent)]
    ComponentNotRegistered(#[from] ComponentNotRegistered),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
    #[error("resource load failed: {0}")]
    Load(#[from] ResourceError),
}

impl SystemError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// A set of component types a system requires, written as a tuple.
///
/// Implemented for `()` and tuples of up to eight component types.
pub trait ComponentSet: 'static {
    /// Registers every type in the set and returns their combined signature.
    fn register(world: &mut World) -> ComponentSignature;

    /// Type names, in tuple order.
    fn type_names() -> Vec<&'static str>;
}

impl ComponentSet for () {
    fn register(_world: &mut World) -> ComponentSignature {
        ComponentSignature::new()
    }

    fn type_names() -> Vec<&'static str> {
        Vec::new()
    }
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Send + Sync + 'static),+> ComponentSet for ($($name,)+) {
            fn register(world: &mut World) -> ComponentSignature {
                ComponentSignature::from_ids([$(world.register_component::<$name>()),+])
            }

            fn type_names() -> Vec<&'static str> {
                vec![$(std::any::type_name::<$name>()),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

/// A unit of per-frame behaviour over the entities holding
/// [`Required`](System::Required).
///
/// The [`Scheduler`](crate::Scheduler) keeps a membership list per system:
/// an entity joins when its signature covers the required set and leaves
/// when it stops covering it or is deleted. Each transition calls the
/// matching hook exactly once.
///
/// # Example
///
/// ```
/// use ember_ecs::{Entity, FrameContext, System, SystemError, World};
///
/// #[derive(Default)]
/// struct Velocity(f32);
/// #[derive(Default)]
/// struct Position(f32);
///
/// struct Movement;
///
/// impl System for Movement {
///     type Required = (Position, Velocity);
///
///     fn update(
///         &mut self,
///         world: &mut World,
///         entities: &[Entity],
///         frame: &FrameContext<'_>,
///     ) -> Result<(), SystemError> {
///         for &entity in entities {
///             let v = world.get_component::<Velocity>(entity).map_or(0.0, |v| v.0);
///             if let Some(p) = world.get_component_mut::<Position>(entity) {
///                 p.0 += v * frame.delta_time;
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait System: Send + 'static {
    /// Components an entity must hold to be processed.
    type Required: ComponentSet;

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// States this system runs in. Defaults to [`GameStateMask::RUNNING`].
    fn state_mask(&self) -> GameStateMask {
        GameStateMask::RUNNING
    }

    /// Called once when `entity` joins this system.
    fn on_register(&mut self, _world: &mut World, _entity: Entity) {}

    /// Called once when `entity` leaves this system. For deleted entities
    /// the components are already gone.
    fn on_deregister(&mut self, _world: &mut World, _entity: Entity) {}

    /// Processes the member entities, in membership order.
    ///
    /// `entities` is a snapshot taken before the call. Entities deleted
    /// while updating stay in the slice, so check
    /// [`World::is_alive`] before touching an entity another one may delete.
    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        frame: &FrameContext<'_>,
    ) -> Result<(), SystemError>;
}

/// Object-safe version of [`System`] used internally for type erasure.
///
/// A blanket implementation converts any `System` into an `ErasedSystem`.
pub(crate) trait ErasedSystem: Send {
    fn name(&self) -> &'static str;
    fn state_mask(&self) -> GameStateMask;
    fn on_register(&mut self, world: &mut World, entity: Entity);
    fn on_deregister(&mut self, world: &mut World, entity: Entity);
    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        frame: &FrameContext<'_>,
    ) -> Result<(), SystemError>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> ErasedSystem for S {
    fn name(&self) -> &'static str {
        System::name(self)
    }

    fn state_mask(&self) -> GameStateMask {
        System::state_mask(self)
    }

    fn on_register(&mut self, world: &mut World, entity: Entity) {
        System::on_register(self, world, entity);
    }

    fn on_deregister(&mut self, world: &mut World, entity: Entity) {
        System::on_deregister(self, world, entity);
    }

    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        System::update(self, world, entities, frame)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
