//! Gameplay script contract.
//!
//! Scripts are attached to entities through the [`Scripts`] component and
//! driven by [`ScriptSystem`](crate::systems::ScriptSystem): `start` runs
//! lazily before the first `update`, then `update` runs every frame the
//! entity is scheduled. A failing script only loses its own frame.

use std::any::Any;

use crate::hierarchy::HierarchyError;
use crate::resource::MissingResource;
use crate::system::FrameContext;
use crate::world::ComponentNotRegistered;
use crate::{Entity, World};

/// Error returned by a script's `start` or `update`.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("{0}")]
    Message(String),
    #[error("script panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    Resource(#[from] MissingResource),
    #[error(transparent)]
    ComponentNotRegistered(#[from] ComponentNotRegistered),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

impl ScriptError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Converts a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked(message)
    }
}

/// What a script sees while running.
pub struct ScriptContext<'a> {
    pub world: &'a mut World,
    /// The entity owning the script.
    pub entity: Entity,
    pub frame: FrameContext<'a>,
}

impl ScriptContext<'_> {
    pub fn delta_time(&self) -> f32 {
        self.frame.delta_time
    }

    /// Component of the owning entity.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.world.get_component::<T>(self.entity)
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.world.get_component_mut::<T>(self.entity)
    }
}

/// Behaviour attached to an entity.
pub trait Script: Send + Sync + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once, before the first `update`. A failed start is retried
    /// next frame.
    fn start(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        Ok(())
    }

    fn update(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError>;
}

/// A script and its lifecycle flags.
pub struct ScriptSlot {
    pub(crate) script: Box<dyn Script>,
    pub(crate) started: bool,
    /// Frame in which the script last failed.
    pub(crate) faulted_frame: Option<u64>,
}

impl ScriptSlot {
    pub fn name(&self) -> &str {
        self.script.name()
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn faulted_frame(&self) -> Option<u64> {
        self.faulted_frame
    }

    /// Runs `start` if needed, then `update`, containing errors and panics.
    pub(crate) fn run(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        if self.faulted_frame == Some(ctx.frame.frame_index) {
            return Ok(());
        }
        let result = self.invoke(ctx);
        if result.is_err() {
            self.faulted_frame = Some(ctx.frame.frame_index);
        }
        result
    }

    fn invoke(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        let script = &mut self.script;
        let started = &mut self.started;
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            if !*started {
                script.start(ctx)?;
                *started = true;
            }
            script.update(ctx)
        }));
        outcome.unwrap_or_else(|payload| Err(ScriptError::from_panic(payload)))
    }
}

impl std::fmt::Debug for ScriptSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptSlot")
            .field("name", &self.name())
            .field("started", &self.started)
            .field("faulted_frame", &self.faulted_frame)
            .finish()
    }
}

/// Ordered scripts of one entity.
#[derive(Debug, Default, crate::Component)]
pub struct Scripts {
    #[reflect(skip)]
    pub(crate) slots: Vec<ScriptSlot>,
}

impl Scripts {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, script: impl Script) -> Self {
        self.push(script);
        self
    }

    pub fn push(&mut self, script: impl Script) {
        self.slots.push(ScriptSlot {
            script: Box::new(script),
            started: false,
            faulted_frame: None,
        });
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[ScriptSlot] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Calls {
        starts: AtomicU32,
        updates: AtomicU32,
    }

    struct Counter {
        calls: Arc<Calls>,
        fail_start_once: bool,
    }

    impl Counter {
        fn new(fail_start_once: bool) -> (Self, Arc<Calls>) {
            let calls = Arc::new(Calls::default());
            let script = Self {
                calls: Arc::clone(&calls),
                fail_start_once,
            };
            (script, calls)
        }
    }

    impl Script for Counter {
        fn start(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
            self.calls.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start_once {
                self.fail_start_once = false;
                return Err(ScriptError::msg("not ready"));
            }
            Ok(())
        }

        fn update(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
            self.calls.updates.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Panicky;

    impl Script for Panicky {
        fn update(&mut self, _ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
            panic!("kaboom");
        }
    }

    fn slot(script: impl Script) -> ScriptSlot {
        let mut scripts = Scripts::new().with(script);
        scripts.slots.remove(0)
    }

    #[test]
    fn start_runs_once_before_update() {
        let mut world = World::new();
        let entity = world.create_entity("s");
        let (script, calls) = Counter::new(false);
        let mut slot = slot(script);

        for frame_index in 0..3 {
            let frame = FrameContext::new("s", 0.1).with_frame_index(frame_index);
            let mut ctx = ScriptContext {
                world: &mut world,
                entity,
                frame,
            };
            slot.run(&mut ctx).unwrap();
        }
        assert!(slot.is_started());
        assert_eq!(calls.starts.load(Ordering::SeqCst), 1);
        assert_eq!(calls.updates.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn failed_start_is_retried_next_frame() {
        let mut world = World::new();
        let entity = world.create_entity("s");
        let (script, calls) = Counter::new(true);
        let mut slot = slot(script);

        let mut ctx = ScriptContext {
            world: &mut world,
            entity,
            frame: FrameContext::new("s", 0.1),
        };
        assert!(slot.run(&mut ctx).is_err());
        assert!(!slot.is_started());
        assert_eq!(slot.faulted_frame(), Some(0));

        // Faulted for the rest of the frame.
        assert!(slot.run(&mut ctx).is_ok());
        assert_eq!(calls.starts.load(Ordering::SeqCst), 1);

        ctx.frame = ctx.frame.with_frame_index(1);
        slot.run(&mut ctx).unwrap();
        assert!(slot.is_started());
        assert_eq!(calls.starts.load(Ordering::SeqCst), 2);
        assert_eq!(calls.updates.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panics_become_errors() {
        let mut world = World::new();
        let entity = world.create_entity("s");
        let mut slot = slot(Panicky);
        let mut ctx = ScriptContext {
            world: &mut world,
            entity,
            frame: FrameContext::new("s", 0.1),
        };

        let err = slot.run(&mut ctx).unwrap_err();
        assert!(matches!(err, ScriptError::Panicked(ref m) if m == "kaboom"));
        assert!(slot.name().ends_with("Panicky"));
    }

    #[test]
    fn context_reads_owner_components() {
        let mut world = World::new();
        world.register_component::<u32>();
        let entity = world.create_entity("s");
        world.insert(entity, 7u32).unwrap();

        let mut ctx = ScriptContext {
            world: &mut world,
            entity,
            frame: FrameContext::new("s", 0.25),
        };
        assert_eq!(ctx.get::<u32>(), Some(&7));
        *ctx.get_mut::<u32>().unwrap() += 1;
        assert_eq!(ctx.delta_time(), 0.25);
        assert_eq!(world.get_component::<u32>(entity), Some(&8));
    }
}
