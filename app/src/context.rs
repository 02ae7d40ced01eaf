//! Explicit application context and the headless frame loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ember_core::resource::ResourceCache;
use ember_ecs::physics::{CollisionEvent, PhysicsBackend};
use ember_ecs::systems::{
    AnimationSystem, PhysicsSystem, RenderCollectSystem, ScriptSystem, TransformSystem,
};
use ember_ecs::{Ecs, Entity, FrameContext, FrameStats, GameState, World};

use crate::{AppError, EngineConfig};

/// Populates the world when the scene is (re)built.
pub type SceneBuilder = Box<dyn FnMut(&mut AppContext) -> Result<(), AppError>>;

/// Physics backend that simulates nothing and reports no contacts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPhysics;

impl PhysicsBackend for NullPhysics {
    fn step(&mut self, _world: &mut World, _bodies: &[Entity], _dt: f32) -> Vec<CollisionEvent> {
        Vec::new()
    }
}

/// Totals of a [`AppContext::run`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub system_errors: usize,
    pub elapsed: Duration,
}

/// Everything the engine needs, created once at startup and passed around
/// explicitly.
///
/// # Example
///
/// ```no_run
/// use ember_app::{AppContext, EngineConfig, NullPhysics};
///
/// let mut ctx = AppContext::new(EngineConfig::default());
/// ctx.install_default_systems(NullPhysics);
/// ctx.play();
/// ctx.tick(1.0 / 60.0);
/// ctx.shutdown();
/// ```
pub struct AppContext {
    config: EngineConfig,
    cache: Arc<ResourceCache>,
    ecs: Ecs,
    state: GameState,
    frame_index: u64,
    scene_builder: Option<SceneBuilder>,
}

impl AppContext {
    /// Creates a context reading resources from `config.asset_directory`.
    pub fn new(config: EngineConfig) -> Self {
        let cache = Arc::new(ResourceCache::new(config.asset_directory.clone()));
        Self::with_cache(config, cache)
    }

    /// Creates a context around an existing resource cache.
    pub fn with_cache(config: EngineConfig, cache: Arc<ResourceCache>) -> Self {
        log::info!(
            "ember v{} context created (scene `{}`)",
            crate::VERSION,
            config.scene_name
        );
        Self {
            config,
            cache,
            ecs: Ecs::new(),
            state: GameState::Stopped,
            frame_index: 0,
            scene_builder: None,
        }
    }

    /// Registers the built-in systems in frame order: transforms, physics,
    /// scripts, animation, render collection.
    pub fn install_default_systems(&mut self, physics: impl PhysicsBackend + 'static) {
        self.ecs.world_mut().add_event::<CollisionEvent>();
        self.ecs.add_system(TransformSystem);
        self.ecs.add_system(PhysicsSystem::new(physics));
        self.ecs.add_system(ScriptSystem::new());
        self.ecs.add_system(AnimationSystem::new(Arc::clone(&self.cache)));
        self.ecs.add_system(RenderCollectSystem);
        log::debug!("systems: {:?}", self.ecs.scheduler().system_names());
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    pub fn ecs(&self) -> &Ecs {
        &self.ecs
    }

    pub fn ecs_mut(&mut self) -> &mut Ecs {
        &mut self.ecs
    }

    pub fn world(&self) -> &World {
        self.ecs.world()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Frames ticked so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn scene_name(&self) -> &str {
        &self.config.scene_name
    }

    /// Installs the scene builder and builds the scene once.
    pub fn set_scene_builder(
        &mut self,
        builder: impl FnMut(&mut AppContext) -> Result<(), AppError> + 'static,
    ) -> Result<(), AppError> {
        self.scene_builder = Some(Box::new(builder));
        self.build_scene()
    }

    fn build_scene(&mut self) -> Result<(), AppError> {
        let Some(mut builder) = self.scene_builder.take() else {
            return Ok(());
        };
        let result = builder(self);
        self.scene_builder = Some(builder);
        self.ecs.refresh();
        match &result {
            Ok(()) => log::info!(
                "scene `{}` built with {} entities",
                self.config.scene_name,
                self.world().entity_count()
            ),
            Err(err) => log::error!("scene `{}` failed to build: {err}", self.config.scene_name),
        }
        result
    }

    pub fn play(&mut self) {
        if self.state != GameState::Running {
            log::info!("{} -> {}", self.state, GameState::Running);
            self.state = GameState::Running;
        }
    }

    /// Pauses a running game; has no effect otherwise.
    pub fn pause(&mut self) {
        if self.state == GameState::Running {
            log::info!("{} -> {}", self.state, GameState::Paused);
            self.state = GameState::Paused;
        }
    }

    /// Deletes every entity, drops pending events and rebuilds the scene
    /// from the builder. The context is left stopped.
    pub fn stop(&mut self) -> Result<(), AppError> {
        log::info!("{} -> {}", self.state, GameState::Stopped);
        self.state = GameState::Stopped;
        self.ecs.clear();
        self.ecs.world_mut().clear_events();
        self.build_scene()
    }

    /// Runs one frame of `delta_time` seconds in the current state.
    pub fn tick(&mut self, delta_time: f32) -> FrameStats {
        let frame = FrameContext::new(&self.config.scene_name, delta_time)
            .with_state(self.state)
            .with_frame_index(self.frame_index);
        let stats = self.ecs.run_frame(&frame);
        self.ecs.world_mut().update_events();
        self.frame_index += 1;

        let interval = self.config.gc_interval_frames;
        if interval > 0 && self.frame_index % interval == 0 {
            let evicted = self.cache.collect_garbage();
            if evicted > 0 {
                log::debug!("frame {}: evicted {evicted} resources", self.frame_index);
            }
        }
        stats
    }

    /// Ticks at `config.target_fps` with a fixed time step until `frames`
    /// frames ran, or forever when `frames` is `None`. Sleeps between
    /// frames when `paced`.
    pub fn run(&mut self, frames: Option<u64>, paced: bool) -> RunSummary {
        let frame_time = self.config.frame_time();
        let budget = Duration::from_secs_f32(frame_time);
        let started = Instant::now();
        let mut summary = RunSummary::default();

        while frames.is_none_or(|limit| summary.frames < limit) {
            let frame_start = Instant::now();
            let stats = self.tick(frame_time);
            summary.frames += 1;
            summary.system_errors += stats.errors;

            if paced && let Some(rest) = budget.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(rest);
            }
        }
        summary.elapsed = started.elapsed();
        summary
    }

    /// Deletes every entity and empties the resource cache.
    pub fn shutdown(&mut self) {
        self.state = GameState::Stopped;
        self.ecs.clear();
        self.cache.clear();
        log::info!("shut down after {} frames", self.frame_index);
    }
}
