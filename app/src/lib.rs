//! # Ember App
//!
//! Application layer of the Ember engine core.
//!
//! - [`AppContext`]: owns the configuration, the resource cache and the
//!   ECS; drives the play / pause / stop lifecycle and the frame loop
//! - [`EngineConfig`]: RON configuration
//! - [`AppArgs`]: command line of the `ember` binary
//! - [`DefaultScene`]: scene spawned by the binary
//!
//! ## Example
//!
//! ```no_run
//! use ember_app::{AppContext, DefaultScene, EngineConfig, NullPhysics};
//!
//! let mut ctx = AppContext::new(EngineConfig::default());
//! ctx.install_default_systems(NullPhysics);
//! ctx.set_scene_builder(DefaultScene::new(Some("walk".into()), None).into_builder())
//!     .unwrap();
//! ctx.play();
//! let summary = ctx.run(Some(60), true);
//! println!("{} frames", summary.frames);
//! ```

mod args;
mod config;
mod context;
mod error;
mod scene;

pub use args::AppArgs;
pub use config::EngineConfig;
pub use context::{AppContext, NullPhysics, RunSummary, SceneBuilder};
pub use error::AppError;
pub use scene::DefaultScene;

/// App library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
