//! # Ember ECS
//!
//! Entity-Component-System with sparse-set storage and signature-based
//! system membership.
//!
//! ## Core Types
//!
//! - [`Entity`]: generational entity handle
//! - [`World`]: entities, component storages, hierarchy, resources and the
//!   structural change log
//! - [`SparseSet`]: dense storage keyed by entity index
//! - [`ComponentSignature`]: bitset of the component types an entity holds
//! - [`Component`] / [`Reflect`]: derive-built field access by name
//!
//! ## Systems
//!
//! - [`System`]: per-frame behaviour over the entities holding its
//!   `Required` components
//! - [`Scheduler`]: registration-ordered dispatch and membership tracking
//! - [`Ecs`]: world and scheduler together, refreshing membership on every
//!   structural change
//!
//! ## Collaborator contracts
//!
//! - [`physics`]: [`PhysicsBackend`] and collision events
//! - [`script`]: [`Script`] lifecycle
//! - [`render`]: value records in [`RenderQueues`]
//!
//! # Example
//!
//! ```
//! use ember_ecs::components::Transform;
//! use ember_ecs::systems::TransformSystem;
//! use ember_ecs::{Ecs, FrameContext};
//!
//! let mut ecs = Ecs::new();
//! ecs.add_system(TransformSystem);
//!
//! let parent = ecs.create_entity("main");
//! ecs.insert(parent, Transform::default()).unwrap();
//! let child = ecs.create_entity("main");
//! ecs.insert(child, Transform::default()).unwrap();
//! ecs.set_parent(child, parent);
//!
//! ecs.run_frame(&FrameContext::new("main", 1.0 / 60.0));
//! ```

extern crate self as ember_ecs;

mod component;
pub mod components;
mod ecs;
mod entity;
mod events;
mod hierarchy;
pub mod physics;
pub mod render;
mod resource;
mod schedule;
pub mod script;
mod signature;
mod sparse_set;
mod state;
mod system;
pub mod systems;
mod world;

pub use component::{Component, FieldInfo, FieldKind, Reflect};
pub use ecs::Ecs;
pub use ecs_macro::Component;
pub use entity::Entity;
pub use events::Events;
pub use hierarchy::{Hierarchy, HierarchyError};
pub use physics::{CollisionEvent, PhysicsBackend};
pub use render::RenderQueues;
pub use resource::MissingResource;
pub use schedule::{FrameStats, Scheduler};
pub use script::{Script, ScriptContext, ScriptError, Scripts};
pub use signature::{ComponentId, ComponentSignature, MAX_COMPONENTS};
pub use sparse_set::SparseSet;
pub use state::{GameState, GameStateMask};
pub use system::{ComponentSet, FrameContext, System, SystemError};
pub use world::{ComponentNotRegistered, EntityChange, SignatureFull, World};
