//! Built-in systems.
//!
//! The application registers them in this order, which is also the order
//! they run in each frame:
//!
//! 1. [`TransformSystem`]: world transforms from the hierarchy
//! 2. [`PhysicsSystem`]: backend step and collision dispatch
//! 3. [`ScriptSystem`]: gameplay scripts
//! 4. [`AnimationSystem`]: bone palettes of animated entities
//! 5. [`RenderCollectSystem`]: render queues for the frame

mod animation;
mod physics;
mod render_collect;
mod scripting;
mod transform;

pub use animation::AnimationSystem;
pub use physics::PhysicsSystem;
pub use render_collect::RenderCollectSystem;
pub use scripting::ScriptSystem;
pub use transform::TransformSystem;
