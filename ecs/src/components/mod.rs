//! Built-in component types.

mod animator;
mod camera;
mod collider;
mod light;
mod mesh_renderer;
mod name;
mod transform;

pub use animator::Animator;
pub use camera::Camera;
pub use collider::{Collider, ColliderShape};
pub use light::{Light, LightKind};
pub use mesh_renderer::MeshRenderer;
pub use name::Name;
pub use transform::{Transform, Transformation};

use crate::World;
use crate::physics::CollisionCallbacks;
use crate::script::Scripts;

/// Registers every built-in component with reflection and default
/// construction by name.
pub fn register_builtin_components(world: &mut World) {
    world.register_reflected_default::<Transform>();
    world.register_reflected_default::<Name>();
    world.register_reflected_default::<Light>();
    world.register_reflected_default::<Camera>();
    world.register_reflected_default::<MeshRenderer>();
    world.register_reflected_default::<Animator>();
    world.register_reflected_default::<Scripts>();
    world.register_reflected_default::<Collider>();
    world.register_reflected_default::<CollisionCallbacks>();
}
