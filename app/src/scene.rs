//! Scene built by the `ember` binary.

use ember_core::math::{Vec3, quat_from_rotation_y};
use ember_ecs::components::{
    Animator, Camera, Light, MeshRenderer, Name, Transform, Transformation,
};

use crate::{AppContext, AppError};

/// A camera, a sun and, when an animation is given, an animated entity.
#[derive(Debug, Clone, Default)]
pub struct DefaultScene {
    /// Animation GUID to play.
    pub animation: Option<String>,
    /// Skinned mesh GUID drawn by the animated entity.
    pub mesh: Option<String>,
}

impl DefaultScene {
    pub fn new(animation: Option<String>, mesh: Option<String>) -> Self {
        Self { animation, mesh }
    }

    pub fn build(&self, ctx: &mut AppContext) -> Result<(), AppError> {
        let scene = ctx.scene_name().to_owned();
        let speed = ctx.config().playback_speed;
        let ecs = ctx.ecs_mut();

        let camera = ecs.create_entity(&scene);
        ecs.insert(camera, Name::new("Camera"))?;
        ecs.insert(camera, Transform::from_position(Vec3::new(0.0, 1.5, 6.0)))?;
        ecs.insert(camera, Camera::default())?;

        let sun = ecs.create_entity(&scene);
        ecs.insert(sun, Name::new("Sun"))?;
        ecs.insert(
            sun,
            Transform::new(
                Transformation::identity().with_rotation(quat_from_rotation_y(0.8)),
            ),
        )?;
        ecs.insert(sun, Light::default())?;

        if let Some(animation) = &self.animation {
            let actor = ecs.create_entity(&scene);
            ecs.insert(actor, Name::new(animation.clone()))?;
            ecs.insert(actor, Transform::default())?;
            ecs.insert(actor, Animator::new(animation.clone()).with_speed(speed))?;
            if let Some(mesh) = &self.mesh {
                ecs.insert(actor, MeshRenderer::new(mesh.clone()))?;
            }
        }
        Ok(())
    }

    /// The scene as a builder for [`AppContext::set_scene_builder`].
    pub fn into_builder(self) -> impl FnMut(&mut AppContext) -> Result<(), AppError> + 'static {
        move |ctx| self.build(ctx)
    }
}
