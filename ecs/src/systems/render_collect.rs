use crate::components::{Animator, Camera, Light, MeshRenderer, Transform};
use crate::render::{CameraData, DrawCommand, LightData, RenderQueues, SkinData};
use crate::state::GameStateMask;
use crate::system::{FrameContext, System, SystemError};
use crate::{Entity, World};

/// Refills the [`RenderQueues`] resource from every transformed entity.
///
/// Runs in every game state so a paused or stopped scene still renders.
/// Register it last so the queues see this frame's transforms and poses.
#[derive(Debug, Default)]
pub struct RenderCollectSystem;

impl RenderCollectSystem {
    fn collect(world: &World, entity: Entity, queues: &mut RenderQueues) {
        let Some(transform) = world.get_component::<Transform>(entity) else {
            return;
        };

        if let Some(renderer) = world.get_component::<MeshRenderer>(entity)
            && renderer.visible
        {
            let skin = world
                .get_component::<Animator>(entity)
                .filter(|animator| animator.is_resolved())
                .map(|animator| {
                    queues.skins.push(SkinData {
                        entity,
                        bone_matrices: animator.final_bone_matrices().to_vec(),
                    });
                    queues.skins.len() - 1
                });
            queues.draws.push(DrawCommand {
                entity,
                mesh: renderer.mesh.clone(),
                material: renderer.material.clone(),
                world_matrix: transform.world_matrix,
                cast_shadows: renderer.cast_shadows,
                skin,
            });
        }

        if let Some(light) = world.get_component::<Light>(entity) {
            queues.lights.push(LightData {
                entity,
                kind: light.kind,
                position: transform.world.position,
                direction: transform.world.forward(),
                radiance: light.radiance(),
                range: light.range,
                cast_shadows: light.cast_shadows,
            });
        }

        if let Some(camera) = world.get_component::<Camera>(entity) {
            queues.cameras.push(CameraData {
                entity,
                view: Camera::view_matrix(&transform.world_matrix),
                projection: camera.projection_matrix(),
                position: transform.world.position,
                primary: camera.primary,
            });
        }
    }
}

impl System for RenderCollectSystem {
    type Required = (Transform,);

    fn state_mask(&self) -> GameStateMask {
        GameStateMask::ALL
    }

    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        _frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        let mut queues = world.remove_resource::<RenderQueues>().unwrap_or_default();
        queues.clear();
        for &entity in entities {
            Self::collect(world, entity, &mut queues);
        }
        world.insert_resource(queues);
        Ok(())
    }
}
