use std::sync::Arc;

use ember_core::animation::Animation;
use ember_core::mesh::SkinnedMesh;
use ember_core::resource::ResourceCache;

use crate::components::{Animator, MeshRenderer, Transform};
use crate::system::{FrameContext, System, SystemError};
use crate::{Entity, World};

/// Plays the clip of every [`Animator`] and refreshes its bone palette.
///
/// Clips come from the shared [`ResourceCache`] the first time an animator
/// is updated. When the entity also has a [`MeshRenderer`], the mesh is
/// loaded as a [`SkinnedMesh`] and its bone table maps nodes to palette
/// slots; otherwise the clip's own bone ids are used. Entities with a hidden
/// renderer are skipped.
pub struct AnimationSystem {
    cache: Arc<ResourceCache>,
}

impl AnimationSystem {
    /// Registers the animation and mesh resource types on `cache`.
    pub fn new(cache: Arc<ResourceCache>) -> Self {
        cache.register::<Animation>();
        cache.register::<SkinnedMesh>();
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    fn resolve(&self, entity: Entity, animator: &mut Animator, mesh: Option<&str>) {
        if animator.drop_stale_clip() {
            log::debug!("{entity} switches to animation {}", animator.animation);
        }
        if animator.is_resolved()
            || animator.animation.is_empty()
            || animator.failed.as_deref() == Some(animator.animation.as_str())
        {
            return;
        }

        match self.cache.get::<Animation>(&animator.animation) {
            Ok(clip) => {
                log::debug!("{entity} plays animation {}", animator.animation);
                animator.set_clip(clip);
            }
            Err(err) => {
                log::error!(
                    "{entity} cannot play animation {}: {err}",
                    animator.animation
                );
                animator.failed = Some(animator.animation.clone());
                return;
            }
        }

        animator.skin = match mesh.filter(|guid| !guid.is_empty()) {
            Some(guid) => match self.cache.get::<SkinnedMesh>(guid) {
                Ok(skin) => Some(skin),
                Err(err) => {
                    log::warn!("{entity} animates without mesh bone table {guid}: {err}");
                    None
                }
            },
            None => None,
        };
    }
}

impl System for AnimationSystem {
    type Required = (Transform, Animator);

    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        for &entity in entities {
            let renderer = world.get_component::<MeshRenderer>(entity);
            if renderer.is_some_and(|r| !r.visible) {
                continue;
            }
            let mesh = renderer.map(|r| r.mesh.clone());

            let Some(animator) = world.get_component_mut::<Animator>(entity) else {
                continue;
            };
            self.resolve(entity, animator, mesh.as_deref());
            if !animator.playing {
                continue;
            }
            let Some(clip) = animator.clip.clone() else {
                continue;
            };
            let bone_info = animator.skin.as_ref().map(|skin| &skin.bone_info);
            animator
                .evaluator
                .update(&clip, frame.delta_time, animator.playback_speed, bone_info);
        }
        Ok(())
    }
}
