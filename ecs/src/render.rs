//! Per-frame records handed to the rendering collaborator.
//!
//! [`RenderCollectSystem`](crate::systems::RenderCollectSystem) refills
//! [`RenderQueues`] every frame with plain value structs. Nothing here
//! talks to a graphics API.

use ember_core::math::{Mat4, Vec3};

use crate::Entity;
use crate::components::LightKind;

/// One mesh to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub entity: Entity,
    /// GUID of the mesh resource.
    pub mesh: String,
    pub material: String,
    pub world_matrix: Mat4,
    pub cast_shadows: bool,
    /// Index into [`RenderQueues::skins`] for skinned draws.
    pub skin: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightData {
    pub entity: Entity,
    pub kind: LightKind,
    pub position: Vec3,
    pub direction: Vec3,
    /// Color premultiplied by intensity.
    pub radiance: Vec3,
    pub range: f32,
    pub cast_shadows: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraData {
    pub entity: Entity,
    pub view: Mat4,
    pub projection: Mat4,
    pub position: Vec3,
    pub primary: bool,
}

/// Skinning palette of one animated entity.
#[derive(Debug, Clone, PartialEq)]
pub struct SkinData {
    pub entity: Entity,
    pub bone_matrices: Vec<Mat4>,
}

/// Render queues stored as a world resource.
#[derive(Debug, Default)]
pub struct RenderQueues {
    pub draws: Vec<DrawCommand>,
    pub lights: Vec<LightData>,
    pub cameras: Vec<CameraData>,
    pub skins: Vec<SkinData>,
}

impl RenderQueues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties every queue, keeping capacity.
    pub fn clear(&mut self) {
        self.draws.clear();
        self.lights.clear();
        self.cameras.clear();
        self.skins.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
            && self.lights.is_empty()
            && self.cameras.is_empty()
            && self.skins.is_empty()
    }

    /// The camera flagged primary, or the first one collected.
    pub fn primary_camera(&self) -> Option<&CameraData> {
        self.cameras
            .iter()
            .find(|c| c.primary)
            .or_else(|| self.cameras.first())
    }

    /// Skin attached to a draw command.
    pub fn skin_of(&self, draw: &DrawCommand) -> Option<&SkinData> {
        self.skins.get(draw.skin?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera(index: u32, primary: bool) -> CameraData {
        CameraData {
            entity: Entity::new(index, 0),
            view: Mat4::identity(),
            projection: Mat4::identity(),
            position: Vec3::zeros(),
            primary,
        }
    }

    #[test]
    fn primary_camera_preference() {
        let mut queues = RenderQueues::new();
        assert!(queues.primary_camera().is_none());

        queues.cameras.push(camera(0, false));
        assert_eq!(queues.primary_camera().map(|c| c.entity.index()), Some(0));

        queues.cameras.push(camera(1, true));
        assert_eq!(queues.primary_camera().map(|c| c.entity.index()), Some(1));

        queues.clear();
        assert!(queues.is_empty());
    }

    #[test]
    fn skin_lookup() {
        let entity = Entity::new(3, 0);
        let mut queues = RenderQueues::new();
        queues.skins.push(SkinData {
            entity,
            bone_matrices: vec![Mat4::identity(); 2],
        });
        let draw = DrawCommand {
            entity,
            mesh: "hero".into(),
            material: String::new(),
            world_matrix: Mat4::identity(),
            cast_shadows: true,
            skin: Some(0),
        };
        assert_eq!(queues.skin_of(&draw).map(|s| s.bone_matrices.len()), Some(2));
    }
}
