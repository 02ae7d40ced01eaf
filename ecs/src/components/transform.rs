//! Position, rotation and scale of entities.
//!
//! [`Transform`] keeps the authored `local` values relative to the parent
//! entity and the `world` values derived from the hierarchy by
//! [`TransformSystem`](crate::systems::TransformSystem), with both matrices
//! cached for renderers.

use ember_core::math::{
    Mat4, Quat, Vec3, mat4_from_scale_rotation_translation, quat_rotate_vec3,
    to_scale_rotation_translation,
};

/// Position / rotation / scale triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    pub position: Vec3,
    /// Unit quaternion.
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transformation {
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::repeat(1.0),
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    /// Decomposes an affine matrix.
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = to_scale_rotation_translation(matrix);
        Self {
            position,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// `T * R * S` matrix.
    pub fn matrix(&self) -> Mat4 {
        mat4_from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// This transformation expressed in the space of `parent`'s parent.
    ///
    /// Exact for uniform parent scale; non-uniform scale under rotation
    /// cannot be represented as a TRS triple and is approximated.
    pub fn under(&self, parent: &Transformation) -> Transformation {
        Transformation {
            position: parent.position
                + quat_rotate_vec3(parent.rotation, parent.scale.component_mul(&self.position)),
            rotation: (parent.rotation * self.rotation).normalize(),
            scale: parent.scale.component_mul(&self.scale),
        }
    }

    /// Local -Z axis.
    pub fn forward(&self) -> Vec3 {
        quat_rotate_vec3(self.rotation, -Vec3::z())
    }
}

/// Spatial component: authored local transformation plus derived world data.
#[derive(Debug, Clone, PartialEq, crate::Component)]
pub struct Transform {
    /// Relative to the parent entity, or to the world for roots.
    pub local: Transformation,
    /// Derived each frame from the hierarchy.
    pub world: Transformation,
    pub local_matrix: Mat4,
    pub world_matrix: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Transformation::identity())
    }
}

impl Transform {
    pub fn new(local: Transformation) -> Self {
        let matrix = local.matrix();
        Self {
            local,
            world: local,
            local_matrix: matrix,
            world_matrix: matrix,
        }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(Transformation::from_position(position))
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.local.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.local.rotation = rotation;
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.local.scale = scale;
    }

    /// World-space position.
    pub fn world_position(&self) -> Vec3 {
        self.world.position
    }

    /// Recomputes the cached local matrix and the world data from the
    /// parent's world values (`None` for roots).
    pub fn propagate(&mut self, parent: Option<(&Transformation, &Mat4)>) {
        self.local_matrix = self.local.matrix();
        match parent {
            Some((parent_world, parent_matrix)) => {
                self.world = self.local.under(parent_world);
                self.world_matrix = parent_matrix * self.local_matrix;
            }
            None => {
                self.world = self.local;
                self.world_matrix = self.local_matrix;
            }
        }
    }
}
