//! Viewpoint component.

use ember_core::math::{Mat4, nalgebra};

/// Perspective camera looking down the entity's -Z axis.
#[derive(Debug, Clone, PartialEq, crate::Component)]
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height of the render target.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    /// The primary camera is the one renderers present.
    pub primary: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
            primary: true,
        }
    }
}

impl Camera {
    /// Creates a perspective camera with the given FOV in degrees.
    pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y: fov_y_degrees.to_radians(),
            aspect,
            near,
            far,
            primary: true,
        }
    }

    /// Right-handed projection matrix with a `[-1, 1]` depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        let aspect = if self.aspect > 0.0 { self.aspect } else { 1.0 };
        nalgebra::Perspective3::new(aspect, self.fov_y, self.near, self.far).to_homogeneous()
    }

    /// View matrix for a camera placed at `world_matrix`.
    pub fn view_matrix(world_matrix: &Mat4) -> Mat4 {
        world_matrix.try_inverse().unwrap_or_else(Mat4::identity)
    }
}
