//! Math type aliases and helper functions.
//!
//! All rendering and animation math is `f32`. Quaternions cross the binary
//! format boundary as `[x, y, z, w]` arrays; matrices as 16 column-major floats.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Quaternion (f32). Stored as `[x, y, z, w]` in memory.
/// Use [`quat_from_xyzw`] or `Quaternion::new(w, x, y, z)` to construct.
pub type Quat = nalgebra::Quaternion<f32>;

/// Above this `|dot|` two rotations are blended linearly.
const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

/// Build a 4x4 TRS matrix from scale, rotation (quaternion), and translation.
///
/// The rotation is normalized first so slightly drifted quaternions coming
/// out of interpolation do not shear the result.
pub fn mat4_from_scale_rotation_translation(
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
) -> Mat4 {
    let r = unit_or_identity(rotation);
    let m = r.to_rotation_matrix();
    let rm = m.matrix();
    #[rustfmt::skip]
    let result = Mat4::new(
        rm[(0, 0)] * scale.x, rm[(0, 1)] * scale.y, rm[(0, 2)] * scale.z, translation.x,
        rm[(1, 0)] * scale.x, rm[(1, 1)] * scale.y, rm[(1, 2)] * scale.z, translation.y,
        rm[(2, 0)] * scale.x, rm[(2, 1)] * scale.y, rm[(2, 2)] * scale.z, translation.z,
        0.0,                  0.0,                  0.0,                  1.0,
    );
    result
}

/// Normalizes `q`, or returns the identity for a (near) zero quaternion.
pub fn normalize_or_identity(q: Quat) -> Quat {
    if q.norm_squared() <= f32::EPSILON {
        quat_identity()
    } else {
        q.normalize()
    }
}

fn unit_or_identity(q: Quat) -> nalgebra::UnitQuaternion<f32> {
    nalgebra::UnitQuaternion::new_unchecked(normalize_or_identity(q))
}

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Build a rotation-only 4x4 matrix.
pub fn mat4_from_rotation(q: Quat) -> Mat4 {
    unit_or_identity(q).to_homogeneous()
}

/// Build a non-uniform scale 4x4 matrix.
pub fn mat4_from_scale(s: Vec3) -> Mat4 {
    Mat4::new_nonuniform_scaling(&s)
}

/// Build a matrix from 16 column-major floats.
pub fn mat4_from_cols_array(a: &[f32; 16]) -> Mat4 {
    Mat4::from_column_slice(a)
}

/// Flatten a matrix into 16 column-major floats.
pub fn mat4_to_cols_array(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

/// The identity rotation.
pub fn quat_identity() -> Quat {
    Quat::identity()
}

/// Create a quaternion from x, y, z, w components.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    nalgebra::Quaternion::new(w, x, y, z)
}

/// Create a quaternion from a `[x, y, z, w]` array.
pub fn quat_from_array(a: [f32; 4]) -> Quat {
    nalgebra::Quaternion::new(a[3], a[0], a[1], a[2])
}

/// Convert a quaternion to a `[x, y, z, w]` array.
pub fn quat_to_array(q: Quat) -> [f32; 4] {
    [q.coords.x, q.coords.y, q.coords.z, q.coords.w]
}

/// Create a quaternion from rotation around the X axis.
pub fn quat_from_rotation_x(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::x_axis(), angle).into_inner()
}

/// Create a quaternion from rotation around the Y axis.
pub fn quat_from_rotation_y(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::y_axis(), angle).into_inner()
}

/// Create a quaternion from rotation around the Z axis.
pub fn quat_from_rotation_z(angle: f32) -> Quat {
    nalgebra::UnitQuaternion::from_axis_angle(&nalgebra::Vector3::z_axis(), angle).into_inner()
}

/// Rotate a vector by a quaternion.
pub fn quat_rotate_vec3(q: Quat, v: Vec3) -> Vec3 {
    unit_or_identity(q) * v
}

/// Component-wise linear interpolation.
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// Shortest-arc spherical interpolation between two rotations.
///
/// Falls back to normalized linear interpolation when the rotations are
/// nearly parallel, where the slerp denominator approaches zero.
pub fn slerp(a: Quat, b: Quat, t: f32) -> Quat {
    let a = normalize_or_identity(a);
    let mut b = normalize_or_identity(b);
    let mut dot = a.coords.dot(&b.coords);

    if dot < 0.0 {
        b = -b;
        dot = -dot;
    }

    if dot > SLERP_LINEAR_THRESHOLD {
        let blended = Quat::from(a.coords + (b.coords - a.coords) * t);
        return normalize_or_identity(blended);
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();
    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;
    Quat::from(a.coords * s0 + b.coords * s1)
}

/// Decompose a 4x4 matrix into (scale, rotation, translation).
///
/// A zero-length basis column yields zero scale on that axis and an
/// identity rotation instead of NaN.
pub fn to_scale_rotation_translation(m: &Mat4) -> (Vec3, Quat, Vec3) {
    let translation = Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);
    let col0 = Vec3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]);
    let col1 = Vec3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]);
    let col2 = Vec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]);
    let sx = col0.norm();
    let sy = col1.norm();
    let sz = col2.norm();
    let scale = Vec3::new(sx, sy, sz);
    if sx <= f32::EPSILON || sy <= f32::EPSILON || sz <= f32::EPSILON {
        return (scale, Quat::identity(), translation);
    }
    let rot_mat = nalgebra::Matrix3::from_columns(&[col0 / sx, col1 / sy, col2 / sz]);
    let rotation = nalgebra::UnitQuaternion::from_rotation_matrix(
        &nalgebra::Rotation3::from_matrix_unchecked(rot_mat),
    )
    .into_inner();
    (scale, rotation, translation)
}

/// Returns `true` if every element of the matrix is finite.
pub fn mat4_is_finite(m: &Mat4) -> bool {
    m.iter().all(|v| v.is_finite())
}
