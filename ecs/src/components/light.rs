use ember_core::math::Vec3;

/// Emission model of a [`Light`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LightKind {
    /// Parallel rays along the entity's forward axis.
    #[default]
    Directional,
    Point,
    /// Cone along the forward axis. Angles in radians.
    Spot { inner_angle: f32, outer_angle: f32 },
}

/// Light source placed at the entity's world transform.
#[derive(Debug, Clone, PartialEq, crate::Component)]
pub struct Light {
    pub kind: LightKind,
    /// Linear RGB.
    pub color: Vec3,
    pub intensity: f32,
    /// Attenuation range for point and spot lights.
    pub range: f32,
    pub cast_shadows: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            color: Vec3::repeat(1.0),
            intensity: 1.0,
            range: 10.0,
            cast_shadows: false,
        }
    }
}

impl Light {
    pub fn point(color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            color,
            intensity,
            range,
            ..Self::default()
        }
    }

    pub fn spot(color: Vec3, intensity: f32, inner_angle: f32, outer_angle: f32) -> Self {
        Self {
            kind: LightKind::Spot {
                inner_angle,
                outer_angle: outer_angle.max(inner_angle),
            },
            color,
            intensity,
            ..Self::default()
        }
    }

    /// Color premultiplied by intensity.
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }
}
