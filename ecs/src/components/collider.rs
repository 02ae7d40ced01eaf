use ember_core::math::Vec3;

/// Collision volume, centred on the entity's world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Capsule along the local Y axis.
    Capsule { radius: f32, half_height: f32 },
}

impl Default for ColliderShape {
    fn default() -> Self {
        Self::Box {
            half_extents: Vec3::repeat(0.5),
        }
    }
}

impl ColliderShape {
    /// Radius of a sphere enclosing the shape.
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Box { half_extents } => half_extents.norm(),
            Self::Sphere { radius } => radius,
            Self::Capsule {
                radius,
                half_height,
            } => radius + half_height,
        }
    }
}

/// Physics participation of an entity. Consumed by the
/// [`PhysicsBackend`](crate::PhysicsBackend).
#[derive(Debug, Clone, Default, PartialEq, crate::Component)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Triggers report overlaps but do not collide.
    pub is_trigger: bool,
    /// Bitmask of layers this collider interacts with.
    pub layer: u32,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            is_trigger: false,
            layer: u32::MAX,
        }
    }

    #[must_use]
    pub fn trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Both colliders share at least one layer bit.
    pub fn interacts_with(&self, other: &Collider) -> bool {
        self.layer & other.layer != 0
    }
}
