//! Runtime reflection for ECS components.
//!
//! Any `Send + Sync + 'static` type can be stored as a component. Types that
//! implement [`Component`] are additionally introspectable: they expose a
//! static field schema and typed field access by name, which editors and
//! serializers use without knowing the concrete type.
//!
//! Use `#[derive(Component)]` from [`ecs_macro`] to implement both traits.

use std::any::Any;

/// Broad category of a reflected field, used to pick an editor widget or
/// serialization format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    F32,
    U8,
    U32,
    I32,
    U64,
    Vec2,
    Vec3,
    Vec4,
    Quat,
    Mat4,
    String,
    Entity,
    /// Any other type; accessible through [`Reflect::field`] only.
    Opaque,
}

/// Static description of one reflected field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub type_name: &'static str,
    pub kind: FieldKind,
}

/// Object-safe reflection over a component instance.
pub trait Reflect: Any + Send + Sync {
    /// Returns the struct name (e.g. `"Transform"`).
    fn component_name(&self) -> &'static str;

    /// Schema of every reflected field, in declaration order.
    fn field_infos(&self) -> &'static [FieldInfo];

    /// Field value by name.
    fn field(&self, name: &str) -> Option<&dyn Any>;

    /// Mutable field value by name.
    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Any>;
}

impl dyn Reflect {
    /// Typed field read. `None` if the field is missing or of another type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.field(name)?.downcast_ref::<T>()
    }

    /// Typed field write access.
    pub fn get_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.field_mut(name)?.downcast_mut::<T>()
    }

    /// Overwrites a field. Returns `false` if the field is missing or of
    /// another type.
    pub fn set<T: Any>(&mut self, name: &str, value: T) -> bool {
        match self.get_mut::<T>(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Looks up a field's schema entry.
    pub fn field_info(&self, name: &str) -> Option<&'static FieldInfo> {
        self.field_infos().iter().find(|info| info.name == name)
    }
}

/// Trait for reflected ECS components.
///
/// # Deriving
///
/// ```ignore
/// #[derive(Default, Component)]
/// struct Health {
///     current: f32,
///     max: f32,
///     #[reflect(skip)]
///     regen_timer: f32,
/// }
/// ```
pub trait Component: Reflect + Sized {
    /// The struct name as a static string (e.g. `"Transform"`).
    ///
    /// Used by the World's reflection registry to key metadata without
    /// requiring an instance.
    const NAME: &'static str;
}
