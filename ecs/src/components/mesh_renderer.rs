/// Draws a `.mesh` resource at the entity's world transform.
#[derive(Debug, Clone, PartialEq, crate::Component)]
pub struct MeshRenderer {
    /// GUID of the mesh resource.
    pub mesh: String,
    /// Material identifier understood by the rendering backend.
    pub material: String,
    /// Hidden renderers are skipped for drawing and animation.
    pub visible: bool,
    pub cast_shadows: bool,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            mesh: String::new(),
            material: String::new(),
            visible: true,
            cast_shadows: true,
        }
    }
}

impl MeshRenderer {
    pub fn new(mesh: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = material.into();
        self
    }
}
