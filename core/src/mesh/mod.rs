//! CPU-side mesh resources.
//!
//! - [`SkinnedMesh`] - vertices, indices and the bone offset table of a
//!   skinned model, stored as `.mesh`
//! - [`SkinnedVertex`] - `bytemuck`-castable vertex handed to the renderer

mod skinned;

pub use skinned::{MAX_BONE_INFLUENCE, SkinnedMesh, SkinnedVertex};
