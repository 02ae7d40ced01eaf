//! Skinned mesh resource (`.mesh`).
//!
//! ```text
//! name:string
//! vertex_count:u64 vertex_count * {pos:f32x3 normal:f32x3 uv:f32x2 bone_ids:i32x4 weights:f32x4}
//! index_count:u64 index_count * u32
//! bone_count:u64 bone_count * {name:string id:i32 offset:mat4}
//! ```

use bytemuck::{Pod, Zeroable};

use crate::animation::{BoneInfo, BoneInfoMap};
use crate::binary::{BinaryReader, BinaryWriter, DecodeError};
use crate::math::{Vec2, Vec3};
use crate::resource::{Resource, ResourceError};

/// Bones influencing one vertex.
pub const MAX_BONE_INFLUENCE: usize = 4;

const VERTEX_SIZE: usize = std::mem::size_of::<SkinnedVertex>();
const MIN_BONE_SIZE: usize = 8 + 4 + 64;

/// GPU-ready skinned vertex.
///
/// Unused influence slots carry bone id `-1` and weight `0`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for SkinnedVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            uv: [0.0; 2],
            bone_ids: [-1; MAX_BONE_INFLUENCE],
            weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }
}

impl SkinnedVertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
            ..Default::default()
        }
    }

    /// Binds `bone_id` with `weight` to the first free influence slot.
    ///
    /// Returns `false` when all slots are taken.
    pub fn add_bone(&mut self, bone_id: i32, weight: f32) -> bool {
        match self.bone_ids.iter().position(|&id| id < 0) {
            Some(slot) => {
                self.bone_ids[slot] = bone_id;
                self.weights[slot] = weight;
                true
            }
            None => false,
        }
    }

    pub fn total_weight(&self) -> f32 {
        self.weights.iter().sum()
    }
}

/// CPU-side skinned mesh with its bone offset table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinnedMesh {
    pub name: String,
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
    pub bone_info: BoneInfoMap,
}

impl SkinnedMesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_vertices(mut self, vertices: Vec<SkinnedVertex>) -> Self {
        self.vertices = vertices;
        self
    }

    pub fn with_indices(mut self, indices: Vec<u32>) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_bone(mut self, name: impl Into<String>, info: BoneInfo) -> Self {
        self.bone_info.insert(name.into(), info);
        self
    }

    /// Raw vertex bytes for GPU upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Raw `u32` index bytes for GPU upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Indices that point past the vertex buffer.
    pub fn invalid_indices(&self) -> usize {
        let n = self.vertices.len() as u64;
        self.indices.iter().filter(|&&i| u64::from(i) >= n).count()
    }

    /// Decodes a `.mesh` payload. Truncated data yields zeroed trailing fields.
    pub fn decode(bytes: &[u8]) -> Self {
        let mut reader = BinaryReader::new(bytes, "mesh");
        decode_mesh(&mut reader)
    }

    /// Decodes a `.mesh` payload, rejecting truncated data and trailing bytes.
    pub fn decode_strict(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BinaryReader::new(bytes, "mesh");
        let mesh = decode_mesh(&mut reader);
        reader.finish()?;
        Ok(mesh)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = BinaryWriter::new();
        w.write_string(&self.name);

        w.write_count(self.vertices.len());
        for v in &self.vertices {
            for c in v.position.iter().chain(&v.normal).chain(&v.uv) {
                w.write_f32(*c);
            }
            for id in v.bone_ids {
                w.write_i32(id);
            }
            for weight in v.weights {
                w.write_f32(weight);
            }
        }

        w.write_count(self.indices.len());
        for i in &self.indices {
            w.write_u32(*i);
        }

        w.write_count(self.bone_info.len());
        for (name, info) in &self.bone_info {
            w.write_string(name);
            w.write_i32(info.id);
            w.write_mat4(&info.offset);
        }
        w.into_bytes()
    }
}

fn decode_mesh(r: &mut BinaryReader<'_>) -> SkinnedMesh {
    let name = r.read_string();

    let vertex_count = r.read_count(VERTEX_SIZE);
    let vertices = (0..vertex_count)
        .map(|_| {
            let position = r.read_vec3();
            let normal = r.read_vec3();
            let uv = r.read_vec2();
            let mut vertex = SkinnedVertex::new(position, normal, uv);
            for id in &mut vertex.bone_ids {
                *id = r.read_i32();
            }
            for weight in &mut vertex.weights {
                *weight = r.read_f32();
            }
            vertex
        })
        .collect();

    let index_count = r.read_count(4);
    let indices = (0..index_count).map(|_| r.read_u32()).collect();

    let bone_count = r.read_count(MIN_BONE_SIZE);
    let mut bone_info = BoneInfoMap::new();
    for _ in 0..bone_count {
        let bone_name = r.read_string();
        let id = r.read_i32();
        let offset = r.read_mat4();
        bone_info.insert(bone_name, BoneInfo::new(id, offset));
    }

    let mesh = SkinnedMesh {
        name,
        vertices,
        indices,
        bone_info,
    };
    let invalid = mesh.invalid_indices();
    if invalid > 0 {
        log::warn!("mesh '{}': {} indices out of range", mesh.name, invalid);
    }
    mesh
}

impl Resource for SkinnedMesh {
    const EXTENSION: &'static str = ".mesh";

    fn load(guid: &str, bytes: &[u8]) -> Result<Self, ResourceError> {
        let mesh = SkinnedMesh::decode(bytes);
        log::info!(
            "loaded mesh {} ('{}', {} vertices, {} bones)",
            guid,
            mesh.name,
            mesh.vertices.len(),
            mesh.bone_info.len()
        );
        Ok(mesh)
    }

    fn unload(&mut self) {
        log::debug!("unloading mesh '{}'", self.name);
        self.vertices = Vec::new();
        self.indices = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, mat4_from_translation};

    fn triangle() -> SkinnedMesh {
        let mut a = SkinnedVertex::new(Vec3::zeros(), Vec3::z(), Vec2::zeros());
        a.add_bone(0, 1.0);
        let mut b = SkinnedVertex::new(Vec3::x(), Vec3::z(), Vec2::x());
        b.add_bone(0, 0.5);
        b.add_bone(1, 0.5);
        let c = SkinnedVertex::new(Vec3::y(), Vec3::z(), Vec2::y());
        SkinnedMesh::new("tri")
            .with_vertices(vec![a, b, c])
            .with_indices(vec![0, 1, 2])
            .with_bone("root", BoneInfo::new(0, Mat4::identity()))
            .with_bone("arm", BoneInfo::new(1, mat4_from_translation(Vec3::x())))
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(VERTEX_SIZE, 64);
        let mesh = triangle();
        assert_eq!(mesh.vertex_bytes().len(), 3 * 64);
        assert_eq!(mesh.index_bytes().len(), 12);
    }

    #[test]
    fn influence_slots_fill_in_order() {
        let mut v = SkinnedVertex::default();
        for id in 0..4 {
            assert!(v.add_bone(id, 0.25));
        }
        assert!(!v.add_bone(9, 0.1));
        assert_eq!(v.bone_ids, [0, 1, 2, 3]);
        assert!((v.total_weight() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn strict_decode_matches_encoded_mesh() {
        let mesh = triangle();
        assert_eq!(SkinnedMesh::decode_strict(&mesh.encode()).unwrap(), mesh);
    }

    #[test]
    fn truncated_mesh_zeroes_trailing_fields() {
        let mesh = triangle();
        let bytes = mesh.encode();
        // Cut inside the bone table.
        let decoded = SkinnedMesh::decode(&bytes[..bytes.len() - 40]);
        assert_eq!(decoded.vertices, mesh.vertices);
        assert_eq!(decoded.indices, mesh.indices);
        assert!(decoded.bone_info.len() <= 2);
        assert!(SkinnedMesh::decode_strict(&bytes[..bytes.len() - 40]).is_err());
    }

    #[test]
    fn out_of_range_indices_are_counted() {
        let mesh = triangle().with_indices(vec![0, 1, 7]);
        assert_eq!(mesh.invalid_indices(), 1);
    }
}
