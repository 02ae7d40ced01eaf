//! `.ani` encoding.
//!
//! ```text
//! duration:f32 ticks_per_second:f32 name:string bone_count:u64
//! bone_count * {
//!     key:string name:string id:i32
//!     positions:[vec3] position_times:[f32]
//!     rotations:[quat xyzw] rotation_times:[f32]
//!     scales:[vec3] scale_times:[f32]
//! }
//! root:node
//!
//! node = name:string transform:mat4 child_count:u64 child_count * node
//! ```

use std::collections::BTreeMap;

use crate::binary::{BinaryReader, BinaryWriter, DecodeError};

use super::types::{Animation, Bone, KeyframeTrack, MAX_NODE_DEPTH, NodeData};

/// Smallest possible encoded bone: two empty strings, an id, six empty arrays.
const MIN_BONE_SIZE: usize = 8 + 8 + 4 + 6 * 8;
/// Smallest possible encoded node: empty name, matrix, child count.
const MIN_NODE_SIZE: usize = 8 + 64 + 8;

impl Animation {
    /// Decodes an `.ani` payload.
    ///
    /// Never fails: truncated or corrupt input yields zeroed trailing fields
    /// and a logged warning.
    pub fn decode(bytes: &[u8]) -> Self {
        let mut reader = BinaryReader::new(bytes, "animation");
        decode_animation(&mut reader)
    }

    /// Decodes an `.ani` payload, rejecting truncated data and trailing bytes.
    pub fn decode_strict(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut reader = BinaryReader::new(bytes, "animation");
        let animation = decode_animation(&mut reader);
        reader.finish()?;
        Ok(animation)
    }

    /// Encodes into the `.ani` layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = BinaryWriter::new();
        w.write_f32(self.duration);
        w.write_f32(self.ticks_per_second);
        w.write_string(&self.name);
        w.write_count(self.bones.len());
        for (key, bone) in &self.bones {
            w.write_string(key);
            encode_bone(&mut w, bone);
        }
        encode_node(&mut w, &self.root);
        w.into_bytes()
    }
}

fn decode_animation(r: &mut BinaryReader<'_>) -> Animation {
    let duration = r.read_f32();
    let ticks_per_second = r.read_f32();
    let name = r.read_string();

    let bone_count = r.read_count(MIN_BONE_SIZE);
    let mut bones = BTreeMap::new();
    for _ in 0..bone_count {
        let key = r.read_string();
        let bone = decode_bone(r);
        if bones.insert(key.clone(), bone).is_some() {
            log::warn!("animation '{}': duplicate bone key '{}'", name, key);
        }
    }

    let root = decode_node(r, 0);
    log::debug!(
        "decoded animation '{}': {} bones, {} nodes, {} bytes",
        name,
        bones.len(),
        root.node_count(),
        r.offset()
    );

    Animation {
        duration,
        ticks_per_second,
        name,
        bones,
        root,
    }
}

fn decode_bone(r: &mut BinaryReader<'_>) -> Bone {
    let name = r.read_string();
    let id = r.read_i32();

    let positions = r.read_vec3_array();
    let position_times = r.read_f32_array();
    let rotations = r.read_quat_array();
    let rotation_times = r.read_f32_array();
    let scales = r.read_vec3_array();
    let scale_times = r.read_f32_array();

    Bone {
        name,
        id,
        positions: KeyframeTrack::new(position_times, positions),
        rotations: KeyframeTrack::new(rotation_times, rotations),
        scales: KeyframeTrack::new(scale_times, scales),
    }
}

fn encode_bone(w: &mut BinaryWriter, bone: &Bone) {
    w.write_string(&bone.name);
    w.write_i32(bone.id);
    w.write_vec3_array(&bone.positions.values);
    w.write_f32_array(&bone.positions.times);
    w.write_quat_array(&bone.rotations.values);
    w.write_f32_array(&bone.rotations.times);
    w.write_vec3_array(&bone.scales.values);
    w.write_f32_array(&bone.scales.times);
}

fn decode_node(r: &mut BinaryReader<'_>, depth: usize) -> NodeData {
    let name = r.read_string();
    let transform = r.read_mat4();
    let child_count = r.read_count(MIN_NODE_SIZE);

    if depth >= MAX_NODE_DEPTH {
        log::warn!(
            "animation node '{}' exceeds depth {}, dropping {} children",
            name,
            MAX_NODE_DEPTH,
            child_count
        );
        return NodeData {
            name,
            transform,
            children: Vec::new(),
        };
    }

    let children = (0..child_count)
        .map(|_| decode_node(r, depth + 1))
        .collect();
    NodeData {
        name,
        transform,
        children,
    }
}

fn encode_node(w: &mut BinaryWriter, node: &NodeData) {
    w.write_string(&node.name);
    w.write_mat4(&node.transform);
    w.write_count(node.children.len());
    for child in &node.children {
        encode_node(w, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec3, mat4_from_translation, quat_from_rotation_y, quat_identity};

    fn walk_clip() -> Animation {
        let hip = Bone::new("hip", 0)
            .with_positions(KeyframeTrack::new(
                vec![0.0, 1.0],
                vec![Vec3::zeros(), Vec3::new(0.0, 1.0, 0.0)],
            ))
            .with_rotations(KeyframeTrack::new(
                vec![0.0, 2.0],
                vec![quat_identity(), quat_from_rotation_y(0.5)],
            ));
        Animation::new("walk", 2.0, 24.0)
            .with_bone(hip)
            .with_root(
                NodeData::new("root").with_child(
                    NodeData::new("hip").with_transform(mat4_from_translation(Vec3::y())),
                ),
            )
    }

    #[test]
    fn header_layout() {
        let bytes = walk_clip().encode();
        assert_eq!(&bytes[0..4], &2.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &24.0f32.to_le_bytes());
        assert_eq!(&bytes[8..16], &4u64.to_le_bytes());
        assert_eq!(&bytes[16..20], b"walk");
    }

    #[test]
    fn strict_decode_accepts_encoded_clip() {
        let clip = walk_clip();
        let decoded = Animation::decode_strict(&clip.encode()).unwrap();
        assert_eq!(decoded, clip);
    }

    #[test]
    fn strict_decode_rejects_truncation() {
        let bytes = walk_clip().encode();
        let err = Animation::decode_strict(&bytes[..bytes.len() - 10]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn empty_input_decodes_to_default() {
        let anim = Animation::decode(&[]);
        assert_eq!(anim.duration, 0.0);
        assert!(anim.bones.is_empty());
        assert!(anim.root.children.is_empty());
    }

    #[test]
    fn deep_hierarchy_is_cut_off() {
        let mut node = NodeData::new("leaf");
        for i in 0..MAX_NODE_DEPTH + 8 {
            node = NodeData::new(format!("n{i}")).with_child(node);
        }
        let anim = Animation::new("deep", 1.0, 1.0).with_root(node);
        let decoded = Animation::decode(&anim.encode());
        assert_eq!(decoded.root.node_count(), MAX_NODE_DEPTH + 1);
    }
}
