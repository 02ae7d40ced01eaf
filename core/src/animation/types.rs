//! Skeleton and keyframe data decoded from `.ani` resources.

use std::collections::BTreeMap;

use crate::math::{
    Mat4, Quat, Vec3, lerp_vec3, mat4_from_scale_rotation_translation, quat_identity, slerp,
};

/// Capacity of the final bone matrix palette.
pub const MAX_BONES: usize = 200;

/// Node hierarchies deeper than this are cut off while decoding.
pub const MAX_NODE_DEPTH: usize = 256;

/// A value that can be blended between two keyframes.
pub trait Keyframe: Copy {
    fn interpolate(a: Self, b: Self, t: f32) -> Self;
}

impl Keyframe for Vec3 {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        lerp_vec3(a, b, t)
    }
}

impl Keyframe for Quat {
    fn interpolate(a: Self, b: Self, t: f32) -> Self {
        slerp(a, b, t)
    }
}

/// Parallel `(time, value)` sequences, times increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyframeTrack<T> {
    pub times: Vec<f32>,
    pub values: Vec<T>,
}

impl<T> Default for KeyframeTrack<T> {
    fn default() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<T: Keyframe> KeyframeTrack<T> {
    /// Pairs times with values. Mismatched lengths are truncated to the
    /// shorter sequence.
    pub fn new(mut times: Vec<f32>, mut values: Vec<T>) -> Self {
        if times.len() != values.len() {
            log::warn!(
                "keyframe track has {} times but {} values, truncating",
                times.len(),
                values.len()
            );
            let len = times.len().min(values.len());
            times.truncate(len);
            values.truncate(len);
        }
        Self { times, values }
    }

    /// A track holding one static key at time zero.
    pub fn constant(value: T) -> Self {
        Self {
            times: vec![0.0],
            values: vec![value],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len().min(self.times.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locates the interval containing `time`.
    ///
    /// Returns the index of the first key and the blend factor towards the
    /// next one. Times outside the keys extrapolate along the first or final
    /// interval, so the factor may leave `[0, 1]`. Two keys sharing a time
    /// give a factor of zero.
    pub fn segment(&self, time: f32) -> (usize, f32) {
        let len = self.len();
        if len < 2 {
            return (0, 0.0);
        }
        let index = (0..len - 1)
            .find(|&i| time < self.times[i + 1])
            .unwrap_or(len - 2);
        let start = self.times[index];
        let span = self.times[index + 1] - start;
        if span <= 0.0 {
            log::debug!(
                "keyframes {} and {} share time {}, holding the first",
                index,
                index + 1,
                start
            );
            return (index, 0.0);
        }
        (index, (time - start) / span)
    }

    /// Samples the track at `time`. Empty tracks return `None`.
    pub fn sample(&self, time: f32) -> Option<T> {
        match self.len() {
            0 => None,
            1 => Some(self.values[0]),
            _ => {
                let (i, factor) = self.segment(time);
                Some(T::interpolate(self.values[i], self.values[i + 1], factor))
            }
        }
    }
}

/// An animated bone: three independent channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    pub name: String,
    pub id: i32,
    pub positions: KeyframeTrack<Vec3>,
    pub rotations: KeyframeTrack<Quat>,
    pub scales: KeyframeTrack<Vec3>,
}

impl Bone {
    pub fn new(name: impl Into<String>, id: i32) -> Self {
        Self {
            name: name.into(),
            id,
            positions: KeyframeTrack::default(),
            rotations: KeyframeTrack::default(),
            scales: KeyframeTrack::default(),
        }
    }

    pub fn with_positions(mut self, track: KeyframeTrack<Vec3>) -> Self {
        self.positions = track;
        self
    }

    pub fn with_rotations(mut self, track: KeyframeTrack<Quat>) -> Self {
        self.rotations = track;
        self
    }

    pub fn with_scales(mut self, track: KeyframeTrack<Vec3>) -> Self {
        self.scales = track;
        self
    }

    pub fn position_at(&self, time: f32) -> Vec3 {
        self.positions.sample(time).unwrap_or_else(Vec3::zeros)
    }

    pub fn rotation_at(&self, time: f32) -> Quat {
        self.rotations.sample(time).unwrap_or_else(quat_identity)
    }

    pub fn scale_at(&self, time: f32) -> Vec3 {
        self.scales
            .sample(time)
            .unwrap_or_else(|| Vec3::new(1.0, 1.0, 1.0))
    }

    /// Interpolated `T * R * S` at `time`.
    pub fn local_transform(&self, time: f32) -> Mat4 {
        mat4_from_scale_rotation_translation(
            self.scale_at(time),
            self.rotation_at(time),
            self.position_at(time),
        )
    }
}

/// A node of the animation skeleton with its bind-pose transform.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub name: String,
    pub transform: Mat4,
    pub children: Vec<NodeData>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Mat4::identity(),
            children: Vec::new(),
        }
    }
}

impl NodeData {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_child(mut self, child: NodeData) -> Self {
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeData::node_count).sum::<usize>()
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&NodeData> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

/// Skinning data for one bone: palette slot and bind-pose offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneInfo {
    pub id: i32,
    /// Maps from bind-pose model space into bone-local space.
    pub offset: Mat4,
}

impl BoneInfo {
    pub fn new(id: i32, offset: Mat4) -> Self {
        Self { id, offset }
    }
}

/// Bone name to skinning data.
pub type BoneInfoMap = BTreeMap<String, BoneInfo>;

/// A decoded animation clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Animation {
    /// Length in ticks.
    pub duration: f32,
    pub ticks_per_second: f32,
    pub name: String,
    /// Keyed by the bone key stored in the file.
    pub bones: BTreeMap<String, Bone>,
    pub root: NodeData,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            duration: 0.0,
            ticks_per_second: 0.0,
            name: String::new(),
            bones: BTreeMap::new(),
            root: NodeData::default(),
        }
    }
}

impl Animation {
    pub fn new(name: impl Into<String>, duration: f32, ticks_per_second: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            ticks_per_second,
            ..Default::default()
        }
    }

    /// Adds a bone keyed by its own name.
    pub fn with_bone(mut self, bone: Bone) -> Self {
        self.bones.insert(bone.name.clone(), bone);
        self
    }

    pub fn with_root(mut self, root: NodeData) -> Self {
        self.root = root;
        self
    }

    /// Finds the bone animating the node called `name`.
    pub fn find_bone(&self, name: &str) -> Option<&Bone> {
        self.bones
            .get(name)
            .or_else(|| self.bones.values().find(|b| b.name == name))
    }

    /// Skinning table built from the clip's own bones, with identity offsets.
    ///
    /// Used when no mesh bone table is available.
    pub fn bone_info(&self) -> BoneInfoMap {
        self.bones
            .values()
            .map(|b| (b.name.clone(), BoneInfo::new(b.id, Mat4::identity())))
            .collect()
    }
}
