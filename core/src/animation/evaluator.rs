//! Per-instance playback state and skinning palette evaluation.

use crate::math::Mat4;

use super::types::{Animation, BoneInfoMap, MAX_BONES, NodeData};

/// Playback cursor and final bone matrices for one animated instance.
///
/// Animation clips are shared between instances; each instance owns its own
/// evaluator.
#[derive(Debug, Clone)]
pub struct BoneEvaluator {
    current_time: f32,
    final_bone_matrices: Vec<Mat4>,
}

impl Default for BoneEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl BoneEvaluator {
    pub fn new() -> Self {
        Self {
            current_time: 0.0,
            final_bone_matrices: vec![Mat4::identity(); MAX_BONES],
        }
    }

    /// Playback position in ticks.
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn set_time(&mut self, ticks: f32) {
        self.current_time = ticks;
    }

    /// The skinning palette, `MAX_BONES` entries.
    pub fn final_bone_matrices(&self) -> &[Mat4] {
        &self.final_bone_matrices
    }

    /// Rewinds to the start and resets the palette to identity.
    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.final_bone_matrices.fill(Mat4::identity());
    }

    /// Advances the cursor by `delta_time` seconds, looping over the clip.
    pub fn advance(&mut self, animation: &Animation, delta_time: f32, playback_speed: f32) {
        if animation.duration <= 0.0 || !animation.duration.is_finite() {
            self.current_time = 0.0;
            return;
        }
        let step = animation.ticks_per_second * delta_time * playback_speed;
        let next = self.current_time + step;
        self.current_time = if next.is_finite() {
            next.rem_euclid(animation.duration)
        } else {
            0.0
        };
    }

    /// Recomputes the palette at the current time.
    ///
    /// `bone_info` maps node names to palette slots and offsets; without it
    /// the clip's own bone table is used.
    pub fn evaluate(&mut self, animation: &Animation, bone_info: Option<&BoneInfoMap>) {
        let owned;
        let bone_info = match bone_info {
            Some(info) => info,
            None => {
                owned = animation.bone_info();
                &owned
            }
        };
        let mut pass = Pass {
            animation,
            bone_info,
            time: self.current_time,
            // Root correction is identity; clips are authored in model space.
            global_inverse: Mat4::identity(),
            out: &mut self.final_bone_matrices,
        };
        pass.visit(&animation.root, &Mat4::identity());
    }

    /// Advances, then evaluates.
    pub fn update(
        &mut self,
        animation: &Animation,
        delta_time: f32,
        playback_speed: f32,
        bone_info: Option<&BoneInfoMap>,
    ) {
        self.advance(animation, delta_time, playback_speed);
        self.evaluate(animation, bone_info);
    }
}

struct Pass<'a> {
    animation: &'a Animation,
    bone_info: &'a BoneInfoMap,
    time: f32,
    global_inverse: Mat4,
    out: &'a mut [Mat4],
}

impl Pass<'_> {
    fn visit(&mut self, node: &NodeData, parent: &Mat4) {
        let local = match self.animation.find_bone(&node.name) {
            Some(bone) => bone.local_transform(self.time),
            None => node.transform,
        };
        let global = parent * local;

        if let Some(info) = self.bone_info.get(&node.name) {
            match usize::try_from(info.id) {
                Ok(slot) if slot < MAX_BONES => {
                    self.out[slot] = self.global_inverse * global * info.offset;
                }
                _ => log::warn!(
                    "bone '{}' has palette slot {} outside 0..{}",
                    node.name,
                    info.id,
                    MAX_BONES
                ),
            }
        }

        for child in &node.children {
            self.visit(child, &global);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{Bone, BoneInfo, KeyframeTrack};
    use crate::math::{Vec3, mat4_from_scale, mat4_from_translation};

    fn slide_clip() -> Animation {
        let root = Bone::new("root", 0).with_positions(KeyframeTrack::new(
            vec![0.0, 1.0],
            vec![Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)],
        ));
        Animation::new("slide", 2.0, 1.0)
            .with_bone(root)
            .with_root(NodeData::new("root").with_child(
                NodeData::new("tip").with_transform(mat4_from_translation(Vec3::y())),
            ))
    }

    #[test]
    fn advance_wraps_around_duration() {
        let anim = slide_clip();
        let mut eval = BoneEvaluator::new();
        eval.advance(&anim, 1.5, 1.0);
        assert_eq!(eval.current_time(), 1.5);
        eval.advance(&anim, 1.0, 1.0);
        assert!((eval.current_time() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn advance_scales_by_rate_and_speed() {
        let anim = Animation::new("clip", 100.0, 30.0);
        let mut eval = BoneEvaluator::new();
        eval.advance(&anim, 0.5, 2.0);
        assert_eq!(eval.current_time(), 30.0);
    }

    #[test]
    fn negative_speed_wraps_backwards() {
        let anim = Animation::new("clip", 10.0, 1.0);
        let mut eval = BoneEvaluator::new();
        eval.advance(&anim, 1.0, -1.0);
        assert_eq!(eval.current_time(), 9.0);
    }

    #[test]
    fn zero_duration_holds_time() {
        let anim = Animation::new("empty", 0.0, 30.0);
        let mut eval = BoneEvaluator::new();
        eval.advance(&anim, 1.0, 1.0);
        assert_eq!(eval.current_time(), 0.0);
    }

    #[test]
    fn evaluate_interpolates_animated_bone() {
        let anim = slide_clip();
        let mut eval = BoneEvaluator::new();
        eval.set_time(0.5);
        eval.evaluate(&anim, None);
        let m = eval.final_bone_matrices()[0];
        assert!((m[(0, 3)] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn children_compose_with_parent_and_offset() {
        let anim = slide_clip();
        let mut info = BoneInfoMap::new();
        info.insert("tip".into(), BoneInfo::new(5, mat4_from_scale(Vec3::repeat(2.0))));
        let mut eval = BoneEvaluator::new();
        eval.set_time(1.0);
        eval.evaluate(&anim, Some(&info));

        // root is not in the mesh table and leaves slot 0 untouched.
        assert_eq!(eval.final_bone_matrices()[0], Mat4::identity());
        let tip = eval.final_bone_matrices()[5];
        let expected = mat4_from_translation(Vec3::new(1.0, 1.0, 0.0))
            * mat4_from_scale(Vec3::repeat(2.0));
        assert!((tip - expected).norm() < 1e-5);
    }

    #[test]
    fn out_of_range_slots_are_skipped() {
        let mut info = BoneInfoMap::new();
        info.insert("root".into(), BoneInfo::new(MAX_BONES as i32, Mat4::identity()));
        info.insert("tip".into(), BoneInfo::new(-1, Mat4::identity()));
        let mut eval = BoneEvaluator::new();
        eval.evaluate(&slide_clip(), Some(&info));
        assert!(eval.final_bone_matrices().iter().all(|m| *m == Mat4::identity()));
    }
}
