use std::sync::Arc;

use ember_core::animation::{Animation, BoneEvaluator};
use ember_core::math::Mat4;
use ember_core::mesh::SkinnedMesh;

/// Plays a looping `.ani` clip on a skinned entity.
///
/// The clip and the mesh bone table are resolved lazily by
/// [`AnimationSystem`](crate::systems::AnimationSystem); the final bone
/// matrices are per entity, clips are shared.
#[derive(Debug, Clone, crate::Component)]
pub struct Animator {
    /// GUID of the animation resource.
    pub animation: String,
    pub playback_speed: f32,
    pub playing: bool,
    #[reflect(skip)]
    pub(crate) clip: Option<Arc<Animation>>,
    /// GUID `clip` was loaded for.
    #[reflect(skip)]
    pub(crate) resolved: Option<String>,
    #[reflect(skip)]
    pub(crate) skin: Option<Arc<SkinnedMesh>>,
    /// GUID whose load failed; not retried until `animation` changes.
    #[reflect(skip)]
    pub(crate) failed: Option<String>,
    #[reflect(skip)]
    pub(crate) evaluator: BoneEvaluator,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            animation: String::new(),
            playback_speed: 1.0,
            playing: true,
            clip: None,
            resolved: None,
            skin: None,
            failed: None,
            evaluator: BoneEvaluator::new(),
        }
    }
}

impl Animator {
    pub fn new(animation: impl Into<String>) -> Self {
        Self {
            animation: animation.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_speed(mut self, playback_speed: f32) -> Self {
        self.playback_speed = playback_speed;
        self
    }

    /// Switches to another clip and rewinds.
    pub fn play(&mut self, animation: impl Into<String>) {
        self.animation = animation.into();
        self.unload();
        self.failed = None;
        self.playing = true;
    }

    /// The resolved clip, once loaded.
    pub fn clip(&self) -> Option<&Arc<Animation>> {
        self.clip.as_ref()
    }

    /// Playback position in ticks.
    pub fn current_time(&self) -> f32 {
        self.evaluator.current_time()
    }

    /// Skinning palette of the last evaluated frame.
    pub fn final_bone_matrices(&self) -> &[Mat4] {
        self.evaluator.final_bone_matrices()
    }

    /// True when the cached clip belongs to the current GUID.
    pub(crate) fn is_resolved(&self) -> bool {
        self.clip.is_some() && self.resolved.as_deref() == Some(self.animation.as_str())
    }

    /// Drops a clip loaded for a GUID other than `animation`, e.g. after the
    /// field was edited through reflection. Returns `true` if it did.
    pub(crate) fn drop_stale_clip(&mut self) -> bool {
        if self.clip.is_none() || self.is_resolved() {
            return false;
        }
        self.unload();
        true
    }

    pub(crate) fn set_clip(&mut self, clip: Arc<Animation>) {
        self.resolved = Some(self.animation.clone());
        self.clip = Some(clip);
    }

    fn unload(&mut self) {
        self.clip = None;
        self.resolved = None;
        self.skin = None;
        self.evaluator.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::animation::MAX_BONES;

    #[test]
    fn defaults_to_identity_palette() {
        let animator = Animator::new("walk");
        assert_eq!(animator.final_bone_matrices().len(), MAX_BONES);
        assert!(animator.final_bone_matrices().iter().all(|m| *m == Mat4::identity()));
        assert!(animator.clip().is_none());
        assert_eq!(animator.playback_speed, 1.0);
    }

    #[test]
    fn play_rewinds_and_clears_cache() {
        let mut animator = Animator::new("walk");
        animator.set_clip(Arc::new(Animation::new("walk", 10.0, 1.0)));
        assert!(animator.is_resolved());
        animator.failed = Some("walk".into());
        animator.evaluator.set_time(4.0);
        animator.playing = false;

        animator.play("run");
        assert_eq!(animator.animation, "run");
        assert!(!animator.is_resolved());
        assert!(animator.failed.is_none());
        assert!(animator.playing);
        assert_eq!(animator.current_time(), 0.0);
    }

    #[test]
    fn editing_the_guid_makes_the_clip_stale() {
        let mut animator = Animator::new("walk");
        animator.set_clip(Arc::new(Animation::new("walk", 10.0, 1.0)));
        animator.evaluator.set_time(3.0);
        assert!(!animator.drop_stale_clip());

        animator.animation = "run".into();
        assert!(!animator.is_resolved());
        assert!(animator.drop_stale_clip());
        assert!(animator.clip().is_none());
        assert_eq!(animator.current_time(), 0.0);
    }
}
