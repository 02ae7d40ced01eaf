//! Skeletal animation resources and evaluation.
//!
//! - [`Animation`] - a clip: keyframed [`Bone`]s plus the [`NodeData`] skeleton
//! - [`KeyframeTrack`] - one channel of `(time, value)` keys
//! - [`BoneInfo`] - palette slot and offset matrix for a skinned bone
//! - [`BoneEvaluator`] - per-instance playback cursor producing the final
//!   skinning palette
//!
//! Clips are stored in the versionless `.ani` layout, see [`Animation::decode`].

mod codec;
mod evaluator;
mod types;

pub use evaluator::BoneEvaluator;
pub use types::{
    Animation, Bone, BoneInfo, BoneInfoMap, Keyframe, KeyframeTrack, MAX_BONES, MAX_NODE_DEPTH,
    NodeData,
};

use crate::resource::{Resource, ResourceError};

impl Resource for Animation {
    const EXTENSION: &'static str = ".ani";

    fn load(guid: &str, bytes: &[u8]) -> Result<Self, ResourceError> {
        let animation = Animation::decode(bytes);
        log::info!(
            "loaded animation {} ('{}', {} bones)",
            guid,
            animation.name,
            animation.bones.len()
        );
        Ok(animation)
    }
}
