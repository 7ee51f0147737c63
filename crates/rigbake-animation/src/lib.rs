//! Skeletal animation for rigbake
//!
//! - **Skeleton**: bone hierarchy built once from an imported skin
//! - **Tracks**: per-bone position/rotation/scale keyframe channels, in seconds
//! - **Pose evaluation**: animation + skeleton + time → flat array of skin matrices
//! - **Bounds**: world-space bounding volume of a skinned mesh over sampled poses

pub mod animation;
pub mod bounds;
pub mod pose;
pub mod skeleton;
pub mod track;

pub use animation::{Animation, UntrackedBones, DEFAULT_TICKS_PER_SECOND};
pub use bounds::compute_bounding_volume;
pub use pose::{evaluate_pose, Pose};
pub use skeleton::{Bone, BoneInfo, Skeleton};
pub use track::{BoneTrack, Channel, Interpolate};
