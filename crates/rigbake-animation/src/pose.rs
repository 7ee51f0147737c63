//! Pose buffers and the pose evaluator

use crate::animation::{Animation, UntrackedBones};
use crate::skeleton::Bone;
use glam::Mat4;
use rigbake_core::{Result, RigError, Vertex};
use std::ops::Index;

/// Skin matrices indexed by bone id, ready for GPU skinning.
///
/// `pose[id] = global_inverse * global(bone) * offset`
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    matrices: Vec<Mat4>,
}

impl Pose {
    /// Identity-initialised pose for `bone_count` bones
    pub fn new(bone_count: usize) -> Self {
        Self {
            matrices: vec![Mat4::IDENTITY; bone_count],
        }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn get(&self, id: usize) -> Option<Mat4> {
        self.matrices.get(id).copied()
    }

    pub fn as_slice(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Reset every slot to identity
    pub fn reset(&mut self) {
        self.matrices.fill(Mat4::IDENTITY);
    }

    /// Column-major matrices for a GPU storage buffer
    pub fn to_gpu(&self) -> Vec<[[f32; 4]; 4]> {
        self.matrices.iter().map(|m| m.to_cols_array_2d()).collect()
    }

    /// Weighted sum of the matrices a vertex is bound to.
    ///
    /// A vertex whose first weight is exactly zero is rigid and gets the identity.
    pub fn skin_matrix(&self, vertex: &Vertex) -> Result<Mat4> {
        if vertex.is_rigid() {
            return Ok(Mat4::IDENTITY);
        }
        let mut skin = Mat4::ZERO;
        for (id, weight) in vertex.influences() {
            let m = self.matrices.get(id as usize).ok_or_else(|| {
                RigError::MalformedMesh(format!(
                    "vertex references bone {} but the pose has {} bones",
                    id,
                    self.matrices.len()
                ))
            })?;
            skin += *m * weight;
        }
        Ok(skin)
    }
}

impl Index<usize> for Pose {
    type Output = Mat4;

    fn index(&self, id: usize) -> &Mat4 {
        &self.matrices[id]
    }
}

/// Evaluate `animation` over the bone subtree at `root` into `pose`.
///
/// `time` is in seconds and wraps into `[0, duration)`. Each bone's `pre_transform` is
/// applied to the incoming parent transform first. Bones without a track keep their slot
/// (or inherit, per `Animation::untracked_bones`) and pass that transform through to their
/// children unchanged. The pose length and every bone id are checked before any slot is
/// written.
pub fn evaluate_pose(
    animation: &Animation,
    root: &Bone,
    time: f32,
    parent: Mat4,
    pose: &mut Pose,
) -> Result<()> {
    if pose.len() != animation.bone_count() {
        return Err(RigError::PoseSizeMismatch {
            expected: animation.bone_count(),
            got: pose.len(),
        });
    }
    check_ids(root, pose.len())?;

    let t = animation.wrap_time(time);
    write_bone(animation, root, t, parent, pose);
    Ok(())
}

fn check_ids(bone: &Bone, len: usize) -> Result<()> {
    if bone.id >= len {
        return Err(RigError::PoseSizeMismatch {
            expected: bone.id + 1,
            got: len,
        });
    }
    bone.children.iter().try_for_each(|c| check_ids(c, len))
}

fn write_bone(animation: &Animation, bone: &Bone, t: f32, parent: Mat4, pose: &mut Pose) {
    let parent = parent * bone.pre_transform;
    let global = match animation.track(&bone.name) {
        Some(track) => {
            let global = parent * track.local_transform(t);
            pose.matrices[bone.id] = animation.global_inverse() * global * bone.offset;
            global
        }
        None => {
            if animation.untracked_bones() == UntrackedBones::Inherit {
                pose.matrices[bone.id] = animation.global_inverse() * parent * bone.offset;
            }
            parent
        }
    };

    for child in &bone.children {
        write_bone(animation, child, t, global, pose);
    }
}
