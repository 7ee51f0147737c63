//! Animations: named sets of bone tracks with a duration

use crate::pose::{evaluate_pose, Pose};
use crate::skeleton::Skeleton;
use crate::track::{BoneTrack, Channel};
use glam::{Mat4, Quat, Vec3};
use rigbake_core::{Handle, Result, RigError};
use rigbake_import::{ImportedAnimation, ImportedKey, ImportedScene};
use std::collections::HashMap;

/// Used when an imported animation declares a non-positive tick rate
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// What the evaluator writes for bones without a track
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UntrackedBones {
    /// Leave the slot as it was; children compose with the incoming parent transform
    #[default]
    Skip,
    /// Also write `global_inverse * parent * offset`, so the bone follows its parent
    Inherit,
}

/// An immutable skeletal animation. Evaluation writes into a caller-owned `Pose`.
#[derive(Debug, Clone)]
pub struct Animation {
    name: String,
    /// Seconds
    duration: f32,
    ticks_per_second: f32,
    tracks: HashMap<String, BoneTrack>,
    global_inverse: Mat4,
    bone_count: usize,
    skeleton: Option<Handle<Skeleton>>,
    untracked: UntrackedBones,
}

impl Animation {
    /// Build from tracks already in seconds
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        tracks: HashMap<String, BoneTrack>,
        bone_count: usize,
    ) -> Self {
        Self {
            name: name.into(),
            duration,
            ticks_per_second: 1.0,
            tracks,
            global_inverse: Mat4::IDENTITY,
            bone_count,
            skeleton: None,
            untracked: UntrackedBones::default(),
        }
    }

    /// Convert an imported animation (timestamps in ticks) for `skeleton`.
    ///
    /// Channels that target nodes which are not bones are dropped. A bone missing one of
    /// its three channels gets a constant channel from the node's rest transform, and a
    /// bone with no channels at all gets a constant track of its rest transform.
    pub fn from_imported(
        imported: &ImportedAnimation,
        scene: &ImportedScene,
        skeleton: &Skeleton,
    ) -> Result<Self> {
        let ticks_per_second = if imported.ticks_per_second > 0.0 {
            imported.ticks_per_second
        } else {
            log::warn!(
                "Animation '{}' has ticks_per_second {}; assuming {}",
                imported.name,
                imported.ticks_per_second,
                DEFAULT_TICKS_PER_SECOND
            );
            DEFAULT_TICKS_PER_SECOND
        };

        let rest: HashMap<&str, Mat4> = scene
            .nodes
            .iter()
            .map(|n| (n.name.as_str(), n.transform))
            .collect();

        let mut tracks = HashMap::new();
        let mut skipped = 0;
        for channel in &imported.channels {
            if skeleton.bone_id(&channel.node_name).is_none() {
                skipped += 1;
                continue;
            }
            let (rest_scale, rest_rotation, rest_position) = rest
                .get(channel.node_name.as_str())
                .map(|m| m.to_scale_rotation_translation())
                .unwrap_or((Vec3::ONE, Quat::IDENTITY, Vec3::ZERO));

            let track = match (
                to_channel(&channel.positions, ticks_per_second, rest_position),
                to_channel(&channel.rotations, ticks_per_second, rest_rotation),
                to_channel(&channel.scales, ticks_per_second, rest_scale),
            ) {
                (Ok(p), Ok(r), Ok(s)) => BoneTrack::new(p, r, s),
                (p, r, s) => {
                    let err = p.err().or(r.err()).or(s.err());
                    return Err(in_bone(err, &channel.node_name));
                }
            };
            tracks.insert(channel.node_name.clone(), track);
        }

        // Bones the animation never keys hold their rest transform
        let mut rested = 0;
        skeleton.visit(|bone, _| {
            if tracks.contains_key(&bone.name) {
                return;
            }
            if let Some(m) = rest.get(bone.name.as_str()) {
                let (scale, rotation, position) = m.to_scale_rotation_translation();
                tracks.insert(bone.name.clone(), BoneTrack::constant(position, rotation, scale));
                rested += 1;
            }
        });
        if rested > 0 {
            log::debug!(
                "Animation '{}': {} bones without channels hold their rest pose",
                imported.name,
                rested
            );
        }

        if skipped > 0 {
            log::debug!(
                "Animation '{}': dropped {} channels targeting non-bone nodes",
                imported.name,
                skipped
            );
        }

        let global_inverse = scene.root_transform().inverse();
        log::debug!(
            "Animation '{}': {} tracks, {:.3}s at {} ticks/s",
            imported.name,
            tracks.len(),
            imported.duration / ticks_per_second,
            ticks_per_second
        );

        Ok(Self {
            name: imported.name.clone(),
            duration: imported.duration / ticks_per_second,
            ticks_per_second,
            tracks,
            global_inverse,
            bone_count: skeleton.bone_count(),
            skeleton: None,
            untracked: UntrackedBones::default(),
        })
    }

    pub fn with_global_inverse(mut self, global_inverse: Mat4) -> Self {
        self.global_inverse = global_inverse;
        self
    }

    pub fn with_skeleton(mut self, skeleton: Handle<Skeleton>) -> Self {
        self.skeleton = Some(skeleton);
        self
    }

    pub fn with_untracked_bones(mut self, policy: UntrackedBones) -> Self {
        self.untracked = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn ticks_per_second(&self) -> f32 {
        self.ticks_per_second
    }

    pub fn bone_count(&self) -> usize {
        self.bone_count
    }

    pub fn global_inverse(&self) -> Mat4 {
        self.global_inverse
    }

    /// Skeleton this animation was authored against, once registered in a resource store
    pub fn skeleton(&self) -> Option<Handle<Skeleton>> {
        self.skeleton
    }

    pub fn untracked_bones(&self) -> UntrackedBones {
        self.untracked
    }

    pub fn track(&self, bone_name: &str) -> Option<&BoneTrack> {
        self.tracks.get(bone_name)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Map any time into `[0, duration)`. Negative times wrap; a non-positive duration maps to 0.
    pub fn wrap_time(&self, time: f32) -> f32 {
        if self.duration <= 0.0 || !time.is_finite() {
            return 0.0;
        }
        let t = time.rem_euclid(self.duration);
        // rem_euclid rounds tiny negative inputs up to exactly `duration`
        if t >= self.duration {
            0.0
        } else {
            t
        }
    }

    /// `n` evenly spaced sample times `i * duration / n`
    pub fn frame_times(&self, n: usize) -> impl Iterator<Item = f32> + '_ {
        (0..n).map(move |i| i as f32 * self.duration / n as f32)
    }

    /// Evaluate the whole skeleton at `time` seconds into `pose`
    pub fn evaluate(&self, skeleton: &Skeleton, time: f32, pose: &mut Pose) -> Result<()> {
        if skeleton.bone_count() != self.bone_count {
            return Err(RigError::InvalidArgument(format!(
                "animation '{}' expects {} bones but the skeleton has {}",
                self.name,
                self.bone_count,
                skeleton.bone_count()
            )));
        }
        evaluate_pose(self, skeleton.root(), time, Mat4::IDENTITY, pose)
    }
}

fn to_channel<T: crate::track::Interpolate>(
    keys: &[ImportedKey<T>],
    ticks_per_second: f32,
    rest: T,
) -> Result<Channel<T>> {
    if keys.is_empty() {
        return Ok(Channel::constant(rest));
    }
    Channel::new(
        keys.iter().map(|k| k.time / ticks_per_second).collect(),
        keys.iter().map(|k| k.value).collect(),
    )
}

fn in_bone(err: Option<RigError>, bone: &str) -> RigError {
    match err {
        Some(RigError::MalformedAnimation(msg)) => {
            RigError::MalformedAnimation(format!("bone '{}': {}", bone, msg))
        }
        Some(other) => other,
        None => RigError::MalformedAnimation(format!("bone '{}'", bone)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;
    use rigbake_import::{ImportedBone, ImportedChannel, ImportedNode, ImportedSkin};

    fn key<T>(time: f32, value: T) -> ImportedKey<T> {
        ImportedKey { time, value }
    }

    fn scene() -> ImportedScene {
        ImportedScene {
            name: "s".into(),
            nodes: vec![
                ImportedNode {
                    name: "Hips".into(),
                    transform: Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
                    children: vec![],
                },
                ImportedNode {
                    name: "__root".into(),
                    transform: Mat4::from_scale(Vec3::splat(2.0)),
                    children: vec![0],
                },
            ],
            root: 1,
            meshes: vec![],
            skins: vec![ImportedSkin {
                name: "skin".into(),
                bones: vec![ImportedBone {
                    name: "Hips".into(),
                    offset: Mat4::IDENTITY,
                }],
            }],
            animations: vec![],
            materials: vec![],
            textures: vec![],
        }
    }

    fn imported(tps: f32, channels: Vec<ImportedChannel>) -> ImportedAnimation {
        ImportedAnimation {
            name: "walk".into(),
            duration: 50.0,
            ticks_per_second: tps,
            channels,
        }
    }

    #[test]
    fn ticks_become_seconds() {
        let scene = scene();
        let skel = Skeleton::from_imported(&scene, 0).unwrap();
        let channel = ImportedChannel {
            node_name: "Hips".into(),
            rotations: vec![key(0.0, Quat::IDENTITY), key(25.0, Quat::from_rotation_x(1.0))],
            ..Default::default()
        };
        let anim = Animation::from_imported(&imported(25.0, vec![channel]), &scene, &skel).unwrap();

        assert_eq!(anim.duration(), 2.0);
        assert_eq!(anim.bone_count(), 1);
        let track = anim.track("Hips").unwrap();
        assert_eq!(track.rotations.times(), &[0.0, 1.0]);
        // Missing position channel falls back to the node's rest translation
        assert_eq!(track.positions.sample(0.7), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(track.scales.sample(0.7), Vec3::ONE);
        assert!(anim
            .global_inverse()
            .abs_diff_eq(Mat4::from_scale(Vec3::splat(0.5)), 1e-6));
    }

    #[test]
    fn non_positive_tick_rate_uses_default() {
        let scene = scene();
        let skel = Skeleton::from_imported(&scene, 0).unwrap();
        let anim = Animation::from_imported(&imported(0.0, vec![]), &scene, &skel).unwrap();
        assert_eq!(anim.ticks_per_second(), DEFAULT_TICKS_PER_SECOND);
        assert_eq!(anim.duration(), 2.0);
    }

    #[test]
    fn malformed_channel_names_the_bone() {
        let scene = scene();
        let skel = Skeleton::from_imported(&scene, 0).unwrap();
        let channel = ImportedChannel {
            node_name: "Hips".into(),
            positions: vec![key(10.0, Vec3::ZERO), key(5.0, Vec3::ONE)],
            ..Default::default()
        };
        let err = Animation::from_imported(&imported(25.0, vec![channel]), &scene, &skel).unwrap_err();
        match err {
            RigError::MalformedAnimation(msg) => assert!(msg.contains("Hips"), "{}", msg),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn non_bone_channels_are_dropped() {
        let scene = scene();
        let skel = Skeleton::from_imported(&scene, 0).unwrap();
        let channel = ImportedChannel {
            node_name: "Camera".into(),
            positions: vec![key(0.0, Vec3::ZERO)],
            ..Default::default()
        };
        let anim = Animation::from_imported(&imported(25.0, vec![channel]), &scene, &skel).unwrap();
        assert!(anim.track("Camera").is_none());
        assert_eq!(anim.track_count(), 1);
    }

    #[test]
    fn unkeyed_bones_hold_their_rest_transform() {
        let scene = scene();
        let skel = Skeleton::from_imported(&scene, 0).unwrap();
        let anim = Animation::from_imported(&imported(25.0, vec![]), &scene, &skel).unwrap();

        let track = anim.track("Hips").unwrap();
        assert_eq!(track.end_time(), 0.0);
        assert!(track
            .local_transform(1.3)
            .abs_diff_eq(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)), 1e-6));
    }

    #[test]
    fn wrap_time_handles_negative_and_zero_duration() {
        let anim = Animation::new("a", 2.0, HashMap::new(), 0);
        assert_eq!(anim.wrap_time(0.5), 0.5);
        assert_eq!(anim.wrap_time(2.5), 0.5);
        assert_eq!(anim.wrap_time(-0.5), 1.5);
        assert_eq!(anim.wrap_time(2.0), 0.0);
        assert_eq!(anim.wrap_time(-1e-9), 0.0);

        let still = Animation::new("still", 0.0, HashMap::new(), 0);
        assert_eq!(still.wrap_time(3.0), 0.0);
    }

    #[test]
    fn frame_times_are_evenly_spaced() {
        let anim = Animation::new("a", 2.0, HashMap::new(), 0);
        let times: Vec<f32> = anim.frame_times(4).collect();
        assert_eq!(times, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(anim.frame_times(0).count(), 0);
    }

    #[test]
    fn evaluate_rejects_other_skeletons() {
        let anim = Animation::new("a", 1.0, HashMap::new(), 3);
        let skel = Skeleton::new(Bone::new(0, "root", Mat4::IDENTITY), 1).unwrap();
        let mut pose = Pose::new(3);
        assert!(matches!(
            anim.evaluate(&skel, 0.0, &mut pose),
            Err(RigError::InvalidArgument(_))
        ));
    }
}
