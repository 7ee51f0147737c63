//! World-space bounding volume of a skinned mesh over an animation

use crate::animation::Animation;
use crate::pose::Pose;
use crate::skeleton::Skeleton;
use glam::Mat4;
use rigbake_core::{Aabb, Mesh, Result, RigError};

/// Bound `mesh` under `model` across `samples` evenly spaced poses of `rig`.
///
/// Sample times are `i * duration / samples`. Without a rig the mesh is bounded once in
/// its rest pose. The result is exact for the sampled poses only; motion between samples
/// may leave the box.
pub fn compute_bounding_volume(
    mesh: &Mesh,
    rig: Option<(&Animation, &Skeleton)>,
    model: Mat4,
    samples: usize,
) -> Result<Aabb> {
    if samples == 0 {
        return Err(RigError::InvalidArgument(
            "bounding volume needs at least one sample".into(),
        ));
    }
    if mesh.vertices.is_empty() {
        return Err(RigError::EmptyMesh(mesh.name.clone()));
    }

    let mut bounds = Aabb::EMPTY;

    let Some((animation, skeleton)) = rig else {
        for v in &mesh.vertices {
            bounds.include(model.transform_point3(v.position));
        }
        return Ok(bounds);
    };

    let bone_count = animation.bone_count();
    if let Some(id) = mesh
        .vertices
        .iter()
        .filter(|v| !v.is_rigid())
        .flat_map(|v| v.influences().map(|(id, _)| id))
        .find(|&id| id as usize >= bone_count)
    {
        return Err(RigError::MalformedMesh(format!(
            "mesh '{}' references bone {} but the skeleton has {} bones",
            mesh.name, id, bone_count
        )));
    }

    let mut pose = Pose::new(bone_count);
    for time in animation.frame_times(samples) {
        animation.evaluate(skeleton, time, &mut pose)?;
        for v in &mesh.vertices {
            let skin = pose.skin_matrix(v)?;
            let world = model * skin * v.position.extend(1.0);
            bounds.include(world.truncate());
        }
    }

    log::debug!(
        "Bounds of '{}' over {} samples of '{}': {}",
        mesh.name,
        samples,
        animation.name(),
        bounds
    );
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;
    use crate::track::{BoneTrack, Channel};
    use glam::{Quat, Vec3};
    use rigbake_core::Vertex;
    use std::collections::HashMap;

    fn skinned(position: Vec3, bone: u32) -> Vertex {
        let mut v = Vertex::at(position);
        v.bone_ids = [bone, 0, 0, 0];
        v.weights = [1.0, 0.0, 0.0, 0.0];
        v
    }

    /// Unit triangle bound to bone 1, which swings along X then Y over 2 seconds
    fn fixture() -> (Mesh, Animation, Skeleton) {
        let mesh = Mesh {
            name: "tri".into(),
            vertices: vec![
                skinned(Vec3::ZERO, 1),
                skinned(Vec3::X, 1),
                skinned(Vec3::Y, 1),
            ],
            indices: vec![0, 1, 2],
        };
        let skeleton = Skeleton::new(
            Bone::new(0, "root", Mat4::IDENTITY).with_child(Bone::new(1, "arm", Mat4::IDENTITY)),
            2,
        )
        .unwrap();
        let track = BoneTrack::new(
            Channel::new(
                vec![0.0, 0.5, 1.0, 1.5],
                vec![
                    Vec3::ZERO,
                    Vec3::new(3.0, 0.0, 0.0),
                    Vec3::new(0.0, 3.0, 0.0),
                    Vec3::new(0.0, 0.0, -2.0),
                ],
            )
            .unwrap(),
            Channel::constant(Quat::IDENTITY),
            Channel::constant(Vec3::ONE),
        );
        let anim = Animation::new("swing", 2.0, HashMap::from([("arm".to_string(), track)]), 2);
        (mesh, anim, skeleton)
    }

    #[test]
    fn static_mesh_uses_model_matrix_only() {
        let (mesh, _, _) = fixture();
        let model = Mat4::from_translation(Vec3::new(0.0, 0.0, 5.0));
        let b = compute_bounding_volume(&mesh, None, model, 1).unwrap();
        assert_eq!(b.min, Vec3::new(0.0, 0.0, 5.0));
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 5.0));
    }

    #[test]
    fn animated_bounds_cover_sampled_poses() {
        let (mesh, anim, skel) = fixture();
        let b = compute_bounding_volume(&mesh, Some((&anim, &skel)), Mat4::IDENTITY, 4).unwrap();
        // Samples at 0, 0.5, 1.0, 1.5 hit every key exactly
        assert!(b.min.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-6));
        assert!(b.max.abs_diff_eq(Vec3::new(4.0, 4.0, 0.0), 1e-6));
    }

    #[test]
    fn more_samples_never_shrink_bounds() {
        let (mesh, anim, skel) = fixture();
        let four = compute_bounding_volume(&mesh, Some((&anim, &skel)), Mat4::IDENTITY, 4).unwrap();
        let eight = compute_bounding_volume(&mesh, Some((&anim, &skel)), Mat4::IDENTITY, 8).unwrap();
        assert!(eight.contains(&four, 1e-6));
    }

    #[test]
    fn one_sample_is_the_first_pose() {
        let (mesh, anim, skel) = fixture();
        let b = compute_bounding_volume(&mesh, Some((&anim, &skel)), Mat4::IDENTITY, 1).unwrap();
        assert_eq!(b.min, Vec3::ZERO);
        assert_eq!(b.max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn rigid_vertices_ignore_the_skeleton() {
        let (mut mesh, anim, skel) = fixture();
        let mut rigid = Vertex::at(Vec3::new(-1.0, -1.0, -1.0));
        rigid.bone_ids = [1, 1, 0, 0];
        rigid.weights = [0.0, 1.0, 0.0, 0.0];
        mesh.vertices.push(rigid);
        let b = compute_bounding_volume(&mesh, Some((&anim, &skel)), Mat4::IDENTITY, 4).unwrap();
        assert_eq!(b.min, Vec3::new(-1.0, -1.0, -2.0));
    }

    /// Hips rests at y=1 and is never keyed; Spine rests one unit above it and is keyed
    /// at exactly that rest value
    #[test]
    fn unkeyed_parent_keeps_its_rest_transform() {
        use rigbake_import::{
            ImportedAnimation, ImportedBone, ImportedChannel, ImportedKey, ImportedNode,
            ImportedScene, ImportedSkin,
        };

        let up = |y: f32| Mat4::from_translation(Vec3::new(0.0, y, 0.0));
        let scene = ImportedScene {
            name: "rest".into(),
            nodes: vec![
                ImportedNode {
                    name: "Hips".into(),
                    transform: up(1.0),
                    children: vec![1],
                },
                ImportedNode {
                    name: "Spine".into(),
                    transform: up(1.0),
                    children: vec![],
                },
                ImportedNode {
                    name: "__root".into(),
                    transform: Mat4::IDENTITY,
                    children: vec![0],
                },
            ],
            root: 2,
            meshes: vec![],
            skins: vec![ImportedSkin {
                name: "skin".into(),
                bones: vec![
                    ImportedBone {
                        name: "Hips".into(),
                        offset: up(-1.0),
                    },
                    ImportedBone {
                        name: "Spine".into(),
                        offset: up(-2.0),
                    },
                ],
            }],
            animations: vec![],
            materials: vec![],
            textures: vec![],
        };
        let imported = ImportedAnimation {
            name: "idle".into(),
            duration: 1.0,
            ticks_per_second: 1.0,
            channels: vec![ImportedChannel {
                node_name: "Spine".into(),
                positions: vec![
                    ImportedKey {
                        time: 0.0,
                        value: Vec3::new(0.0, 1.0, 0.0),
                    },
                    ImportedKey {
                        time: 1.0,
                        value: Vec3::new(0.0, 1.0, 0.0),
                    },
                ],
                ..Default::default()
            }],
        };

        let skeleton = Skeleton::from_imported(&scene, 0).unwrap();
        let animation = Animation::from_imported(&imported, &scene, &skeleton).unwrap();
        let mesh = Mesh {
            name: "torso".into(),
            vertices: vec![skinned(Vec3::new(0.0, 2.0, 0.0), 1)],
            indices: vec![0, 0, 0],
        };

        let b = compute_bounding_volume(&mesh, Some((&animation, &skeleton)), Mat4::IDENTITY, 4)
            .unwrap();
        assert!(b.min.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5), "{}", b);
        assert!(b.max.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5), "{}", b);
    }

    #[test]
    fn rejects_bad_input() {
        let (mesh, anim, skel) = fixture();
        assert!(matches!(
            compute_bounding_volume(&mesh, Some((&anim, &skel)), Mat4::IDENTITY, 0),
            Err(RigError::InvalidArgument(_))
        ));

        let empty = Mesh {
            name: "empty".into(),
            ..Default::default()
        };
        assert!(matches!(
            compute_bounding_volume(&empty, None, Mat4::IDENTITY, 1),
            Err(RigError::EmptyMesh(_))
        ));

        let mut stray = mesh.clone();
        stray.vertices.push(skinned(Vec3::ZERO, 5));
        assert!(matches!(
            compute_bounding_volume(&stray, Some((&anim, &skel)), Mat4::IDENTITY, 2),
            Err(RigError::MalformedMesh(_))
        ));
    }
}
