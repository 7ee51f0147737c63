//! Bone hierarchy with a flat id index

use glam::Mat4;
use rigbake_core::{Result, RigError};
use rigbake_import::{ImportedScene, ImportedSkin};
use std::collections::HashMap;

/// A bone in the hierarchy. Children are owned by their parent.
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Dense index into the pose buffer (position in the skin's bone table)
    pub id: usize,
    pub name: String,
    /// Inverse bind matrix: mesh space to bone space at rest
    pub offset: Mat4,
    /// Rest transforms of the non-bone nodes between this bone and its parent bone (or the
    /// scene root), applied before the bone's own local transform
    pub pre_transform: Mat4,
    pub children: Vec<Bone>,
}

impl Bone {
    pub fn new(id: usize, name: impl Into<String>, offset: Mat4) -> Self {
        Self {
            id,
            name: name.into(),
            offset,
            pre_transform: Mat4::IDENTITY,
            children: Vec::new(),
        }
    }

    pub fn with_pre_transform(mut self, pre_transform: Mat4) -> Self {
        self.pre_transform = pre_transform;
        self
    }

    pub fn with_child(mut self, child: Bone) -> Self {
        self.children.push(child);
        self
    }
}

/// Flat per-bone entry, indexed by bone id
#[derive(Debug, Clone, PartialEq)]
pub struct BoneInfo {
    pub name: String,
    pub parent: Option<usize>,
    /// False for table entries that never appeared under the root bone
    pub in_hierarchy: bool,
}

/// Immutable bone hierarchy
#[derive(Debug, Clone)]
pub struct Skeleton {
    root: Bone,
    bone_count: usize,
    index: Vec<BoneInfo>,
    by_name: HashMap<String, usize>,
}

impl Skeleton {
    /// Wrap a bone tree. Every id must be below `bone_count` and appear once; names must be unique.
    pub fn new(root: Bone, bone_count: usize) -> Result<Self> {
        let mut index: Vec<BoneInfo> = (0..bone_count)
            .map(|id| BoneInfo {
                name: format!("bone_{}", id),
                parent: None,
                in_hierarchy: false,
            })
            .collect();
        let mut by_name = HashMap::new();

        let mut stack: Vec<(&Bone, Option<usize>)> = vec![(&root, None)];
        while let Some((bone, parent)) = stack.pop() {
            let slot = index.get_mut(bone.id).ok_or_else(|| {
                RigError::InvalidArgument(format!(
                    "bone '{}' has id {} but the skeleton has {} bones",
                    bone.name, bone.id, bone_count
                ))
            })?;
            if slot.in_hierarchy || by_name.contains_key(&bone.name) {
                return Err(RigError::DuplicateBone(bone.name.clone()));
            }
            *slot = BoneInfo {
                name: bone.name.clone(),
                parent,
                in_hierarchy: true,
            };
            by_name.insert(bone.name.clone(), bone.id);
            stack.extend(bone.children.iter().rev().map(|c| (c, Some(bone.id))));
        }

        Ok(Self {
            root,
            bone_count,
            index,
            by_name,
        })
    }

    /// Build the hierarchy for one skin of an imported scene.
    ///
    /// The first node (depth first from the scene root) whose name is in the skin's bone
    /// table becomes the root bone. Non-bone nodes are dropped from the tree and their bone
    /// descendants attach to the nearest bone ancestor; the dropped nodes' transforms, and
    /// those of every node above the root bone, become the bones' `pre_transform`.
    pub fn from_imported(scene: &ImportedScene, skin_index: usize) -> Result<Self> {
        let skin = scene.skins.get(skin_index).ok_or_else(|| {
            RigError::ResourceNotFound(format!("skin {} (scene has {})", skin_index, scene.skins.len()))
        })?;

        let mut table: HashMap<&str, usize> = HashMap::new();
        for (id, bone) in skin.bones.iter().enumerate() {
            if table.insert(bone.name.as_str(), id).is_some() {
                return Err(RigError::DuplicateBone(bone.name.clone()));
            }
        }

        let mut visited = vec![false; scene.nodes.len()];
        let (root_node, above_root) =
            find_first_bone(scene, scene.root, Mat4::IDENTITY, &table, &mut visited).ok_or_else(
                || {
                    RigError::Import(format!(
                        "skin '{}': none of its {} bones appear in the node tree",
                        skin.name,
                        skin.bones.len()
                    ))
                },
            )?;

        let mut visited = vec![false; scene.nodes.len()];
        let root = build_bone(scene, skin, &table, root_node, above_root, &mut visited);
        let skeleton = Self::new(root, skin.bones.len())?;

        let orphans = skeleton.index.iter().filter(|b| !b.in_hierarchy).count();
        if orphans > 0 {
            log::warn!(
                "skin '{}': {} of {} bones are not under root bone '{}' and will not be posed",
                skin.name,
                orphans,
                skeleton.bone_count,
                skeleton.root.name
            );
        }
        log::debug!(
            "Built skeleton for skin '{}' ({} bones, root '{}')",
            skin.name,
            skeleton.bone_count,
            skeleton.root.name
        );
        Ok(skeleton)
    }

    pub fn root(&self) -> &Bone {
        &self.root
    }

    /// Size of the bone table; pose buffers for this skeleton have this length
    pub fn bone_count(&self) -> usize {
        self.bone_count
    }

    pub fn bone_id(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn info(&self, id: usize) -> Option<&BoneInfo> {
        self.index.get(id)
    }

    pub fn parent(&self, id: usize) -> Option<usize> {
        self.index.get(id).and_then(|b| b.parent)
    }

    /// Visit every bone depth first, parents before children, with its depth below the root
    pub fn visit(&self, mut f: impl FnMut(&Bone, usize)) {
        fn walk(bone: &Bone, depth: usize, f: &mut impl FnMut(&Bone, usize)) {
            f(bone, depth);
            for child in &bone.children {
                walk(child, depth + 1, f);
            }
        }
        walk(&self.root, 0, &mut f);
    }
}

/// First bone node below `node`, with the product of the transforms of its ancestors
/// starting at `parent`
fn find_first_bone(
    scene: &ImportedScene,
    node: usize,
    parent: Mat4,
    table: &HashMap<&str, usize>,
    visited: &mut [bool],
) -> Option<(usize, Mat4)> {
    let entry = scene.nodes.get(node)?;
    if std::mem::replace(visited.get_mut(node)?, true) {
        return None;
    }
    if table.contains_key(entry.name.as_str()) {
        return Some((node, parent));
    }
    let through = parent * entry.transform;
    entry
        .children
        .iter()
        .find_map(|&child| find_first_bone(scene, child, through, table, visited))
}

fn build_bone(
    scene: &ImportedScene,
    skin: &ImportedSkin,
    table: &HashMap<&str, usize>,
    node: usize,
    pre_transform: Mat4,
    visited: &mut [bool],
) -> Bone {
    visited[node] = true;
    let name = &scene.nodes[node].name;
    let id = table[name.as_str()];
    let mut bone =
        Bone::new(id, name.clone(), skin.bones[id].offset).with_pre_transform(pre_transform);
    collect_child_bones(scene, skin, table, node, Mat4::IDENTITY, visited, &mut bone.children);
    bone
}

fn collect_child_bones(
    scene: &ImportedScene,
    skin: &ImportedSkin,
    table: &HashMap<&str, usize>,
    node: usize,
    skipped: Mat4,
    visited: &mut [bool],
    out: &mut Vec<Bone>,
) {
    for &child in &scene.nodes[node].children {
        let Some(child_node) = scene.nodes.get(child) else {
            continue;
        };
        if visited[child] {
            continue;
        }
        if table.contains_key(child_node.name.as_str()) {
            out.push(build_bone(scene, skin, table, child, skipped, visited));
        } else {
            visited[child] = true;
            let through = skipped * child_node.transform;
            collect_child_bones(scene, skin, table, child, through, visited, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rigbake_import::{ImportedBone, ImportedNode};

    fn node(name: &str, children: Vec<usize>) -> ImportedNode {
        ImportedNode {
            name: name.into(),
            transform: Mat4::IDENTITY,
            children,
        }
    }

    fn bone(name: &str) -> ImportedBone {
        ImportedBone {
            name: name.into(),
            offset: Mat4::IDENTITY,
        }
    }

    /// root(5) → Armature(0) → Hips(1) → Helper(2) → Spine(3); Body(4) is a plain mesh node
    fn rig_scene(bones: Vec<ImportedBone>) -> ImportedScene {
        ImportedScene {
            name: "rig".into(),
            nodes: vec![
                node("Armature", vec![1, 4]),
                node("Hips", vec![2]),
                node("Helper", vec![3]),
                node("Spine", vec![]),
                node("Body", vec![]),
                node("__root", vec![0]),
            ],
            root: 5,
            meshes: vec![],
            skins: vec![ImportedSkin {
                name: "skin".into(),
                bones,
            }],
            animations: vec![],
            materials: vec![],
            textures: vec![],
        }
    }

    #[test]
    fn non_bone_nodes_are_skipped() {
        let mut spine = bone("Spine");
        spine.offset = Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0));
        let scene = rig_scene(vec![spine, bone("Hips")]);
        let skel = Skeleton::from_imported(&scene, 0).unwrap();

        assert_eq!(skel.bone_count(), 2);
        assert_eq!(skel.root().name, "Hips");
        assert_eq!(skel.root().id, 1);
        assert_eq!(skel.root().children.len(), 1);

        let spine = &skel.root().children[0];
        assert_eq!(spine.name, "Spine");
        assert_eq!(spine.id, 0);
        assert_eq!(spine.offset, Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)));

        assert_eq!(skel.parent(0), Some(1));
        assert_eq!(skel.parent(1), None);
        assert_eq!(skel.bone_id("Spine"), Some(0));
        assert_eq!(skel.bone_id("Helper"), None);
    }

    #[test]
    fn skipped_node_transforms_become_pre_transforms() {
        let mut scene = rig_scene(vec![bone("Spine"), bone("Hips")]);
        let armature = Mat4::from_scale_rotation_translation(
            Vec3::splat(0.01),
            glam::Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
            Vec3::ZERO,
        );
        let world = Mat4::from_translation(Vec3::new(0.0, 0.0, 3.0));
        let helper = Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0));
        scene.nodes[5].transform = world;
        scene.nodes[0].transform = armature;
        scene.nodes[2].transform = helper;
        // Bone transforms are not part of anyone's pre-transform
        scene.nodes[1].transform = Mat4::from_scale(Vec3::splat(7.0));

        let skel = Skeleton::from_imported(&scene, 0).unwrap();
        assert!(skel.root().pre_transform.abs_diff_eq(world * armature, 1e-6));
        let spine = &skel.root().children[0];
        assert!(spine.pre_transform.abs_diff_eq(helper, 1e-6));
    }

    #[test]
    fn duplicate_bone_names_are_rejected() {
        let scene = rig_scene(vec![bone("Hips"), bone("Hips")]);
        let err = Skeleton::from_imported(&scene, 0).unwrap_err();
        assert!(matches!(err, RigError::DuplicateBone(name) if name == "Hips"));
    }

    #[test]
    fn missing_skin_or_bones_is_an_error() {
        let scene = rig_scene(vec![bone("Tail")]);
        assert!(matches!(
            Skeleton::from_imported(&scene, 0),
            Err(RigError::Import(_))
        ));
        assert!(matches!(
            Skeleton::from_imported(&scene, 3),
            Err(RigError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn bones_outside_the_root_are_flagged() {
        let scene = rig_scene(vec![bone("Hips"), bone("Spine"), bone("Tail")]);
        let skel = Skeleton::from_imported(&scene, 0).unwrap();
        assert_eq!(skel.bone_count(), 3);
        assert!(skel.info(1).unwrap().in_hierarchy);
        assert!(!skel.info(2).unwrap().in_hierarchy);
    }

    #[test]
    fn new_validates_ids() {
        let root = Bone::new(0, "root", Mat4::IDENTITY).with_child(Bone::new(4, "child", Mat4::IDENTITY));
        assert!(matches!(
            Skeleton::new(root, 2),
            Err(RigError::InvalidArgument(_))
        ));

        let root = Bone::new(0, "root", Mat4::IDENTITY).with_child(Bone::new(0, "child", Mat4::IDENTITY));
        assert!(matches!(Skeleton::new(root, 2), Err(RigError::DuplicateBone(_))));
    }

    #[test]
    fn visit_is_depth_first() {
        let root = Bone::new(0, "a", Mat4::IDENTITY)
            .with_child(Bone::new(1, "b", Mat4::IDENTITY).with_child(Bone::new(2, "c", Mat4::IDENTITY)))
            .with_child(Bone::new(3, "d", Mat4::IDENTITY));
        let skel = Skeleton::new(root, 4).unwrap();

        let mut seen = Vec::new();
        skel.visit(|bone, depth| seen.push((bone.name.clone(), depth)));
        assert_eq!(
            seen,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2),
                ("d".to_string(), 1)
            ]
        );
    }
}
