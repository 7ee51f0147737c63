//! Import result types

use glam::{Mat4, Quat, Vec3};
use rigbake_core::{Aabb, Mesh, Vertex};

/// Result of importing a file
#[derive(Debug, Clone)]
pub struct ImportedScene {
    /// Source name (file stem)
    pub name: String,
    /// Scene graph nodes; `children` index into this list
    pub nodes: Vec<ImportedNode>,
    /// Index of the single root node every other node hangs from
    pub root: usize,
    /// Extracted mesh primitives
    pub meshes: Vec<ImportedMesh>,
    /// Extracted skins (bone tables)
    pub skins: Vec<ImportedSkin>,
    /// Extracted animations, timestamps in ticks
    pub animations: Vec<ImportedAnimation>,
    /// Extracted materials
    pub materials: Vec<ImportedMaterial>,
    /// Extracted textures, converted to RGBA8
    pub textures: Vec<ImportedTexture>,
}

impl ImportedScene {
    pub fn root_node(&self) -> &ImportedNode {
        &self.nodes[self.root]
    }

    /// Local transform of the root node; its inverse maps poses back into mesh space
    pub fn root_transform(&self) -> Mat4 {
        self.root_node().transform
    }

    /// Index of the first mesh bound to a skin, if any
    pub fn first_skinned_mesh(&self) -> Option<usize> {
        self.meshes.iter().position(|m| m.skin_index.is_some())
    }

    /// Combined rest-pose bounding box across all meshes
    pub fn bounds(&self) -> Option<Aabb> {
        let aabb = Aabb::from_points(
            self.meshes
                .iter()
                .flat_map(|m| m.vertices.iter().map(|v| v.position)),
        );
        (!aabb.is_empty()).then_some(aabb)
    }
}

/// A node from the source scene graph
#[derive(Debug, Clone)]
pub struct ImportedNode {
    pub name: String,
    /// Local transform relative to the parent node
    pub transform: Mat4,
    pub children: Vec<usize>,
}

/// A single mesh primitive with skinning data
#[derive(Debug, Clone)]
pub struct ImportedMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material_index: Option<usize>,
    /// Index into `ImportedScene::skins`
    pub skin_index: Option<usize>,
}

impl ImportedMesh {
    /// Convert into the runtime mesh type
    pub fn to_mesh(&self) -> Mesh {
        Mesh {
            name: self.name.clone(),
            vertices: self.vertices.clone(),
            indices: self.indices.clone(),
        }
    }
}

/// One entry of a skin's bone table
#[derive(Debug, Clone)]
pub struct ImportedBone {
    /// Name of the scene node that drives this bone
    pub name: String,
    /// Inverse bind matrix (mesh space to bone space at rest)
    pub offset: Mat4,
}

/// A bone table. A bone's id is its position in `bones`.
#[derive(Debug, Clone)]
pub struct ImportedSkin {
    pub name: String,
    pub bones: Vec<ImportedBone>,
}

/// A timestamped keyframe value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportedKey<T> {
    /// Time in ticks
    pub time: f32,
    pub value: T,
}

/// All keys targeting one node, grouped by property
#[derive(Debug, Clone, Default)]
pub struct ImportedChannel {
    pub node_name: String,
    pub positions: Vec<ImportedKey<Vec3>>,
    pub rotations: Vec<ImportedKey<Quat>>,
    pub scales: Vec<ImportedKey<Vec3>>,
}

/// A complete animation as authored
#[derive(Debug, Clone)]
pub struct ImportedAnimation {
    pub name: String,
    /// Duration in ticks
    pub duration: f32,
    pub ticks_per_second: f32,
    pub channels: Vec<ImportedChannel>,
}

/// An imported material. Texture fields index into `ImportedScene::textures`.
#[derive(Debug, Clone)]
pub struct ImportedMaterial {
    pub name: String,
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
    pub base_color_texture: Option<usize>,
    pub normal_texture: Option<usize>,
    pub emissive_texture: Option<usize>,
}

/// An imported texture
#[derive(Debug, Clone)]
pub struct ImportedTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8
    pub pixels: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene_with(meshes: Vec<ImportedMesh>) -> ImportedScene {
        ImportedScene {
            name: "test".into(),
            nodes: vec![ImportedNode {
                name: "root".into(),
                transform: Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)),
                children: vec![],
            }],
            root: 0,
            meshes,
            skins: vec![],
            animations: vec![],
            materials: vec![],
            textures: vec![],
        }
    }

    fn mesh(positions: &[Vec3], skin_index: Option<usize>) -> ImportedMesh {
        ImportedMesh {
            name: "m".into(),
            vertices: positions.iter().map(|p| Vertex::at(*p)).collect(),
            indices: vec![],
            material_index: None,
            skin_index,
        }
    }

    #[test]
    fn bounds_cover_all_meshes() {
        let scene = scene_with(vec![
            mesh(&[Vec3::ZERO, Vec3::ONE], None),
            mesh(&[Vec3::new(-2.0, 0.0, 0.0)], Some(0)),
        ]);
        let b = scene.bounds().unwrap();
        assert_eq!(b.min, Vec3::new(-2.0, 0.0, 0.0));
        assert_eq!(b.max, Vec3::ONE);
        assert_eq!(scene.first_skinned_mesh(), Some(1));
    }

    #[test]
    fn empty_scene_has_no_bounds() {
        let scene = scene_with(vec![]);
        assert!(scene.bounds().is_none());
        assert!(scene.first_skinned_mesh().is_none());
        assert_eq!(
            scene.root_transform(),
            Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0))
        );
    }
}
