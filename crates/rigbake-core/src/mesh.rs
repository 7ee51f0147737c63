//! Skinned mesh data

use glam::{Vec2, Vec3};

/// Maximum number of bones that may influence a single vertex
pub const MAX_BONE_INFLUENCE: usize = 4;

/// A mesh vertex with up to four bone influences
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub color: Vec3,
    pub uv: Vec2,
    pub bone_ids: [u32; MAX_BONE_INFLUENCE],
    /// Influence weights; not renormalised on import
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            normal: Vec3::ZERO,
            tangent: Vec3::ZERO,
            bitangent: Vec3::ZERO,
            color: Vec3::ONE,
            uv: Vec2::ZERO,
            bone_ids: [0; MAX_BONE_INFLUENCE],
            weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }
}

impl Vertex {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// A vertex whose first influence weight is exactly zero ignores the skeleton
    pub fn is_rigid(&self) -> bool {
        self.weights[0] == 0.0
    }

    /// Iterate the `(bone_id, weight)` pairs that carry a nonzero weight
    pub fn influences(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.bone_ids
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
            .filter(|(_, w)| *w != 0.0)
    }
}

/// An immutable triangle mesh
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// True if any vertex is bound to the skeleton
    pub fn is_skinned(&self) -> bool {
        self.vertices.iter().any(|v| !v.is_rigid())
    }

    /// Largest bone id referenced with a nonzero weight
    pub fn max_bone_id(&self) -> Option<u32> {
        self.vertices
            .iter()
            .flat_map(|v| v.influences().map(|(id, _)| id))
            .max()
    }
}
