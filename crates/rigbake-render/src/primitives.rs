//! GPU vertex layouts

use bytemuck::{Pod, Zeroable};
use rigbake_core::{Aabb, Vertex};

/// Skinned vertex as laid out in the vertex buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
    pub bone_ids: [u32; 4],
    pub weights: [f32; 4],
}

impl GpuVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 8] = wgpu::vertex_attr_array![
        0 => Float32x3,   // position
        1 => Float32x3,   // normal
        2 => Float32x3,   // tangent
        3 => Float32x3,   // bitangent
        4 => Float32x3,   // color
        5 => Float32x2,   // uv
        6 => Uint32x4,    // bone_ids
        7 => Float32x4,   // weights
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            position: v.position.to_array(),
            normal: v.normal.to_array(),
            tangent: v.tangent.to_array(),
            bitangent: v.bitangent.to_array(),
            color: v.color.to_array(),
            uv: v.uv.to_array(),
            bone_ids: v.bone_ids,
            weights: v.weights,
        }
    }
}

/// Colored line-list vertex for debug overlays
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3,   // position
        1 => Float32x3,   // color
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// The 12 edges of a box as a line list (24 vertices)
pub fn bounds_lines(bounds: &Aabb, color: [f32; 3]) -> Vec<LineVertex> {
    bounds
        .edges()
        .iter()
        .flat_map(|(a, b)| {
            [
                LineVertex {
                    position: a.to_array(),
                    color,
                },
                LineVertex {
                    position: b.to_array(),
                    color,
                },
            ]
        })
        .collect()
}
