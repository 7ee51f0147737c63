//! GPU mesh cache: uploads meshes once, keyed by handle

use crate::primitives::GpuVertex;
use rigbake_core::{Handle, Mesh};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// A mesh resident in GPU buffers
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, mesh: &Mesh) -> Self {
        let vertices: Vec<GpuVertex> = mesh.vertices.iter().map(GpuVertex::from).collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Vertex Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Index Buffer", mesh.name)),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        }
    }
}

/// Meshes already on the GPU
#[derive(Default)]
pub struct MeshCache {
    meshes: HashMap<Handle<Mesh>, GpuMesh>,
}

impl MeshCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `mesh` unless `handle` is already cached
    pub fn ensure(&mut self, device: &wgpu::Device, handle: Handle<Mesh>, mesh: &Mesh) {
        self.meshes.entry(handle).or_insert_with(|| {
            log::debug!(
                "Uploading mesh '{}' ({} vertices, {} indices)",
                mesh.name,
                mesh.vertex_count(),
                mesh.index_count()
            );
            GpuMesh::upload(device, mesh)
        });
    }

    pub fn get(&self, handle: Handle<Mesh>) -> Option<&GpuMesh> {
        self.meshes.get(&handle)
    }
}
