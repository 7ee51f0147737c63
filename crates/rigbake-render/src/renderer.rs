//! Offscreen scene renderer

use crate::gpu_mesh::MeshCache;
use crate::headless::{HeadlessContext, RenderError};
use crate::pipeline::{FrameUniforms, LightUniforms, LinePipeline, MaterialUniforms};
use crate::primitives::bounds_lines;
use crate::resources::ResourceStore;
use crate::scene::{ModelInstance, Scene};
use crate::skinned_pipeline::{SkinnedPipeline, BONE_MATRIX_SIZE, MAX_BONES};
use crate::texture_cache::{create_sampler, ColorSpace, TextureCache};
use glam::{Mat4, Vec3};
use rigbake_core::{Handle, Material, MaterialKind, Result, RigError, Texture};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// Overlay color for the bounding box wireframe
pub const BOUNDS_COLOR: [f32; 3] = [1.0, 0.85, 0.1];

/// Anything that can turn a scene into pixels
pub trait FrameRenderer {
    /// Output size in pixels
    fn size(&self) -> (u32, u32);

    /// Draw `scene` and return the finished frame
    fn render(&mut self, scene: &Scene, resources: &ResourceStore) -> Result<image::RgbaImage>;
}

struct MaterialBinding {
    _uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Renders scenes into an offscreen texture with the skinned Phong pipeline
pub struct HeadlessRenderer {
    ctx: HeadlessContext,
    skinned: SkinnedPipeline,
    lines: LinePipeline,
    frame_buffer: wgpu::Buffer,
    light_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    bone_buffer: wgpu::Buffer,
    bone_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,
    meshes: MeshCache,
    textures: TextureCache,
    materials: HashMap<Handle<Material>, MaterialBinding>,
}

impl HeadlessRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RigError::InvalidArgument(format!(
                "render target must not be empty ({}x{})",
                width, height
            )));
        }
        let ctx = pollster::block_on(HeadlessContext::new(width, height))?;
        let device = &ctx.device;

        let skinned = SkinnedPipeline::new(device);
        let lines = LinePipeline::new(device, &skinned.frame_bind_group_layout);

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Uniform Buffer"),
            size: std::mem::size_of::<LightUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Bind Group"),
            layout: &skinned.frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: light_buffer.as_entire_binding(),
                },
            ],
        });

        let bone_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Bone Matrix Buffer"),
            size: MAX_BONES as u64 * BONE_MATRIX_SIZE,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bone_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Bone Bind Group"),
            layout: &skinned.bone_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: bone_buffer.as_entire_binding(),
            }],
        });

        let sampler = create_sampler(device);

        log::info!("Headless renderer ready ({}x{})", width, height);

        Ok(Self {
            ctx,
            skinned,
            lines,
            frame_buffer,
            light_buffer,
            frame_bind_group,
            bone_buffer,
            bone_bind_group,
            sampler,
            meshes: MeshCache::new(),
            textures: TextureCache::new(),
            materials: HashMap::new(),
        })
    }

    /// Upload the textures a material samples and build its bind group
    fn prepare_material(
        &mut self,
        handle: Handle<Material>,
        resources: &ResourceStore,
    ) -> Result<()> {
        if self.materials.contains_key(&handle) {
            return Ok(());
        }
        let material = resources
            .materials
            .get(handle)
            .ok_or_else(|| RigError::ResourceNotFound(format!("material {:?}", handle)))?;

        let white = resources.white_texture();
        let flat = resources.flat_normal_texture();
        // Slots: diffuse, normal, specular, emission
        let slots: [Handle<Texture>; 4] = match &material.kind {
            MaterialKind::Phong {
                diffuse,
                normal,
                specular,
                emission,
                ..
            } => [*diffuse, *normal, *specular, *emission],
            MaterialKind::Color { .. } => [white, flat, white, white],
            // Unlit modes only read the diffuse slot
            MaterialKind::TextureOnly { texture, .. } => [*texture, flat, white, white],
        };
        let spaces = [
            ColorSpace::Srgb,
            ColorSpace::Linear,
            ColorSpace::Srgb,
            ColorSpace::Srgb,
        ];

        for (texture, space) in slots.iter().zip(spaces) {
            let data = resources
                .textures
                .get(*texture)
                .ok_or_else(|| RigError::ResourceNotFound(format!("texture {:?}", texture)))?;
            self.textures
                .ensure(&self.ctx.device, &self.ctx.queue, *texture, data, space)?;
        }

        let uniforms = MaterialUniforms::from_kind(&material.kind);
        let uniform_buffer =
            self.ctx
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Material Uniforms", material.name)),
                    contents: bytemuck::bytes_of(&uniforms),
                    usage: wgpu::BufferUsages::UNIFORM,
                });

        let mut views = Vec::with_capacity(4);
        for (texture, space) in slots.iter().zip(spaces) {
            let gpu = self.textures.get(*texture, space).ok_or_else(|| {
                RenderError::InvalidTexture(format!("{:?} was not uploaded", texture))
            })?;
            views.push(&gpu.view);
        }

        let bind_group = self
            .ctx
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{} Material Bind Group", material.name)),
                layout: &self.skinned.material_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(views[0]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(views[1]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(views[2]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(views[3]),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

        log::debug!(
            "Prepared material '{}' ({})",
            material.name,
            material.kind_label()
        );
        self.materials.insert(
            handle,
            MaterialBinding {
                _uniforms: uniform_buffer,
                bind_group,
            },
        );
        Ok(())
    }

    /// Write the skin matrices for one model. Static models get identity for every bone
    /// their mesh references.
    fn write_bones(&self, model: &ModelInstance, referenced: usize) -> Result<()> {
        let pose = model.pose();
        let matrices = if pose.is_empty() {
            vec![Mat4::IDENTITY.to_cols_array_2d(); referenced.clamp(1, MAX_BONES)]
        } else {
            pose.to_gpu()
        };
        if matrices.len() > MAX_BONES {
            return Err(RenderError::TooManyBones(matrices.len(), MAX_BONES).into());
        }
        self.ctx
            .queue
            .write_buffer(&self.bone_buffer, 0, bytemuck::cast_slice(&matrices));
        Ok(())
    }

    /// Returns false when the model has nothing to draw
    fn draw_model(
        &mut self,
        model: &ModelInstance,
        resources: &ResourceStore,
        view_proj: Mat4,
        camera_pos: Vec3,
        clear: Option<wgpu::Color>,
    ) -> Result<bool> {
        let mesh = resources.meshes.get(model.mesh).ok_or_else(|| {
            RigError::ResourceNotFound(format!("mesh {:?} of '{}'", model.mesh, model.name))
        })?;
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            log::warn!("Skipping '{}': mesh '{}' is empty", model.name, mesh.name);
            return Ok(false);
        }
        self.meshes.ensure(&self.ctx.device, model.mesh, mesh);
        self.prepare_material(model.material, resources)?;

        let referenced = mesh.max_bone_id().map_or(0, |id| id as usize + 1);
        self.write_bones(model, referenced)?;

        let uniforms = FrameUniforms::new(view_proj, model.model_matrix(), camera_pos);
        self.ctx
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));

        let (Some(gpu_mesh), Some(material)) = (
            self.meshes.get(model.mesh),
            self.materials.get(&model.material),
        ) else {
            return Err(RigError::Render(format!(
                "GPU resources for '{}' are missing",
                model.name
            )));
        };

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Model Encoder"),
            });
        {
            let mut pass = target_pass(&mut encoder, &self.ctx, "Model Pass", clear);
            pass.set_pipeline(&self.skinned.pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(1, &material.bind_group, &[]);
            pass.set_bind_group(2, &self.bone_bind_group, &[]);
            pass.set_vertex_buffer(0, gpu_mesh.vertex_buffer.slice(..));
            pass.set_index_buffer(gpu_mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..gpu_mesh.index_count, 0, 0..1);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
        Ok(true)
    }

    fn draw_bounds(&self, bounds: &rigbake_core::Aabb, view_proj: Mat4, camera_pos: Vec3) {
        let vertices = bounds_lines(bounds, BOUNDS_COLOR);
        let vertex_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bounds Vertex Buffer"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        // Bounds are already in world space
        let uniforms = FrameUniforms::new(view_proj, Mat4::IDENTITY, camera_pos);
        self.ctx
            .queue
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Bounds Encoder"),
            });
        {
            let mut pass = target_pass(&mut encoder, &self.ctx, "Bounds Pass", None);
            pass.set_pipeline(&self.lines.pipeline);
            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.draw(0..vertices.len() as u32, 0..1);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }

    fn clear_only(&self, color: wgpu::Color) {
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Clear Encoder"),
            });
        drop(target_pass(&mut encoder, &self.ctx, "Clear Pass", Some(color)));
        self.ctx.queue.submit(std::iter::once(encoder.finish()));
    }
}

impl FrameRenderer for HeadlessRenderer {
    fn size(&self) -> (u32, u32) {
        (self.ctx.width, self.ctx.height)
    }

    fn render(&mut self, scene: &Scene, resources: &ResourceStore) -> Result<image::RgbaImage> {
        let view_proj = scene.camera.view_projection_matrix();
        let camera_pos = scene.camera.position;

        let lights = LightUniforms::from_lights(&scene.lights);
        self.ctx
            .queue
            .write_buffer(&self.light_buffer, 0, bytemuck::bytes_of(&lights));

        let [r, g, b, a] = scene.clear_color;
        let clear_color = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        };

        // Uniforms are rewritten per model, so each model is its own submission.
        // Only the first drawn one clears.
        let mut clear = Some(clear_color);
        for model in &scene.models {
            if self.draw_model(model, resources, view_proj, camera_pos, clear)? {
                clear = None;
            }
        }
        if let Some(color) = clear {
            self.clear_only(color);
        }

        if let Some(bounds) = &scene.bounds_overlay {
            self.draw_bounds(bounds, view_proj, camera_pos);
        }

        Ok(self.ctx.read_image()?)
    }
}

/// Begin a pass on the offscreen targets, clearing color and depth when `clear` is set
fn target_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    ctx: &HeadlessContext,
    label: &str,
    clear: Option<wgpu::Color>,
) -> wgpu::RenderPass<'e> {
    let (color_load, depth_load) = match clear {
        Some(color) => (wgpu::LoadOp::Clear(color), wgpu::LoadOp::Clear(1.0)),
        None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
    };
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: &ctx.color_view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: color_load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
            view: &ctx.depth_view,
            depth_ops: Some(wgpu::Operations {
                load: depth_load,
                store: wgpu::StoreOp::Store,
            }),
            stencil_ops: None,
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}
