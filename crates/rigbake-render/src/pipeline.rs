//! Uniform layouts and the debug line pipeline

use crate::headless::{COLOR_FORMAT, DEPTH_FORMAT};
use crate::primitives::LineVertex;
use crate::scene::PointLight;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use rigbake_core::MaterialKind;

/// Lights the shader reads; extra scene lights are ignored
pub const MAX_LIGHTS: usize = 4;

/// Per-draw transform uniforms (bind group 0, binding 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
}

impl FrameUniforms {
    pub fn new(view_proj: Mat4, model: Mat4, camera_pos: Vec3) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GpuPointLight {
    pub position: [f32; 4],
    /// rgb color, intensity in w
    pub color: [f32; 4],
}

/// Scene lights (bind group 0, binding 1)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniforms {
    pub lights: [GpuPointLight; MAX_LIGHTS],
    pub count: u32,
    pub _pad: [u32; 3],
}

impl LightUniforms {
    pub fn from_lights(lights: &[PointLight]) -> Self {
        if lights.len() > MAX_LIGHTS {
            log::warn!(
                "Scene has {} lights; only the first {} are used",
                lights.len(),
                MAX_LIGHTS
            );
        }
        let mut uniforms = Self::zeroed();
        for (slot, light) in uniforms.lights.iter_mut().zip(lights) {
            *slot = GpuPointLight {
                position: light.position.extend(1.0).to_array(),
                color: light.color.extend(light.intensity).to_array(),
            };
        }
        uniforms.count = lights.len().min(MAX_LIGHTS) as u32;
        uniforms
    }
}

/// Shading mode selector shared with the shader
pub const MODE_PHONG: u32 = 0;
pub const MODE_COLOR: u32 = 1;
pub const MODE_TEXTURE: u32 = 2;

/// Material parameters (bind group 1, binding 0)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    pub ka: [f32; 4],
    pub kd: [f32; 4],
    pub ks: [f32; 4],
    pub ke: [f32; 4],
    pub mode: u32,
    pub specular_power: f32,
    pub _pad: [f32; 2],
}

impl MaterialUniforms {
    pub fn from_kind(kind: &MaterialKind) -> Self {
        let v4 = |v: Vec3| v.extend(1.0).to_array();
        let mut uniforms = Self::zeroed();
        match kind {
            MaterialKind::Phong {
                ka,
                kd,
                ks,
                ke,
                specular_power,
                ..
            } => {
                uniforms.ka = v4(*ka);
                uniforms.kd = v4(*kd);
                uniforms.ks = v4(*ks);
                uniforms.ke = v4(*ke);
                uniforms.specular_power = *specular_power;
                uniforms.mode = MODE_PHONG;
            }
            MaterialKind::Color { color } => {
                uniforms.ka = v4(*color * 0.2);
                uniforms.kd = v4(*color);
                uniforms.specular_power = 1.0;
                uniforms.mode = MODE_COLOR;
            }
            MaterialKind::TextureOnly { .. } => {
                uniforms.specular_power = 1.0;
                uniforms.mode = MODE_TEXTURE;
            }
        }
        uniforms
    }
}

/// Line-list pipeline for the bounding-box overlay. Shares bind group 0 with the mesh pipeline.
pub struct LinePipeline {
    pub pipeline: wgpu::RenderPipeline,
}

impl LinePipeline {
    pub fn new(device: &wgpu::Device, frame_bind_group_layout: &wgpu::BindGroupLayout) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("line_shader.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[frame_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_line"),
                buffers: &[LineVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_line"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self { pipeline }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigbake_core::{Material, ResourceTable, Texture, TextureChannel};

    #[test]
    fn uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 208);
        assert_eq!(std::mem::size_of::<LightUniforms>(), 144);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 80);
    }

    #[test]
    fn lights_are_capped() {
        let lights = vec![PointLight::default(); MAX_LIGHTS + 2];
        let uniforms = LightUniforms::from_lights(&lights);
        assert_eq!(uniforms.count, MAX_LIGHTS as u32);
        assert_eq!(uniforms.lights[0].color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniforms.lights[0].position, [0.0, 3.0, 3.0, 1.0]);
    }

    #[test]
    fn material_modes() {
        let mut textures = ResourceTable::new();
        let white = textures.insert("White", Texture::solid("White", [255; 4]));

        let color = MaterialUniforms::from_kind(&Material::color("c", Vec3::X).kind);
        assert_eq!(color.mode, MODE_COLOR);
        assert_eq!(color.kd, [1.0, 0.0, 0.0, 1.0]);

        let texture = MaterialUniforms::from_kind(&MaterialKind::TextureOnly {
            channel: TextureChannel::Normal,
            texture: white,
        });
        assert_eq!(texture.mode, MODE_TEXTURE);

        let phong = MaterialUniforms::from_kind(&MaterialKind::Phong {
            diffuse: white,
            normal: white,
            specular: white,
            emission: white,
            ka: Vec3::splat(0.1),
            kd: Vec3::ONE,
            ks: Vec3::splat(0.5),
            ke: Vec3::ZERO,
            specular_power: 16.0,
        });
        assert_eq!(phong.mode, MODE_PHONG);
        assert_eq!(phong.specular_power, 16.0);
    }

    #[test]
    fn normal_matrix_undoes_scale() {
        let u = FrameUniforms::new(Mat4::IDENTITY, Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0)), Vec3::ZERO);
        assert_eq!(u.normal_matrix[0][0], 0.5);
    }
}
