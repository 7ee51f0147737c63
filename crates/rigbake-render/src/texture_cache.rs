//! GPU texture cache: uploads textures once, keyed by handle and color space

use crate::headless::RenderError;
use rigbake_core::{Handle, Texture};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

/// A GPU-resident texture with its view
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

/// Color maps are sampled as sRGB, data maps (normals) as linear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

#[derive(Default)]
pub struct TextureCache {
    textures: HashMap<(Handle<Texture>, ColorSpace), GpuTexture>,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload `texture` unless it is already cached in this color space
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        handle: Handle<Texture>,
        texture: &Texture,
        space: ColorSpace,
    ) -> Result<(), RenderError> {
        if self.textures.contains_key(&(handle, space)) {
            return Ok(());
        }
        validate(texture)?;

        let format = match space {
            ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
        };

        let gpu = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some(&texture.name),
                size: wgpu::Extent3d {
                    width: texture.width,
                    height: texture.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &texture.pixels,
        );
        let view = gpu.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!(
            "Uploaded texture '{}' ({}x{}, {:?})",
            texture.name,
            texture.width,
            texture.height,
            space
        );
        self.textures.insert((handle, space), GpuTexture { texture: gpu, view });
        Ok(())
    }

    pub fn get(&self, handle: Handle<Texture>, space: ColorSpace) -> Option<&GpuTexture> {
        self.textures.get(&(handle, space))
    }
}

fn validate(texture: &Texture) -> Result<(), RenderError> {
    let expected = texture.width as usize * texture.height as usize * 4;
    if expected == 0 || texture.pixels.len() != expected {
        return Err(RenderError::InvalidTexture(texture.name.clone()));
    }
    Ok(())
}

/// Shared linear sampler with repeat addressing
pub fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("Material Sampler"),
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        ..Default::default()
    })
}
