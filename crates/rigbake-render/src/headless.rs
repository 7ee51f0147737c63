//! Offscreen wgpu device and capture targets

use rigbake_core::RigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to get adapter")]
    AdapterNotFound,
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),
    #[error("Failed to read render buffer: {0}")]
    BufferReadFailed(String),
    #[error("Pose has {0} bones; the skinning buffer holds at most {1}")]
    TooManyBones(usize, usize),
    #[error("Texture '{0}' has no pixels or a size that does not match its data")]
    InvalidTexture(String),
}

impl From<RenderError> for RigError {
    fn from(err: RenderError) -> Self {
        RigError::Render(err.to_string())
    }
}

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Device, queue and the offscreen targets every frame is drawn into
pub struct HeadlessContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub width: u32,
    pub height: u32,
    pub color_texture: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth_view: wgpu::TextureView,
}

impl HeadlessContext {
    /// Open a device without a surface and allocate `width` x `height` targets.
    ///
    /// Falls back to a software adapter when no hardware one is available, so capture
    /// also works on machines without a GPU.
    pub async fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = match request_adapter(&instance, false).await {
            Some(adapter) => adapter,
            None => {
                log::warn!("No hardware adapter found; trying a software fallback");
                request_adapter(&instance, true)
                    .await
                    .ok_or(RenderError::AdapterNotFound)?
            }
        };
        log::debug!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("rigbake Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;

        let color_texture = render_target(
            &device,
            "Capture Color Target",
            COLOR_FORMAT,
            wgpu::TextureUsages::COPY_SRC,
            width,
            height,
        );
        let color_view = color_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let depth_view = render_target(
            &device,
            "Capture Depth Target",
            DEPTH_FORMAT,
            wgpu::TextureUsages::empty(),
            width,
            height,
        )
        .create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            device,
            queue,
            width,
            height,
            color_texture,
            color_view,
            depth_view,
        })
    }

    /// Copy the color target back to the CPU as an image
    pub fn read_image(&self) -> Result<image::RgbaImage, RenderError> {
        let padded = padded_row_bytes(self.width);
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Capture Readback Buffer"),
            size: padded as u64 * self.height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Capture Readback Encoder"),
            });
        encoder.copy_texture_to_buffer(
            self.color_texture.as_image_copy(),
            wgpu::ImageCopyBuffer {
                buffer: &staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            self.color_texture.size(),
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?
            .map_err(|e| RenderError::BufferReadFailed(e.to_string()))?;

        let pixels = {
            let mapped = slice.get_mapped_range();
            strip_row_padding(&mapped, self.width * 4, padded, self.height)
        };
        staging.unmap();

        image::RgbaImage::from_raw(self.width, self.height, pixels).ok_or_else(|| {
            RenderError::BufferReadFailed("readback size does not match the target".into())
        })
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

async fn request_adapter(instance: &wgpu::Instance, fallback: bool) -> Option<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: fallback,
        })
        .await
}

fn render_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    extra_usage: wgpu::TextureUsages,
    width: u32,
    height: u32,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | extra_usage,
        view_formats: &[],
    })
}

/// Row pitch wgpu requires for texture-to-buffer copies
fn padded_row_bytes(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4).div_ceil(align) * align
}

fn strip_row_padding(data: &[u8], unpadded: u32, padded: u32, rows: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((unpadded * rows) as usize);
    for row in 0..rows {
        let start = (row * padded) as usize;
        pixels.extend_from_slice(&data[start..start + unpadded as usize]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pad_to_copy_alignment() {
        assert_eq!(padded_row_bytes(64), 256);
        assert_eq!(padded_row_bytes(65), 512);
        assert_eq!(padded_row_bytes(1), 256);
    }

    #[test]
    fn padding_is_stripped_per_row() {
        let mut data = vec![0u8; 512];
        data[..4].copy_from_slice(&[1, 2, 3, 4]);
        data[256..260].copy_from_slice(&[5, 6, 7, 8]);
        let pixels = strip_row_padding(&data, 4, 256, 2);
        assert_eq!(pixels, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn render_errors_convert() {
        let err: RigError = RenderError::TooManyBones(300, 256).into();
        assert!(matches!(err, RigError::Render(msg) if msg.contains("300")));
    }
}
