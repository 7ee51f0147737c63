//! rigbake Render - headless wgpu renderer and frame capture
//!
//! Draws skinned models with Blinn-Phong shading into an offscreen target, fits the
//! camera to an animation's bounding volume and captures evenly spaced frames as a
//! sprite animation.

pub mod camera;
pub mod capture;
mod gpu_mesh;
mod headless;
pub mod pipeline;
mod primitives;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod skinned_pipeline;
pub mod sprite;
mod texture_cache;

pub use camera::{fit_to_bounds, Camera, CameraFit, MIN_NEAR_PLANE};
pub use capture::{capture, scene_bounds, CaptureSettings};
pub use gpu_mesh::{GpuMesh, MeshCache};
pub use headless::{HeadlessContext, RenderError};
pub use pipeline::{FrameUniforms, LightUniforms, LinePipeline, MaterialUniforms, MAX_LIGHTS};
pub use primitives::{bounds_lines, GpuVertex, LineVertex};
pub use renderer::{FrameRenderer, HeadlessRenderer};
pub use resources::{LoadedModel, ResourceStore};
pub use scene::{ModelInstance, PointLight, Scene};
pub use skinned_pipeline::{SkinnedPipeline, MAX_BONES};
pub use sprite::SpriteAnimation;
pub use texture_cache::{ColorSpace, GpuTexture, TextureCache};

#[cfg(test)]
mod tests {
    #[test]
    fn skinned_shader_wgsl_parses() {
        let source = include_str!("skinned_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("skinned_shader.wgsl failed to parse");
    }

    #[test]
    fn line_shader_wgsl_parses() {
        let source = include_str!("line_shader.wgsl");
        naga::front::wgsl::parse_str(source).expect("line_shader.wgsl failed to parse");
    }
}
