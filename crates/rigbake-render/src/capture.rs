//! Frame capture: step an animation through one loop and keep every rendered frame

use crate::renderer::FrameRenderer;
use crate::resources::ResourceStore;
use crate::scene::Scene;
use crate::sprite::SpriteAnimation;
use rigbake_animation::compute_bounding_volume;
use rigbake_core::{Aabb, Result, RigError};
use std::path::PathBuf;

/// Loop length used for models without an animation
pub const STATIC_DURATION: f32 = 1.0;

/// What to capture and where to put it
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    pub frames: usize,
    /// Poses sampled for the bounding volume. Defaults to `frames`.
    pub bounds_samples: Option<usize>,
    /// Snap the camera to the bounding volume before capturing
    pub fit_camera: bool,
    /// Draw the bounding volume as a wireframe box
    pub show_bounds: bool,
    /// Write `frame{i}.png` files here when set
    pub output_dir: Option<PathBuf>,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            frames: 24,
            bounds_samples: None,
            fit_camera: true,
            show_bounds: false,
            output_dir: None,
        }
    }
}

/// Bounding volume of the first model over its whole animation
pub fn scene_bounds(scene: &Scene, resources: &ResourceStore, samples: usize) -> Result<Aabb> {
    let model = scene
        .models
        .first()
        .ok_or_else(|| RigError::InvalidArgument("scene has no models".into()))?;
    let mesh = resources.meshes.get(model.mesh).ok_or_else(|| {
        RigError::ResourceNotFound(format!("mesh {:?} of '{}'", model.mesh, model.name))
    })?;

    let rig = match scene.primary_animation(resources) {
        Some(animation) => Some((animation, resources.skeleton_for(animation)?)),
        None => None,
    };
    compute_bounding_volume(mesh, rig, model.model_matrix(), samples)
}

/// Render `settings.frames` evenly spaced frames of the first model's animation.
///
/// `progress` is called with `(done, total)` after every frame.
pub fn capture<R: FrameRenderer>(
    scene: &mut Scene,
    resources: &ResourceStore,
    renderer: &mut R,
    settings: &CaptureSettings,
    mut progress: impl FnMut(usize, usize),
) -> Result<SpriteAnimation> {
    if settings.frames == 0 {
        return Err(RigError::InvalidArgument(
            "capture needs at least one frame".into(),
        ));
    }
    let (width, height) = renderer.size();
    if width == 0 || height == 0 {
        return Err(RigError::InvalidArgument(format!(
            "capture size must not be empty ({}x{})",
            width, height
        )));
    }
    if scene.models.is_empty() {
        return Err(RigError::InvalidArgument("scene has no models".into()));
    }

    scene.camera.aspect = width as f32 / height as f32;

    let duration = scene
        .primary_animation(resources)
        .map(|a| a.duration())
        .filter(|d| *d > 0.0)
        .unwrap_or(STATIC_DURATION);

    if settings.fit_camera || settings.show_bounds {
        let samples = settings.bounds_samples.unwrap_or(settings.frames);
        let bounds = scene_bounds(scene, resources, samples)?;
        log::debug!("Bounding volume over {} samples: {}", samples, bounds);
        if settings.fit_camera {
            let fit = scene.camera.snap_to_fit(&bounds)?;
            log::debug!(
                "Camera fit: position {:?}, near {:.3}, far {:.3}",
                fit.position,
                fit.near,
                fit.far
            );
        }
        if settings.show_bounds {
            scene.bounds_overlay = Some(bounds);
        }
    }

    if let Some(dir) = &settings.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    log::info!(
        "Capturing {} frames at {}x{} over {:.3}s",
        settings.frames,
        width,
        height,
        duration
    );

    let mut frames = Vec::with_capacity(settings.frames);
    for i in 0..settings.frames {
        let time = i as f32 * duration / settings.frames as f32;
        scene.update(resources, time)?;
        let frame = renderer.render(scene, resources)?;

        if let Some(dir) = &settings.output_dir {
            let path = dir.join(format!("frame{}.png", i));
            frame
                .save(&path)
                .map_err(|e| RigError::Image(format!("{}: {}", path.display(), e)))?;
            log::debug!("Wrote {}", path.display());
        }
        frames.push(frame);
        progress(i + 1, settings.frames);
    }

    Ok(SpriteAnimation {
        frames,
        width,
        height,
        duration,
    })
}
