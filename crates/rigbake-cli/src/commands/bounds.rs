//! Bounding volume of an animation and the camera that frames it

use super::select_animation;
use anyhow::{anyhow, Context, Result};
use glam::Mat4;
use rigbake_animation::compute_bounding_volume;
use rigbake_render::{fit_to_bounds, ResourceStore};
use std::path::PathBuf;

pub struct BoundsArgs {
    pub model: PathBuf,
    pub samples: usize,
    pub animation: Option<String>,
    pub fov: f32,
    pub aspect: f32,
}

pub fn run(args: BoundsArgs) -> Result<()> {
    let mut store = ResourceStore::new();
    let model = store
        .load_model(&args.model)
        .with_context(|| format!("Failed to load model '{}'", args.model.display()))?;

    let mesh = store
        .meshes
        .get(model.mesh)
        .ok_or_else(|| anyhow!("Model '{}' has no primary mesh", model.name))?;

    let animation = select_animation(&store, &model, args.animation.as_deref())?
        .and_then(|h| store.animations.get(h));
    let rig = match animation {
        Some(animation) => Some((animation, store.skeleton_for(animation)?)),
        None => None,
    };

    let bounds = compute_bounding_volume(mesh, rig, Mat4::IDENTITY, args.samples)
        .context("Failed to compute bounding volume")?;
    let fit = fit_to_bounds(&bounds, args.fov.to_radians(), args.aspect)
        .context("Cannot fit a camera to the bounds")?;

    match animation {
        Some(a) => println!(
            "Animation: {} ({:.3}s, {} samples)",
            a.name(),
            a.duration(),
            args.samples
        ),
        None => println!("Animation: none (rest pose)"),
    }
    println!("Bounds: {}", bounds);
    println!("  Center: {:?}", bounds.center().to_array());
    println!("Camera (fov {:.1}, aspect {:.3}):", args.fov, args.aspect);
    println!("  Position: {:?}", fit.position.to_array());
    println!("  Near:     {:.4}", fit.near);
    println!("  Far:      {:.4}", fit.far);
    Ok(())
}
