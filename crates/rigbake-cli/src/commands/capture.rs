//! Headless capture of an animation loop to PNG frames and an optional sprite sheet

use super::select_animation;
use crate::config::{CaptureConfig, CaptureOverrides};
use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rigbake_render::{
    capture, CaptureSettings, HeadlessRenderer, LoadedModel, ModelInstance, ResourceStore, Scene,
};
use std::path::PathBuf;

pub struct CaptureArgs {
    pub config: Option<PathBuf>,
    pub overrides: CaptureOverrides,
    pub quiet: bool,
}

pub fn run(args: CaptureArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => CaptureConfig::load(path)?,
        None => CaptureConfig::default(),
    };
    config.apply(args.overrides);
    config.validate()?;

    let Some(model_path) = config.model.clone() else {
        bail!("No model given; pass a model path or set `model` in the config file");
    };

    let mut store = ResourceStore::new();
    let model = store
        .load_model(&model_path)
        .with_context(|| format!("Failed to load model '{}'", model_path.display()))?;

    let mut scene = build_scene(&config, &store, &model)?;
    let mut renderer = HeadlessRenderer::new(config.width, config.height)
        .context("Failed to create headless renderer")?;

    let settings = CaptureSettings {
        frames: config.frames,
        bounds_samples: config.bounds_samples,
        fit_camera: config.fit_camera,
        show_bounds: config.show_bounds,
        output_dir: Some(config.output.clone()),
    };

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        progress_bar(config.frames as u64)
    };
    let sprite = capture(&mut scene, &store, &mut renderer, &settings, |done, _| {
        progress.set_position(done as u64)
    })
    .context("Capture failed")?;
    progress.finish_and_clear();

    println!(
        "Captured {} frames ({}x{}, {:.3}s loop) to {}",
        sprite.frame_count(),
        sprite.width,
        sprite.height,
        sprite.duration,
        config.output.display()
    );

    if let Some(columns) = config.sheet_columns {
        let sheet = sprite.to_sheet(columns)?;
        let path = config.output.join("sheet.png");
        sheet
            .save(&path)
            .with_context(|| format!("Failed to write sprite sheet '{}'", path.display()))?;
        println!(
            "Sprite sheet: {} ({}x{})",
            path.display(),
            sheet.width(),
            sheet.height()
        );
    }

    Ok(())
}

fn build_scene(config: &CaptureConfig, store: &ResourceStore, model: &LoadedModel) -> Result<Scene> {
    let mut instance = ModelInstance::from_loaded(model);
    instance.transform = config.model_transform.to_transform();
    instance.animation = select_animation(store, model, config.animation.as_deref())?;

    if let Some(view) = &config.material_view {
        instance.material = store
            .material_view(model.material, view)
            .ok_or_else(|| anyhow!("Unknown material view '{}'", view))?;
    }

    let mut scene = Scene::new();
    scene.camera.fov = config.fov;
    scene.clear_color = config.clear_color;
    scene.lights = config.lights.iter().map(|l| l.to_light()).collect();
    scene.models.push(instance);
    Ok(scene)
}

fn progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("frames");
    pb
}
