//! TOML capture configuration

use anyhow::{bail, Context, Result};
use glam::Vec3;
use rigbake_core::Transform;
use rigbake_render::PointLight;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Everything `rigbake capture` needs. Missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub model: Option<PathBuf>,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    pub bounds_samples: Option<usize>,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub sheet_columns: Option<u32>,
    /// Linear RGBA
    pub clear_color: [f32; 4],
    pub fit_camera: bool,
    pub show_bounds: bool,
    pub animation: Option<String>,
    pub material_view: Option<String>,
    pub model_transform: TransformConfig,
    pub lights: Vec<LightConfig>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            model: None,
            output: PathBuf::from("outputs"),
            width: 512,
            height: 512,
            frames: 24,
            bounds_samples: None,
            fov: 45.0,
            sheet_columns: None,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            fit_camera: true,
            show_bounds: false,
            animation: None,
            material_view: None,
            model_transform: TransformConfig::default(),
            lights: vec![LightConfig::default()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub position: [f32; 3],
    /// Euler XYZ in degrees
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl TransformConfig {
    pub fn to_transform(&self) -> Transform {
        Transform {
            position: Vec3::from_array(self.position),
            rotation: Vec3::from_array(self.rotation.map(f32::to_radians)),
            scale: Vec3::from_array(self.scale),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        let light = PointLight::default();
        Self {
            position: light.position.to_array(),
            color: light.color.to_array(),
            intensity: light.intensity,
        }
    }
}

impl LightConfig {
    pub fn to_light(&self) -> PointLight {
        PointLight {
            position: Vec3::from_array(self.position),
            color: Vec3::from_array(self.color),
            intensity: self.intensity,
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct CaptureOverrides {
    pub model: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub frames: Option<usize>,
    pub bounds_samples: Option<usize>,
    pub sheet_columns: Option<u32>,
    pub show_bounds: bool,
    pub no_fit: bool,
    pub animation: Option<String>,
    pub material_view: Option<String>,
}

impl CaptureConfig {
    pub fn parse(source: &str) -> Result<Self> {
        let config = toml::from_str(source).map_err(rigbake_core::RigError::from)?;
        Ok(config)
    }

    /// Read a config file. A relative `model` path is taken relative to the file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let mut config = Self::parse(&source)
            .with_context(|| format!("Failed to parse config '{}'", path.display()))?;

        if let (Some(model), Some(dir)) = (&config.model, path.parent()) {
            if model.is_relative() {
                config.model = Some(dir.join(model));
            }
        }
        log::debug!("Loaded capture config from {}", path.display());
        Ok(config)
    }

    /// Reject values no capture can use, before any model is loaded
    pub fn validate(&self) -> Result<()> {
        if !(self.fov > 0.0 && self.fov < 180.0) {
            bail!("fov must be between 0 and 180 degrees, got {}", self.fov);
        }
        if self.width == 0 || self.height == 0 {
            bail!("frame size must not be empty ({}x{})", self.width, self.height);
        }
        if self.frames == 0 {
            bail!("frames must be at least 1");
        }
        if self.bounds_samples == Some(0) {
            bail!("bounds_samples must be at least 1");
        }
        Ok(())
    }

    pub fn apply(&mut self, overrides: CaptureOverrides) {
        if let Some(model) = overrides.model {
            self.model = Some(model);
        }
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if let Some(width) = overrides.width {
            self.width = width;
        }
        if let Some(height) = overrides.height {
            self.height = height;
        }
        if let Some(frames) = overrides.frames {
            self.frames = frames;
        }
        if overrides.bounds_samples.is_some() {
            self.bounds_samples = overrides.bounds_samples;
        }
        if overrides.sheet_columns.is_some() {
            self.sheet_columns = overrides.sheet_columns;
        }
        if overrides.animation.is_some() {
            self.animation = overrides.animation;
        }
        if overrides.material_view.is_some() {
            self.material_view = overrides.material_view;
        }
        self.show_bounds |= overrides.show_bounds;
        if overrides.no_fit {
            self.fit_camera = false;
        }
    }
}
