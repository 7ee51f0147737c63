//! Materials and textures

use crate::handle::Handle;
use glam::Vec3;

/// An RGBA8 texture held in memory
#[derive(Clone, Debug)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA bytes, row-major, `width * height * 4` long
    pub pixels: Vec<u8>,
}

impl Texture {
    /// A 1x1 texture of a single color
    pub fn solid(name: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }
}

/// Which texture a texture-only material displays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureChannel {
    Diffuse,
    Normal,
    Specular,
    Emission,
}

impl TextureChannel {
    pub fn label(&self) -> &'static str {
        match self {
            TextureChannel::Diffuse => "Diffuse",
            TextureChannel::Normal => "Normal",
            TextureChannel::Specular => "Specular",
            TextureChannel::Emission => "Emission",
        }
    }
}

/// Shading model and its parameters. Each variant only carries the fields it uses.
#[derive(Clone, Debug, PartialEq)]
pub enum MaterialKind {
    /// Blinn-Phong lit with diffuse/specular/emission maps
    Phong {
        diffuse: Handle<Texture>,
        normal: Handle<Texture>,
        specular: Handle<Texture>,
        emission: Handle<Texture>,
        ka: Vec3,
        kd: Vec3,
        ks: Vec3,
        ke: Vec3,
        specular_power: f32,
    },
    /// Flat lit color
    Color { color: Vec3 },
    /// Unlit display of a single texture map
    TextureOnly {
        channel: TextureChannel,
        texture: Handle<Texture>,
    },
}

/// A named material
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
}

impl Material {
    pub fn color(name: impl Into<String>, color: Vec3) -> Self {
        Self {
            name: name.into(),
            kind: MaterialKind::Color { color },
        }
    }

    /// Textures this material samples, in no particular order
    pub fn textures(&self) -> Vec<Handle<Texture>> {
        match &self.kind {
            MaterialKind::Phong {
                diffuse,
                normal,
                specular,
                emission,
                ..
            } => vec![*diffuse, *normal, *specular, *emission],
            MaterialKind::Color { .. } => vec![],
            MaterialKind::TextureOnly { texture, .. } => vec![*texture],
        }
    }

    /// Short label for the shading model
    pub fn kind_label(&self) -> &'static str {
        match &self.kind {
            MaterialKind::Phong { .. } => "Phong",
            MaterialKind::Color { .. } => "Color",
            MaterialKind::TextureOnly { channel, .. } => channel.label(),
        }
    }
}
