//! rigbake Core - Foundational types for rigbake
//!
//! This crate provides the types every other rigbake crate depends on:
//! - `Handle`, `ResourceTable` - Typed, name-keyed resource references
//! - `Transform`, `Aabb` - Spatial types
//! - `Vertex`, `Mesh` - Skinned mesh data
//! - `Material`, `Texture` - Surface description
//! - Error types and Result alias

mod error;
mod handle;
mod material;
mod mesh;
mod types;

pub use error::{Result, RigError};
pub use handle::{Handle, ResourceTable};
pub use material::{Material, MaterialKind, Texture, TextureChannel};
pub use mesh::{Mesh, Vertex, MAX_BONE_INFLUENCE};
pub use types::{Aabb, Transform};
