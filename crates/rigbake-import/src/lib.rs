//! rigbake Import - Asset importers
//!
//! This crate turns 3D asset files into an `ImportedScene`: the node tree,
//! skinned meshes, skins (bone tables), animation channels, materials and
//! textures. Starting with glTF/GLB; any importer that can fill an
//! `ImportedScene` plugs into the rest of rigbake.

mod gltf_import;
mod types;

pub use gltf_import::import_gltf;
pub use types::{
    ImportedAnimation, ImportedBone, ImportedChannel, ImportedKey, ImportedMaterial,
    ImportedMesh, ImportedNode, ImportedScene, ImportedSkin, ImportedTexture,
};
