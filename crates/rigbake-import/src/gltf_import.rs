//! glTF/GLB file importer

use crate::types::{
    ImportedAnimation, ImportedBone, ImportedChannel, ImportedKey, ImportedMaterial,
    ImportedMesh, ImportedNode, ImportedScene, ImportedSkin, ImportedTexture,
};
use glam::{Mat4, Quat, Vec2, Vec3};
use gltf::animation::util::ReadOutputs;
use gltf::animation::Interpolation;
use rigbake_core::{Result, RigError, Vertex};
use std::collections::HashMap;
use std::path::Path;

/// Name of the synthetic node that parents every scene root
pub const ROOT_NODE_NAME: &str = "__root";

/// glTF keyframe times are already in seconds
const GLTF_TICKS_PER_SECOND: f32 = 1.0;

/// Import a glTF or GLB file
pub fn import_gltf<P: AsRef<Path>>(path: P) -> Result<ImportedScene> {
    let path = path.as_ref();
    let (document, buffers, images) = gltf::import(path).map_err(|e| {
        RigError::Import(format!("Failed to import glTF {}: {}", path.display(), e))
    })?;

    let name = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unnamed")
        .to_string();

    let (nodes, root) = import_nodes(&document);
    let skins = import_skins(&document, &buffers);
    let meshes = import_meshes(&document, &buffers)?;
    let animations = import_animations(&document, &buffers);
    let textures = import_textures(&document, &images);
    let materials = import_materials(&document);

    log::debug!(
        "Imported '{}': {} nodes, {} meshes, {} skins, {} animations, {} materials, {} textures",
        name,
        nodes.len(),
        meshes.len(),
        skins.len(),
        animations.len(),
        materials.len(),
        textures.len()
    );

    Ok(ImportedScene {
        name,
        nodes,
        root,
        meshes,
        skins,
        animations,
        materials,
        textures,
    })
}

fn node_name(node: &gltf::Node) -> String {
    node.name()
        .map(String::from)
        .unwrap_or_else(|| format!("node_{}", node.index()))
}

/// Copy the node graph and hang the scene roots under one synthetic root
fn import_nodes(document: &gltf::Document) -> (Vec<ImportedNode>, usize) {
    let mut nodes: Vec<ImportedNode> = document
        .nodes()
        .map(|node| ImportedNode {
            name: node_name(&node),
            transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
            children: node.children().map(|c| c.index()).collect(),
        })
        .collect();

    let scene_roots: Vec<usize> = match document
        .default_scene()
        .or_else(|| document.scenes().next())
    {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => {
            let mut has_parent = vec![false; nodes.len()];
            for node in &nodes {
                for &child in &node.children {
                    has_parent[child] = true;
                }
            }
            (0..nodes.len()).filter(|i| !has_parent[*i]).collect()
        }
    };

    let root = nodes.len();
    nodes.push(ImportedNode {
        name: ROOT_NODE_NAME.to_string(),
        transform: Mat4::IDENTITY,
        children: scene_roots,
    });
    (nodes, root)
}

fn import_skins(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Vec<ImportedSkin> {
    document
        .skins()
        .map(|skin| {
            let reader = skin.reader(|buffer| Some(&buffers[buffer.index()]));
            let inverse_binds: Vec<[[f32; 4]; 4]> = reader
                .read_inverse_bind_matrices()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let bones = skin
                .joints()
                .enumerate()
                .map(|(i, joint)| ImportedBone {
                    name: node_name(&joint),
                    offset: inverse_binds
                        .get(i)
                        .map(Mat4::from_cols_array_2d)
                        .unwrap_or(Mat4::IDENTITY),
                })
                .collect();

            ImportedSkin {
                name: skin
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("skin_{}", skin.index())),
                bones,
            }
        })
        .collect()
}

fn import_meshes(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<Vec<ImportedMesh>> {
    // A mesh is skinned by whichever node instantiates it with a skin
    let mesh_skins: HashMap<usize, usize> = document
        .nodes()
        .filter_map(|node| Some((node.mesh()?.index(), node.skin()?.index())))
        .collect();

    let mut meshes = Vec::new();

    for mesh in document.meshes() {
        let mesh_name = mesh
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let skin_index = mesh_skins.get(&mesh.index()).copied();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping non-triangle primitive {} of mesh '{}'",
                    primitive.index(),
                    mesh_name
                );
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            let tangents: Vec<[f32; 4]> = reader
                .read_tangents()
                .map(|iter| iter.collect())
                .unwrap_or_default();
            let colors: Vec<[f32; 3]> = reader
                .read_colors(0)
                .map(|iter| iter.into_rgb_f32().collect())
                .unwrap_or_default();
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_default();
            let joints: Vec<[u16; 4]> = reader
                .read_joints(0)
                .map(|iter| iter.into_u16().collect())
                .unwrap_or_default();
            let weights: Vec<[f32; 4]> = reader
                .read_weights(0)
                .map(|iter| iter.into_f32().collect())
                .unwrap_or_default();
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|iter| iter.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            if let Some(bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
                return Err(RigError::MalformedMesh(format!(
                    "mesh '{}' index {} out of range for {} vertices",
                    mesh_name,
                    bad,
                    positions.len()
                )));
            }

            let vertices = positions
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let position = Vec3::from_array(*p);
                    let normal = normals.get(i).map(|n| Vec3::from_array(*n)).unwrap_or(Vec3::ZERO);
                    let (tangent, bitangent) = match tangents.get(i) {
                        Some(t) => {
                            let t3 = Vec3::new(t[0], t[1], t[2]);
                            (t3, normal.cross(t3) * t[3])
                        }
                        None => (Vec3::ZERO, Vec3::ZERO),
                    };
                    Vertex {
                        position,
                        normal,
                        tangent,
                        bitangent,
                        color: colors.get(i).map(|c| Vec3::from_array(*c)).unwrap_or(Vec3::ONE),
                        // Untextured meshes get planar UVs from the XY position
                        uv: uvs
                            .get(i)
                            .map(|uv| Vec2::from_array(*uv))
                            .unwrap_or(Vec2::new(position.x, position.y)),
                        bone_ids: joints
                            .get(i)
                            .map(|j| j.map(u32::from))
                            .unwrap_or([0; 4]),
                        weights: weights.get(i).copied().unwrap_or([0.0; 4]),
                    }
                })
                .collect();

            meshes.push(ImportedMesh {
                name: mesh_name.clone(),
                vertices,
                indices,
                material_index: primitive.material().index(),
                skin_index,
            });
        }
    }

    Ok(meshes)
}

/// Pick the keyframe values out of a sampler output.
///
/// Cubic-spline samplers pack `[in_tangent, value, out_tangent]` per key; only the value is kept.
fn keys<T: Copy>(times: &[f32], values: &[T], interpolation: Interpolation) -> Vec<ImportedKey<T>> {
    let (stride, offset) = match interpolation {
        Interpolation::CubicSpline => (3, 1),
        _ => (1, 0),
    };
    times
        .iter()
        .enumerate()
        .filter_map(|(i, &time)| {
            values
                .get(i * stride + offset)
                .map(|&value| ImportedKey { time, value })
        })
        .collect()
}

fn import_animations(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Vec<ImportedAnimation> {
    document
        .animations()
        .map(|animation| {
            let name = animation
                .name()
                .map(String::from)
                .unwrap_or_else(|| format!("animation_{}", animation.index()));

            let mut channels: Vec<ImportedChannel> = Vec::new();
            let mut by_node: HashMap<usize, usize> = HashMap::new();
            let mut duration = 0.0f32;

            for channel in animation.channels() {
                let node = channel.target().node();
                let interpolation = channel.sampler().interpolation();
                if matches!(interpolation, Interpolation::Step) {
                    log::debug!(
                        "Animation '{}': STEP sampler on '{}' will be interpolated linearly",
                        name,
                        node_name(&node)
                    );
                }

                let reader = channel.reader(|buffer| Some(&buffers[buffer.index()]));
                let Some(inputs) = reader.read_inputs() else {
                    continue;
                };
                let times: Vec<f32> = inputs.collect();
                let Some(outputs) = reader.read_outputs() else {
                    continue;
                };
                if let ReadOutputs::MorphTargetWeights(_) = outputs {
                    log::debug!("Animation '{}': skipping morph target channel", name);
                    continue;
                }

                duration = times.iter().fold(duration, |d, &t| d.max(t));

                let slot = *by_node.entry(node.index()).or_insert_with(|| {
                    channels.push(ImportedChannel {
                        node_name: node_name(&node),
                        ..Default::default()
                    });
                    channels.len() - 1
                });
                let target = &mut channels[slot];

                match outputs {
                    ReadOutputs::Translations(values) => {
                        let values: Vec<Vec3> = values.map(Vec3::from_array).collect();
                        target.positions = keys(&times, &values, interpolation);
                    }
                    ReadOutputs::Rotations(values) => {
                        let values: Vec<Quat> = values.into_f32().map(Quat::from_array).collect();
                        target.rotations = keys(&times, &values, interpolation);
                    }
                    ReadOutputs::Scales(values) => {
                        let values: Vec<Vec3> = values.map(Vec3::from_array).collect();
                        target.scales = keys(&times, &values, interpolation);
                    }
                    ReadOutputs::MorphTargetWeights(_) => {}
                }
            }

            ImportedAnimation {
                name,
                duration,
                ticks_per_second: GLTF_TICKS_PER_SECOND,
                channels,
            }
        })
        .collect()
}

fn import_textures(document: &gltf::Document, images: &[gltf::image::Data]) -> Vec<ImportedTexture> {
    images
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let name = document
                .images()
                .nth(i)
                .and_then(|img| img.name().map(String::from))
                .unwrap_or_else(|| format!("texture_{}", i));

            ImportedTexture {
                name,
                width: image.width,
                height: image.height,
                pixels: to_rgba8(image.format, &image.pixels),
            }
        })
        .collect()
}

/// Expand any glTF pixel format to tightly packed RGBA8
fn to_rgba8(format: gltf::image::Format, pixels: &[u8]) -> Vec<u8> {
    use gltf::image::Format;

    let u8_channel = |b: &[u8]| b[0];
    let u16_channel = |b: &[u8]| (u16::from_le_bytes([b[0], b[1]]) >> 8) as u8;
    let f32_channel =
        |b: &[u8]| (f32::from_le_bytes([b[0], b[1], b[2], b[3]]).clamp(0.0, 1.0) * 255.0).round() as u8;

    match format {
        Format::R8G8B8A8 => pixels.to_vec(),
        Format::R8G8B8 => expand(pixels, 3, 1, u8_channel),
        Format::R8G8 => expand(pixels, 2, 1, u8_channel),
        Format::R8 => expand(pixels, 1, 1, u8_channel),
        Format::R16 => expand(pixels, 1, 2, u16_channel),
        Format::R16G16 => expand(pixels, 2, 2, u16_channel),
        Format::R16G16B16 => expand(pixels, 3, 2, u16_channel),
        Format::R16G16B16A16 => expand(pixels, 4, 2, u16_channel),
        Format::R32G32B32FLOAT => expand(pixels, 3, 4, f32_channel),
        Format::R32G32B32A32FLOAT => expand(pixels, 4, 4, f32_channel),
    }
}

fn expand(pixels: &[u8], channels: usize, bytes: usize, read: impl Fn(&[u8]) -> u8) -> Vec<u8> {
    pixels
        .chunks_exact(channels * bytes)
        .flat_map(|px| {
            let c = |i: usize| read(&px[i * bytes..(i + 1) * bytes]);
            match channels {
                1 => {
                    let v = c(0);
                    [v, v, v, 255]
                }
                2 => [c(0), c(1), 0, 255],
                3 => [c(0), c(1), c(2), 255],
                _ => [c(0), c(1), c(2), c(3)],
            }
        })
        .collect()
}

fn import_materials(document: &gltf::Document) -> Vec<ImportedMaterial> {
    document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            ImportedMaterial {
                name: material
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("material_{}", material.index().unwrap_or(0))),
                base_color: pbr.base_color_factor(),
                emissive: material.emissive_factor(),
                base_color_texture: pbr
                    .base_color_texture()
                    .map(|info| info.texture().source().index()),
                normal_texture: material
                    .normal_texture()
                    .map(|info| info.texture().source().index()),
                emissive_texture: material
                    .emissive_texture()
                    .map(|info| info.texture().source().index()),
            }
        })
        .collect()
}
