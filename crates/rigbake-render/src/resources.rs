//! Resource store: typed tables for everything a scene refers to

use glam::Vec3;
use rigbake_animation::{Animation, Skeleton};
use rigbake_core::{
    Handle, Material, MaterialKind, Mesh, ResourceTable, Result, RigError, Texture,
    TextureChannel,
};
use rigbake_import::{import_gltf, ImportedScene};
use std::collections::HashMap;
use std::path::Path;

pub const WHITE_TEXTURE: &str = "White";
pub const BLACK_TEXTURE: &str = "Black";
pub const FLAT_NORMAL_TEXTURE: &str = "FlatNormal";
pub const DEFAULT_MATERIAL: &str = "Default";

const DEFAULT_SPECULAR_POWER: f32 = 32.0;

/// Inspection views of a material, in this order
const VIEW_LABELS: [&str; 5] = ["Color", "Diffuse", "Normal", "Specular", "Emission"];

/// Owns meshes, textures, materials, skeletons and animations
pub struct ResourceStore {
    pub meshes: ResourceTable<Mesh>,
    pub textures: ResourceTable<Texture>,
    pub materials: ResourceTable<Material>,
    pub skeletons: ResourceTable<Skeleton>,
    pub animations: ResourceTable<Animation>,
    white: Handle<Texture>,
    black: Handle<Texture>,
    flat_normal: Handle<Texture>,
    default_material: Handle<Material>,
    views: HashMap<Handle<Material>, [Handle<Material>; 5]>,
}

/// Handles registered for one imported model
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub name: String,
    pub meshes: Vec<Handle<Mesh>>,
    /// First skinned mesh, or the first mesh of a static model
    pub mesh: Handle<Mesh>,
    /// Phong material of the primary mesh
    pub material: Handle<Material>,
    pub skeleton: Option<Handle<Skeleton>>,
    pub animations: Vec<Handle<Animation>>,
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStore {
    pub fn new() -> Self {
        let mut textures = ResourceTable::new();
        let white = textures.insert(WHITE_TEXTURE, Texture::solid(WHITE_TEXTURE, [255; 4]));
        let black = textures.insert(BLACK_TEXTURE, Texture::solid(BLACK_TEXTURE, [0, 0, 0, 255]));
        let flat_normal = textures.insert(
            FLAT_NORMAL_TEXTURE,
            Texture::solid(FLAT_NORMAL_TEXTURE, [128, 128, 255, 255]),
        );

        let mut materials = ResourceTable::new();
        let default_material = materials.insert(
            DEFAULT_MATERIAL,
            Material::color(DEFAULT_MATERIAL, Vec3::splat(0.8)),
        );

        Self {
            meshes: ResourceTable::new(),
            textures,
            materials,
            skeletons: ResourceTable::new(),
            animations: ResourceTable::new(),
            white,
            black,
            flat_normal,
            default_material,
            views: HashMap::new(),
        }
    }

    pub fn white_texture(&self) -> Handle<Texture> {
        self.white
    }

    pub fn black_texture(&self) -> Handle<Texture> {
        self.black
    }

    pub fn flat_normal_texture(&self) -> Handle<Texture> {
        self.flat_normal
    }

    pub fn default_material(&self) -> Handle<Material> {
        self.default_material
    }

    /// Import a glTF/GLB file and register everything in it
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadedModel> {
        let path = path.as_ref();
        log::info!("Loading model {}", path.display());
        let scene = import_gltf(path)?;
        self.add_scene(&scene)
    }

    /// Register the contents of an imported scene
    pub fn add_scene(&mut self, scene: &ImportedScene) -> Result<LoadedModel> {
        if scene.meshes.is_empty() {
            return Err(RigError::Import(format!("'{}' contains no meshes", scene.name)));
        }

        let textures: Vec<Handle<Texture>> = scene
            .textures
            .iter()
            .map(|t| {
                self.textures.insert(
                    t.name.clone(),
                    Texture {
                        name: t.name.clone(),
                        width: t.width,
                        height: t.height,
                        pixels: t.pixels.clone(),
                    },
                )
            })
            .collect();

        let phong: Vec<Handle<Material>> = scene
            .materials
            .iter()
            .map(|m| {
                let texture = |index: Option<usize>, fallback: Handle<Texture>| {
                    index.and_then(|i| textures.get(i).copied()).unwrap_or(fallback)
                };
                let diffuse = texture(m.base_color_texture, self.white);
                let normal = texture(m.normal_texture, self.flat_normal);
                let emission = texture(m.emissive_texture, self.white);
                let specular = self.white;
                let kd = Vec3::new(m.base_color[0], m.base_color[1], m.base_color[2]);

                let handle = self.materials.insert(
                    m.name.clone(),
                    Material {
                        name: m.name.clone(),
                        kind: MaterialKind::Phong {
                            diffuse,
                            normal,
                            specular,
                            emission,
                            ka: kd * 0.2,
                            kd,
                            ks: Vec3::splat(0.5),
                            ke: Vec3::from_array(m.emissive),
                            specular_power: DEFAULT_SPECULAR_POWER,
                        },
                    },
                );
                let maps = [diffuse, normal, specular, emission];
                self.register_material_views(handle, &m.name, kd, maps);
                handle
            })
            .collect();

        let meshes: Vec<Handle<Mesh>> = scene
            .meshes
            .iter()
            .map(|m| self.meshes.insert(m.name.clone(), m.to_mesh()))
            .collect();

        let primary = scene.first_skinned_mesh().unwrap_or(0);
        let material = scene.meshes[primary]
            .material_index
            .and_then(|i| phong.get(i).copied())
            .unwrap_or(self.default_material);

        let mut skeleton = None;
        let mut animations = Vec::new();
        match scene.meshes[primary].skin_index {
            Some(skin_index) => {
                let skel = Skeleton::from_imported(scene, skin_index)?;
                let name = format!("{}/{}", scene.name, scene.skins[skin_index].name);
                let mut converted = Vec::with_capacity(scene.animations.len());
                for imported in &scene.animations {
                    converted.push(Animation::from_imported(imported, scene, &skel)?);
                }
                let handle = self.skeletons.insert(name, skel);
                skeleton = Some(handle);
                for animation in converted {
                    let name = animation.name().to_string();
                    animations.push(self.animations.insert(name, animation.with_skeleton(handle)));
                }
            }
            None if !scene.animations.is_empty() => {
                log::warn!(
                    "'{}' has {} animations but no skinned mesh; loading it as static",
                    scene.name,
                    scene.animations.len()
                );
            }
            None => {}
        }

        log::info!(
            "Loaded '{}': {} meshes, {} materials, {} textures, {} animations",
            scene.name,
            meshes.len(),
            phong.len(),
            textures.len(),
            animations.len()
        );

        Ok(LoadedModel {
            name: scene.name.clone(),
            mesh: meshes[primary],
            meshes,
            material,
            skeleton,
            animations,
        })
    }

    /// Register the inspection variants of `material`: flat color and one per texture map
    /// (diffuse, normal, specular, emission)
    fn register_material_views(
        &mut self,
        material: Handle<Material>,
        name: &str,
        color: Vec3,
        maps: [Handle<Texture>; 4],
    ) {
        let view_name = |label: &str| format!("{}/{}", name, label);
        let color_view = self
            .materials
            .insert(view_name("Color"), Material::color(view_name("Color"), color));

        let channels = [
            TextureChannel::Diffuse,
            TextureChannel::Normal,
            TextureChannel::Specular,
            TextureChannel::Emission,
        ];
        let mut views = [color_view; 5];
        let texture_views = channels.into_iter().zip(maps);
        for (slot, (channel, texture)) in views[1..].iter_mut().zip(texture_views) {
            let n = view_name(channel.label());
            *slot = self.materials.insert(
                n.clone(),
                Material {
                    name: n,
                    kind: MaterialKind::TextureOnly { channel, texture },
                },
            );
        }
        self.views.insert(material, views);
    }

    /// Find an inspection variant ("Color", "Diffuse", "Normal", "Specular", "Emission")
    /// of a material. "Phong" returns the material itself.
    pub fn material_view(&self, material: Handle<Material>, view: &str) -> Option<Handle<Material>> {
        if view.eq_ignore_ascii_case("phong") {
            return Some(material);
        }
        let slot = VIEW_LABELS.iter().position(|l| l.eq_ignore_ascii_case(view))?;
        self.views.get(&material).map(|views| views[slot])
    }

    /// Look up the skeleton an animation was registered with
    pub fn skeleton_for(&self, animation: &Animation) -> Result<&Skeleton> {
        animation
            .skeleton()
            .and_then(|h| self.skeletons.get(h))
            .ok_or_else(|| {
                RigError::ResourceNotFound(format!("skeleton for animation '{}'", animation.name()))
            })
    }
}
