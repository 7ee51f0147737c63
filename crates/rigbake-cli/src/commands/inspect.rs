//! Model inspection: bone tree, animations, materials, textures and meshes

use anyhow::{Context, Result};
use rigbake_render::{LoadedModel, ResourceStore};
use serde_json::{json, Value};
use std::path::Path;

pub fn run(model: &Path, format: &str) -> Result<()> {
    let mut store = ResourceStore::new();
    let loaded = store
        .load_model(model)
        .with_context(|| format!("Failed to load model '{}'", model.display()))?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&to_json(&store, &loaded))?),
        _ => print_text(&store, &loaded),
    }
    Ok(())
}

fn print_text(store: &ResourceStore, model: &LoadedModel) {
    println!("Model: {}", model.name);

    println!("\nMeshes ({}):", model.meshes.len());
    for handle in &model.meshes {
        if let Some(mesh) = store.meshes.get(*handle) {
            let marker = if *handle == model.mesh { " *" } else { "" };
            println!(
                "  {}{}: {} vertices, {} indices{}",
                mesh.name,
                marker,
                mesh.vertex_count(),
                mesh.index_count(),
                if mesh.is_skinned() { ", skinned" } else { "" }
            );
        }
    }

    match model.skeleton.and_then(|h| store.skeletons.get(h)) {
        Some(skeleton) => {
            println!("\nBones ({}):", skeleton.bone_count());
            skeleton.visit(|bone, depth| {
                println!("  {}{} [{}]", "  ".repeat(depth), bone.name, bone.id);
            });
            let orphans: Vec<&str> = (0..skeleton.bone_count())
                .filter_map(|id| skeleton.info(id))
                .filter(|info| !info.in_hierarchy)
                .map(|info| info.name.as_str())
                .collect();
            if !orphans.is_empty() {
                println!("  Not in hierarchy: {}", orphans.join(", "));
            }
        }
        None => println!("\nBones: none (static model)"),
    }

    println!("\nAnimations ({}):", model.animations.len());
    for handle in &model.animations {
        if let Some(anim) = store.animations.get(*handle) {
            println!(
                "  {}: {:.3}s, {} tracks, {} ticks/s",
                anim.name(),
                anim.duration(),
                anim.track_count(),
                anim.ticks_per_second()
            );
        }
    }

    println!("\nMaterials:");
    for (_, name, material) in store.materials.iter() {
        println!("  {} ({})", name, material.kind_label());
    }

    println!("\nTextures:");
    for (_, name, texture) in store.textures.iter() {
        println!("  {} ({}x{})", name, texture.width, texture.height);
    }
}

fn to_json(store: &ResourceStore, model: &LoadedModel) -> Value {
    let meshes: Vec<Value> = model
        .meshes
        .iter()
        .filter_map(|h| store.meshes.get(*h))
        .map(|m| {
            json!({
                "name": m.name,
                "vertices": m.vertex_count(),
                "indices": m.index_count(),
                "skinned": m.is_skinned(),
            })
        })
        .collect();

    let bones: Vec<Value> = model
        .skeleton
        .and_then(|h| store.skeletons.get(h))
        .map(|skeleton| {
            (0..skeleton.bone_count())
                .filter_map(|id| skeleton.info(id).map(|info| (id, info)))
                .map(|(id, info)| {
                    json!({
                        "id": id,
                        "name": info.name,
                        "parent": info.parent,
                        "in_hierarchy": info.in_hierarchy,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let animations: Vec<Value> = model
        .animations
        .iter()
        .filter_map(|h| store.animations.get(*h))
        .map(|a| {
            json!({
                "name": a.name(),
                "duration": a.duration(),
                "ticks_per_second": a.ticks_per_second(),
                "tracks": a.track_count(),
            })
        })
        .collect();

    let materials: Vec<Value> = store
        .materials
        .iter()
        .map(|(_, name, m)| json!({ "name": name, "kind": m.kind_label() }))
        .collect();

    let textures: Vec<Value> = store
        .textures
        .iter()
        .map(|(_, name, t)| json!({ "name": name, "width": t.width, "height": t.height }))
        .collect();

    json!({
        "name": model.name,
        "meshes": meshes,
        "bones": bones,
        "animations": animations,
        "materials": materials,
        "textures": textures,
    })
}
