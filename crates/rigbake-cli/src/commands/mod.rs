//! CLI command implementations

pub mod bounds;
pub mod capture;
pub mod inspect;

use anyhow::{anyhow, Result};
use rigbake_animation::Animation;
use rigbake_core::Handle;
use rigbake_render::{LoadedModel, ResourceStore};

/// Pick an animation of `model` by name, or its first one
pub fn select_animation(
    store: &ResourceStore,
    model: &LoadedModel,
    name: Option<&str>,
) -> Result<Option<Handle<Animation>>> {
    let Some(name) = name else {
        return Ok(model.animations.first().copied());
    };
    model
        .animations
        .iter()
        .copied()
        .find(|h| store.animations.get(*h).is_some_and(|a| a.name() == name))
        .map(Some)
        .ok_or_else(|| {
            let available: Vec<&str> = model
                .animations
                .iter()
                .filter_map(|h| store.animations.get(*h).map(|a| a.name()))
                .collect();
            anyhow!(
                "Animation '{}' not found in '{}' (available: {})",
                name,
                model.name,
                available.join(", ")
            )
        })
}
