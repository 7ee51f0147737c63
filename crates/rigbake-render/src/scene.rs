//! Flat scene: camera, model instances and point lights

use crate::camera::Camera;
use crate::resources::{LoadedModel, ResourceStore};
use glam::{Mat4, Vec3};
use rigbake_animation::{Animation, Pose};
use rigbake_core::{Aabb, Handle, Material, Mesh, Result, RigError, Transform};

/// A point light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 3.0, 3.0),
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

/// One placed model. Holds its own pose buffer.
#[derive(Debug, Clone)]
pub struct ModelInstance {
    pub name: String,
    pub transform: Transform,
    pub mesh: Handle<Mesh>,
    pub material: Handle<Material>,
    /// None for a static model
    pub animation: Option<Handle<Animation>>,
    pose: Pose,
}

impl ModelInstance {
    pub fn new(name: impl Into<String>, mesh: Handle<Mesh>, material: Handle<Material>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            mesh,
            material,
            animation: None,
            pose: Pose::new(0),
        }
    }

    /// Instance of a loaded model playing its first animation, if any
    pub fn from_loaded(model: &LoadedModel) -> Self {
        Self {
            animation: model.animations.first().copied(),
            ..Self::new(model.name.clone(), model.mesh, model.material)
        }
    }

    /// `T * R * S`, composed fresh from the transform
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Skin matrices from the last `Scene::update`
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Evaluate this instance's animation at `time` seconds
    pub fn update(&mut self, resources: &ResourceStore, time: f32) -> Result<()> {
        let Some(handle) = self.animation else {
            return Ok(());
        };
        let animation = resources.animations.get(handle).ok_or_else(|| {
            RigError::ResourceNotFound(format!("animation {:?} of '{}'", handle, self.name))
        })?;
        let skeleton = resources.skeleton_for(animation)?;
        if self.pose.len() != animation.bone_count() {
            self.pose = Pose::new(animation.bone_count());
        }
        animation.evaluate(skeleton, time, &mut self.pose)
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone)]
pub struct Scene {
    pub camera: Camera,
    pub models: Vec<ModelInstance>,
    pub lights: Vec<PointLight>,
    /// Linear RGBA
    pub clear_color: [f32; 4],
    /// Drawn as a wireframe box when set
    pub bounds_overlay: Option<Aabb>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            models: Vec::new(),
            lights: vec![PointLight::default()],
            clear_color: [0.0, 0.0, 0.0, 0.0],
            bounds_overlay: None,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pose every animated model at `time` seconds
    pub fn update(&mut self, resources: &ResourceStore, time: f32) -> Result<()> {
        for model in &mut self.models {
            model.update(resources, time)?;
        }
        Ok(())
    }

    /// The animation of the first model, if it has one
    pub fn primary_animation<'a>(&self, resources: &'a ResourceStore) -> Option<&'a Animation> {
        let handle = self.models.first()?.animation?;
        resources.animations.get(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::tests::rig_scene;

    fn loaded() -> (ResourceStore, LoadedModel) {
        let mut store = ResourceStore::new();
        let model = store.add_scene(&rig_scene()).unwrap();
        (store, model)
    }

    #[test]
    fn update_poses_animated_models() {
        let (store, model) = loaded();
        let mut scene = Scene::new();
        scene.models.push(ModelInstance::from_loaded(&model));
        scene.update(&store, 0.5).unwrap();

        let pose = scene.models[0].pose();
        assert_eq!(pose.len(), 2);
        assert!(pose[1]
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
        assert!(scene.primary_animation(&store).is_some());
    }

    #[test]
    fn static_models_are_left_alone() {
        let (store, model) = loaded();
        let mut scene = Scene::new();
        scene
            .models
            .push(ModelInstance::new("static", model.mesh, model.material));
        scene.update(&store, 0.5).unwrap();
        assert!(scene.models[0].pose().is_empty());
        assert!(scene.primary_animation(&store).is_none());
    }

    #[test]
    fn model_matrix_is_trs() {
        let (_, model) = loaded();
        let mut instance = ModelInstance::from_loaded(&model);
        instance.transform = Transform {
            position: Vec3::new(1.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2),
            scale: Vec3::splat(2.0),
        };
        let p = instance.model_matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn unknown_animation_handle_errors() {
        let (store, model) = loaded();
        // A handle from a bigger store points past the end of this one
        let mut bigger = ResourceStore::new();
        bigger.add_scene(&rig_scene()).unwrap();
        let other = bigger.add_scene(&rig_scene()).unwrap().animations[0];
        let mut instance = ModelInstance::from_loaded(&model);
        instance.animation = Some(other);
        assert!(matches!(
            instance.update(&store, 0.0),
            Err(RigError::ResourceNotFound(_))
        ));
    }
}
