//! Orbit camera and bounding-volume camera fit

use glam::{Mat4, Vec3};
use rigbake_core::{Aabb, Result, RigError};

/// Smallest near plane a fit will produce
pub const MIN_NEAR_PLANE: f32 = 0.01;

/// A 3D camera orbiting a target point
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    /// Target point the camera looks at
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Aspect ratio (width / height)
    pub aspect: f32,

    // Orbit control state
    /// Distance from target
    pub distance: f32,
    /// Horizontal angle in radians
    pub yaw: f32,
    /// Vertical angle in radians
    pub pitch: f32,
}

impl Default for Camera {
    fn default() -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            aspect: 1.0,
            distance: 5.0,
            yaw: 0.0,
            pitch: 0.0,
        };
        camera.update_orbit();
        camera
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update position based on orbit parameters
    pub fn update_orbit(&mut self) {
        let offset = Vec3::new(
            self.distance * self.pitch.cos() * self.yaw.sin(),
            self.distance * self.pitch.sin(),
            self.distance * self.pitch.cos() * self.yaw.cos(),
        );
        self.position = self.target + offset;
    }

    /// Orbit horizontally (rotate around target)
    pub fn orbit_horizontal(&mut self, delta: f32) {
        self.yaw += delta;
        self.update_orbit();
    }

    /// Orbit vertically (tilt up/down)
    pub fn orbit_vertical(&mut self, delta: f32) {
        // 1.56 rad keeps the view just short of straight up/down
        self.pitch = (self.pitch + delta).clamp(-1.56, 1.56);
        self.update_orbit();
    }

    /// Zoom in/out
    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance - delta).clamp(0.1, 1000.0);
        self.update_orbit();
    }

    /// Pan the camera (move target)
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(self.up).normalize_or_zero();
        let up = right.cross(forward);

        self.target += right * dx + up * dy;
        self.update_orbit();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Right-handed perspective with wgpu's 0..1 depth range
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Frame `bounds` at the current fov and aspect, looking down -Z at its centre.
    /// The camera is left untouched when the fov or aspect cannot frame anything.
    pub fn snap_to_fit(&mut self, bounds: &Aabb) -> Result<CameraFit> {
        let fit = fit_to_bounds(bounds, self.fov.to_radians(), self.aspect)?;
        self.apply_fit(&fit, bounds.center());
        Ok(fit)
    }

    pub fn apply_fit(&mut self, fit: &CameraFit, target: Vec3) {
        self.target = target;
        self.distance = (fit.position - target).length();
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.up = Vec3::Y;
        self.position = fit.position;
        self.near = fit.near;
        self.far = fit.far;
    }
}

/// Camera placement that frames a bounding volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFit {
    pub position: Vec3,
    pub near: f32,
    pub far: f32,
}

/// Place a camera on +Z of `bounds` so the whole box is in view.
///
/// The distance is the larger of what the box's width needs at the horizontal fov and what
/// its height needs at `fov_y`, each measured from the front face. Near and far hug the box.
///
/// `fov_y` must lie in `(0, π)` radians and `aspect` must be finite and positive.
pub fn fit_to_bounds(bounds: &Aabb, fov_y: f32, aspect: f32) -> Result<CameraFit> {
    if !(fov_y > 0.0 && fov_y < std::f32::consts::PI) {
        return Err(RigError::InvalidArgument(format!(
            "vertical fov must be between 0 and 180 degrees, got {}",
            fov_y.to_degrees()
        )));
    }
    if !(aspect.is_finite() && aspect > 0.0) {
        return Err(RigError::InvalidArgument(format!(
            "aspect ratio must be positive, got {}",
            aspect
        )));
    }

    let size = bounds.size();
    let center = bounds.center();
    let (width, height, depth) = (size.x, size.y, size.z);

    let half_y = (fov_y / 2.0).tan();
    let fov_x = 2.0 * (half_y * aspect).atan();
    let half_x = (fov_x / 2.0).tan();

    let z_x = (width / 2.0) / half_x + depth / 2.0;
    let z_y = (height / 2.0) / half_y + depth / 2.0;
    let distance = z_x.max(z_y);

    let near = (distance - depth / 2.0).max(MIN_NEAR_PLANE);
    Ok(CameraFit {
        position: Vec3::new(center.x, center.y, center.z + distance),
        near,
        // A flat box would otherwise put far on top of near
        far: (distance + depth / 2.0).max(near + MIN_NEAR_PLANE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_box() -> Aabb {
        Aabb::new(Vec3::new(-10.0, -10.0, -5.0), Vec3::new(10.0, 10.0, 5.0))
    }

    #[test]
    fn fit_matches_closed_form() {
        let fit = fit_to_bounds(&reference_box(), 45f32.to_radians(), 16.0 / 9.0).unwrap();
        let d = 10.0 / 22.5f32.to_radians().tan() + 5.0;
        assert!((d - 29.142136).abs() < 1e-3);
        assert!(fit.position.abs_diff_eq(Vec3::new(0.0, 0.0, d), 1e-3));
        assert!((fit.near - (d - 5.0)).abs() < 1e-3);
        assert!((fit.far - (d + 5.0)).abs() < 1e-3);
    }

    #[test]
    fn narrow_aspect_is_width_bound() {
        // Tall viewport: the horizontal fov is the tight one
        let fit = fit_to_bounds(&reference_box(), 45f32.to_radians(), 0.5).unwrap();
        let half_x = (22.5f32.to_radians().tan() * 0.5).atan().tan();
        let expected = 10.0 / half_x + 5.0;
        assert!((fit.position.z - expected).abs() < 1e-3);
    }

    #[test]
    fn fit_puts_the_box_inside_the_frustum() {
        let bounds = reference_box();
        let mut camera = Camera {
            aspect: 16.0 / 9.0,
            ..Camera::default()
        };
        camera.snap_to_fit(&bounds).unwrap();
        let vp = camera.view_projection_matrix();

        for (a, b) in bounds.edges() {
            for corner in [a, b] {
                let clip = vp * corner.extend(1.0);
                let ndc = clip.truncate() / clip.w;
                assert!(ndc.x.abs() <= 1.0 + 1e-4, "{:?}", ndc);
                assert!(ndc.y.abs() <= 1.0 + 1e-4, "{:?}", ndc);
                assert!(ndc.z >= -1e-4 && ndc.z <= 1.0 + 1e-4, "{:?}", ndc);
            }
        }
    }

    #[test]
    fn flat_volume_keeps_positive_near() {
        let flat = Aabb::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let fit = fit_to_bounds(&flat, 90f32.to_radians(), 1.0).unwrap();
        assert!(fit.near >= MIN_NEAR_PLANE);
        assert!((fit.position.z - 1.0).abs() < 1e-5);
        assert!(fit.far > fit.near);

        let point = Aabb::new(Vec3::ONE, Vec3::ONE);
        let fit = fit_to_bounds(&point, 1.0, 1.0).unwrap();
        assert_eq!(fit.near, MIN_NEAR_PLANE);
    }

    #[test]
    fn rejects_fov_and_aspect_that_cannot_frame() {
        let bounds = reference_box();
        let fov = 45f32.to_radians();
        for aspect in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(
                matches!(fit_to_bounds(&bounds, fov, aspect), Err(RigError::InvalidArgument(_))),
                "aspect {}",
                aspect
            );
        }
        for fov_deg in [0.0f32, -30.0, 200.0] {
            assert!(
                matches!(
                    fit_to_bounds(&bounds, fov_deg.to_radians(), 1.0),
                    Err(RigError::InvalidArgument(_))
                ),
                "fov {}",
                fov_deg
            );
        }
        assert!(fit_to_bounds(&bounds, std::f32::consts::PI, 1.0).is_err());
        assert!(fit_to_bounds(&bounds, f32::NAN, 1.0).is_err());

        let mut camera = Camera {
            fov: 0.0,
            ..Camera::default()
        };
        let before = camera.clone();
        assert!(camera.snap_to_fit(&bounds).is_err());
        assert_eq!(camera, before);
    }

    #[test]
    fn snap_resets_orbit_to_look_down_negative_z() {
        let mut camera = Camera::default();
        camera.orbit_horizontal(1.0);
        camera.orbit_vertical(0.5);
        camera.snap_to_fit(&reference_box()).unwrap();
        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.pitch, 0.0);
        assert_eq!(camera.target, Vec3::ZERO);
        // Orbiting by zero reproduces the fitted position
        let fitted = camera.position;
        camera.update_orbit();
        assert!(camera.position.abs_diff_eq(fitted, 1e-4));
    }

    #[test]
    fn orbit_controls_clamp() {
        let mut camera = Camera::default();
        camera.orbit_vertical(10.0);
        assert_eq!(camera.pitch, 1.56);
        camera.zoom(1e6);
        assert_eq!(camera.distance, 0.1);
        camera.zoom(-1e6);
        assert_eq!(camera.distance, 1000.0);
        assert!(((camera.position - camera.target).length() - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn pan_moves_target_and_position_together() {
        let mut camera = Camera::default();
        let offset = camera.position - camera.target;
        camera.pan(1.0, 0.0);
        assert!(camera.target.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5));
        assert!((camera.position - camera.target).abs_diff_eq(offset, 1e-5));
    }
}
