//! Spatial types

use glam::{EulerRot, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A 3D transform with position, rotation (Euler angles) and scale.
///
/// Kept as separate components and composed on demand; nothing caches the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Rotation in radians (Euler angles applied X, then Y, then Z)
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn rotation_quat(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        )
    }

    /// Compose `T * R * S`
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation_quat(), self.position)
    }
}

/// Axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Inverted box that any point will grow; the identity for `union`
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Compute bounds from a set of points
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.include(p);
        }
        aabb
    }

    /// Grow the box to contain `point`
    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// True until at least one point has been included
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Merge with another box to get the union
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// True if `other` lies entirely inside this box (within `epsilon`)
    pub fn contains(&self, other: &Aabb, epsilon: f32) -> bool {
        other.min.cmpge(self.min - Vec3::splat(epsilon)).all()
            && other.max.cmple(self.max + Vec3::splat(epsilon)).all()
    }

    /// The 12 edges of the box as line segments
    pub fn edges(&self) -> [(Vec3, Vec3); 12] {
        let (lo, hi) = (self.min, self.max);
        let c = |x: f32, y: f32, z: f32| Vec3::new(x, y, z);
        [
            (c(lo.x, lo.y, lo.z), c(hi.x, lo.y, lo.z)),
            (c(lo.x, hi.y, lo.z), c(hi.x, hi.y, lo.z)),
            (c(lo.x, lo.y, hi.z), c(hi.x, lo.y, hi.z)),
            (c(lo.x, hi.y, hi.z), c(hi.x, hi.y, hi.z)),
            (c(lo.x, lo.y, lo.z), c(lo.x, hi.y, lo.z)),
            (c(hi.x, lo.y, lo.z), c(hi.x, hi.y, lo.z)),
            (c(lo.x, lo.y, hi.z), c(lo.x, hi.y, hi.z)),
            (c(hi.x, lo.y, hi.z), c(hi.x, hi.y, hi.z)),
            (c(lo.x, lo.y, lo.z), c(lo.x, lo.y, hi.z)),
            (c(hi.x, lo.y, lo.z), c(hi.x, lo.y, hi.z)),
            (c(lo.x, hi.y, lo.z), c(lo.x, hi.y, hi.z)),
            (c(hi.x, hi.y, lo.z), c(hi.x, hi.y, hi.z)),
        ]
    }
}

impl std::fmt::Display for Aabb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = self.size();
        write!(
            f,
            "{:.2} x {:.2} x {:.2} (min [{:.2}, {:.2}, {:.2}], max [{:.2}, {:.2}, {:.2}])",
            s.x, s.y, s.z,
            self.min.x, self.min.y, self.min.z,
            self.max.x, self.max.y, self.max.z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_identity_matrix() {
        let m = Transform::IDENTITY.to_matrix();
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn transform_applies_scale_then_rotation_then_translation() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            scale: Vec3::splat(2.0),
        };
        let p = t.to_matrix().transform_point3(Vec3::X);
        // (1,0,0) scaled to (2,0,0), rotated 90 degrees about Y to (0,0,-2), then translated
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1e-5), "got {:?}", p);
    }

    #[test]
    fn empty_aabb_grows_to_points() {
        let mut b = Aabb::EMPTY;
        assert!(b.is_empty());
        b.include(Vec3::new(1.0, -2.0, 3.0));
        b.include(Vec3::new(-1.0, 4.0, 0.0));
        assert!(!b.is_empty());
        assert_eq!(b.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 4.0, 3.0));
        assert_eq!(b.size(), Vec3::new(2.0, 6.0, 3.0));
        assert_eq!(b.center(), Vec3::new(0.0, 1.0, 1.5));
    }

    #[test]
    fn union_and_contains() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(-1.0), Vec3::splat(0.5));
        let u = a.union(&b);
        assert!(u.contains(&a, 0.0));
        assert!(u.contains(&b, 0.0));
        assert!(!a.contains(&u, 0.0));
    }

    #[test]
    fn box_has_twelve_axis_aligned_edges() {
        let b = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        for (p, q) in b.edges() {
            let d = (q - p).abs();
            let nonzero = [d.x, d.y, d.z].iter().filter(|v| **v > 0.0).count();
            assert_eq!(nonzero, 1);
        }
    }
}
