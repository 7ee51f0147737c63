//! Keyframe channels and per-bone tracks

use glam::{Mat4, Quat, Vec3};
use rigbake_core::{Result, RigError};

/// A keyframe value type that can be blended between two keys
pub trait Interpolate: Copy {
    fn interpolate(a: Self, b: Self, frac: f32) -> Self;

    /// Whether the value can be stored in a channel
    fn is_valid(&self) -> bool;
}

impl Interpolate for Vec3 {
    fn interpolate(a: Self, b: Self, frac: f32) -> Self {
        a.lerp(b, frac)
    }

    fn is_valid(&self) -> bool {
        self.is_finite()
    }
}

impl Interpolate for Quat {
    /// Shortest-path slerp, renormalised
    fn interpolate(a: Self, b: Self, frac: f32) -> Self {
        a.normalize().slerp(b.normalize(), frac).normalize()
    }

    fn is_valid(&self) -> bool {
        self.is_finite() && self.length_squared() > 0.0
    }
}

/// Parallel timestamps (seconds, strictly ascending) and values. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Channel<T> {
    times: Vec<f32>,
    values: Vec<T>,
}

impl<T: Interpolate> Channel<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>) -> Result<Self> {
        if times.is_empty() {
            return Err(RigError::MalformedAnimation("channel has no keyframes".into()));
        }
        if times.len() != values.len() {
            return Err(RigError::MalformedAnimation(format!(
                "channel has {} timestamps but {} values",
                times.len(),
                values.len()
            )));
        }
        if let Some(i) = times.iter().position(|t| !t.is_finite()) {
            return Err(RigError::MalformedAnimation(format!(
                "keyframe {} has a non-finite timestamp",
                i
            )));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(RigError::MalformedAnimation(format!(
                "timestamps not strictly ascending at keyframe {} ({} then {})",
                i + 1,
                times[i],
                times[i + 1]
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_valid()) {
            return Err(RigError::MalformedAnimation(format!(
                "keyframe {} has an invalid value",
                i
            )));
        }
        Ok(Self { times, values })
    }

    /// A single key at time zero
    pub fn constant(value: T) -> Self {
        Self {
            times: vec![0.0],
            values: vec![value],
        }
    }

    /// Sample at `t` seconds.
    ///
    /// Before the first key returns the first value, at or after the last key returns the
    /// last value. No extrapolation.
    pub fn sample(&self, t: f32) -> T {
        // First keyframe strictly after t
        let idx = self.times.partition_point(|&ts| ts <= t);
        if idx == 0 {
            return self.values[0];
        }
        if idx == self.times.len() {
            return self.values[idx - 1];
        }
        let start = self.times[idx - 1];
        let end = self.times[idx];
        let frac = (t - start) / (end - start);
        T::interpolate(self.values[idx - 1], self.values[idx], frac)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}

/// Keyframes for one bone: three independently timed channels
#[derive(Debug, Clone, PartialEq)]
pub struct BoneTrack {
    pub positions: Channel<Vec3>,
    pub rotations: Channel<Quat>,
    pub scales: Channel<Vec3>,
}

impl BoneTrack {
    pub fn new(positions: Channel<Vec3>, rotations: Channel<Quat>, scales: Channel<Vec3>) -> Self {
        Self {
            positions,
            rotations,
            scales,
        }
    }

    /// Track holding one fixed transform
    pub fn constant(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self::new(
            Channel::constant(position),
            Channel::constant(rotation),
            Channel::constant(scale),
        )
    }

    /// Interpolated translation, rotation, scale at `t` seconds
    pub fn sample(&self, t: f32) -> (Vec3, Quat, Vec3) {
        (
            self.positions.sample(t),
            self.rotations.sample(t),
            self.scales.sample(t),
        )
    }

    /// Local transform `T * R * S` at `t` seconds
    pub fn local_transform(&self, t: f32) -> Mat4 {
        let (translation, rotation, scale) = self.sample(t);
        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }

    /// Time of the last key across all channels
    pub fn end_time(&self) -> f32 {
        [
            self.positions.times(),
            self.rotations.times(),
            self.scales.times(),
        ]
        .iter()
        .filter_map(|times| times.last().copied())
        .fold(0.0, f32::max)
    }
}
