//! The playspace frame reported by spatial understanding.

use nalgebra::{Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Orientation and extent of the user's room.
///
/// `basis_y` points up; `basis_x` and `basis_z` follow the dominant walls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayspaceAlignment {
    pub center: Point3<f32>,
    pub half_dims: Vector3<f32>,
    pub basis_x: Vector3<f32>,
    pub basis_y: Vector3<f32>,
    pub basis_z: Vector3<f32>,
    pub floor_y: f32,
    pub ceiling_y: f32,
}

impl Default for PlayspaceAlignment {
    fn default() -> Self {
        Self {
            center: Point3::origin(),
            half_dims: Vector3::zeros(),
            basis_x: Vector3::x(),
            basis_y: Vector3::y(),
            basis_z: Vector3::z(),
            floor_y: 0.0,
            ceiling_y: 0.0,
        }
    }
}

impl PlayspaceAlignment {
    /// Strictly between floor and ceiling.
    #[inline]
    pub fn between_floor_and_ceiling(&self, y: f32) -> bool {
        y > self.floor_y && y < self.ceiling_y
    }

    /// The horizontal room axis (`±basis_x`, `±basis_z`) closest to `forward`.
    ///
    /// Ties keep the earlier axis.
    pub fn closest_axis(&self, forward: &Vector3<f32>) -> Vector3<f32> {
        let axes = [self.basis_x, -self.basis_x, self.basis_z, -self.basis_z];
        let mut best = 0;
        for i in 1..axes.len() {
            if axes[i].dot(forward) > axes[best].dot(forward) {
                best = i;
            }
        }
        axes[best]
    }

    /// Upright orientation looking along the room axis closest to `forward`.
    pub fn aligned_rotation(&self, forward: &Vector3<f32>) -> UnitQuaternion<f32> {
        UnitQuaternion::face_towards(&self.closest_axis(forward), &self.basis_y)
    }

    /// Orientation of the room frame itself.
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        UnitQuaternion::face_towards(&self.basis_z, &self.basis_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn room() -> PlayspaceAlignment {
        PlayspaceAlignment {
            floor_y: -1.6,
            ceiling_y: 1.0,
            ..PlayspaceAlignment::default()
        }
    }

    #[test]
    fn band_is_exclusive() {
        let a = room();
        assert!(a.between_floor_and_ceiling(0.0));
        assert!(!a.between_floor_and_ceiling(-1.6));
        assert!(!a.between_floor_and_ceiling(1.2));
    }

    #[test]
    fn picks_axis_facing_the_artwork() {
        let a = room();
        let forward = Vector3::new(-0.3, 0.0, -0.9);
        assert_relative_eq!(a.closest_axis(&forward), -Vector3::z());

        let rot = a.aligned_rotation(&forward);
        assert_relative_eq!(rot * Vector3::z(), -Vector3::z(), epsilon = 1e-6);
        assert_relative_eq!(rot * Vector3::y(), Vector3::y(), epsilon = 1e-6);
    }

    #[test]
    fn tie_keeps_first_axis() {
        let a = room();
        let diagonal = Vector3::new(1.0, 0.0, 1.0);
        assert_relative_eq!(a.closest_axis(&diagonal), Vector3::x());
    }
}
