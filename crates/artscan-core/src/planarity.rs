//! Planarity test for a hit quadrilateral.
//!
//! Each edge of the quad, together with the middle point, spans a triangle.
//! For a flat, convex quad all four triangle normals point the same way, so
//! the normals of opposite edges are nearly parallel.

use nalgebra::{Point3, Vector3};

/// Minimum dot product between opposite triangle normals.
pub const PLANARITY_THRESHOLD: f32 = 0.97;

/// Dot products of the normals of opposite edge triangles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarityScores {
    /// Top edge vs bottom edge.
    pub dot1: f32,
    /// Right edge vs left edge.
    pub dot2: f32,
}

impl PlanarityScores {
    #[inline]
    pub fn accepts(&self, threshold: f32) -> bool {
        self.dot1 > threshold && self.dot2 > threshold
    }
}

fn edge_normal(from: &Point3<f32>, to: &Point3<f32>, middle: &Point3<f32>) -> Vector3<f32> {
    let n = (to - from).cross(&(middle - from));
    n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
}

/// Triangle-normal agreement of the quad `tl → tr → br → bl` around `middle`.
///
/// Degenerate edges produce a zero normal and therefore a zero score.
pub fn planarity_scores(
    middle: &Point3<f32>,
    top_left: &Point3<f32>,
    top_right: &Point3<f32>,
    bottom_right: &Point3<f32>,
    bottom_left: &Point3<f32>,
) -> PlanarityScores {
    let c1 = edge_normal(top_left, top_right, middle);
    let c2 = edge_normal(top_right, bottom_right, middle);
    let c3 = edge_normal(bottom_right, bottom_left, middle);
    let c4 = edge_normal(bottom_left, top_left, middle);
    PlanarityScores {
        dot1: c1.dot(&c3),
        dot2: c2.dot(&c4),
    }
}

/// `true` when both opposite-normal scores exceed `threshold`.
pub fn is_planar(
    middle: &Point3<f32>,
    corners: &[Point3<f32>; 4],
    threshold: f32,
) -> bool {
    planarity_scores(middle, &corners[0], &corners[1], &corners[2], &corners[3]).accepts(threshold)
}
