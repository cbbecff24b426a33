//! The spatial-understanding seam.
//!
//! Queries run on worker threads, so implementations must be shareable.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::PlayspaceAlignment;

/// Where an object may go.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementDefinition {
    /// Box standing on the floor.
    OnFloor { half_dims: Vector3<f32> },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementRule {
    AwayFromOtherObjects { min_distance: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementConstraint {
    NearPoint {
        point: Point3<f32>,
        min_distance: f32,
        max_distance: f32,
    },
}

/// One candidate query.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementQuery {
    pub definition: PlacementDefinition,
    pub rules: Vec<PlacementRule>,
    pub constraints: Vec<PlacementConstraint>,
}

/// A box the solver managed to place. `position` is its centre.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementResult {
    pub position: Point3<f32>,
    pub half_dims: Vector3<f32>,
    pub forward: Vector3<f32>,
    pub up: Vector3<f32>,
}

impl PlacementResult {
    /// Centre of the bottom face.
    #[inline]
    pub fn base(&self) -> Point3<f32> {
        Point3::new(
            self.position.x,
            self.position.y - self.half_dims.y,
            self.position.z,
        )
    }
}

/// A detected shape. `position` is the centre of its bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShapeResult {
    pub position: Point3<f32>,
    pub half_dims: Vector3<f32>,
}

/// Spatial-understanding service of the host.
pub trait SpatialUnderstanding: Send + Sync {
    /// Scanning is finished and queries are allowed.
    fn is_ready(&self) -> bool;

    /// Prepare the placement solver. Returns `true` once initialised.
    fn init_solver(&self) -> bool;

    /// Place one object. The placed object is remembered by the backend and
    /// takes part in later `AwayFromOtherObjects` rules.
    fn place_object(&self, name: &str, query: &PlacementQuery) -> Option<PlacementResult>;

    /// Forget every object placed so far.
    fn remove_all_objects(&self);

    fn playspace_alignment(&self) -> PlayspaceAlignment;

    /// Up to `max_results` matches of a registered shape.
    fn find_shapes(&self, shape_name: &str, max_results: usize) -> Vec<ShapeResult>;
}
