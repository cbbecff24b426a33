//! Table detection on the analysed room.

use std::sync::Arc;

use nalgebra::{Point3, UnitQuaternion, Vector3};

use crate::worker::{PendingQuery, Poll};
use crate::{PlacementError, PlayspaceAlignment, ShapeResult, SpatialUnderstanding, TableParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Answer to [`ShapeDetection::find_table`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableMatch {
    /// Centre of the table top's underside, `None` when no table qualified.
    pub position: Option<Point3<f32>>,
    pub alignment: PlayspaceAlignment,
}

impl TableMatch {
    pub fn success(&self) -> bool {
        self.position.is_some()
    }
}

/// A box for debug rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DebugBox {
    pub center: Point3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub half_dims: Vector3<f32>,
}

fn half_size(shape: &ShapeResult, params: &TableParams) -> Vector3<f32> {
    if shape.half_dims.norm_squared() < 0.01 {
        Vector3::from(params.default_half_dims)
    } else {
        shape.half_dims
    }
}

/// Shape position lowered by its (possibly defaulted) half height.
pub fn table_position(shape: &ShapeResult, params: &TableParams) -> Point3<f32> {
    let half = half_size(shape, params);
    Point3::new(
        shape.position.x,
        shape.position.y - half.y,
        shape.position.z,
    )
}

/// Distance to `near` if `shape` is an acceptable table.
pub fn table_distance(
    shape: &ShapeResult,
    near: &Point3<f32>,
    alignment: &PlayspaceAlignment,
    params: &TableParams,
) -> Option<f32> {
    let position = table_position(shape, params);
    let distance = (position - near).norm();
    let height_ok = position.y >= alignment.floor_y + params.min_height
        && position.y <= alignment.floor_y + params.max_height;

    let (hx, hz) = (shape.half_dims.x, shape.half_dims.z);
    let width = hx.max(hz);
    let depth = hx.min(hz);
    let size_ok = width >= params.min_width * 0.5 && depth >= params.min_depth * 0.5;

    (distance <= params.max_distance && height_ok && size_ok).then_some(distance)
}

/// Closest acceptable table. On equal distance the later shape wins.
pub fn select_table(
    shapes: &[ShapeResult],
    near: &Point3<f32>,
    alignment: &PlayspaceAlignment,
    params: &TableParams,
) -> Option<(Point3<f32>, f32)> {
    let mut best: Option<(Point3<f32>, f32)> = None;
    for shape in shapes {
        let Some(distance) = table_distance(shape, near, alignment, params) else {
            continue;
        };
        if best.is_none_or(|(_, d)| distance <= d) {
            best = Some((table_position(shape, params), distance));
        }
    }
    best
}

struct Found {
    shapes: Vec<ShapeResult>,
    alignment: PlayspaceAlignment,
}

struct ActiveQuery {
    near: Option<Point3<f32>>,
    pending: PendingQuery<Found>,
}

pub struct ShapeDetection {
    backend: Arc<dyn SpatialUnderstanding>,
    params: TableParams,
    query: Option<ActiveQuery>,
    boxes: Vec<DebugBox>,
}

impl ShapeDetection {
    pub fn new(backend: Arc<dyn SpatialUnderstanding>, params: TableParams) -> Self {
        Self {
            backend,
            params,
            query: None,
            boxes: Vec::new(),
        }
    }

    pub fn params(&self) -> &TableParams {
        &self.params
    }

    pub fn is_busy(&self) -> bool {
        self.query.is_some()
    }

    /// Tables collected by [`find_all_tables`](Self::find_all_tables).
    pub fn debug_boxes(&self) -> &[DebugBox] {
        &self.boxes
    }

    pub fn clear_geometry(&mut self) {
        self.boxes.clear();
    }

    /// Closest table near `near`; the answer arrives through [`update`](Self::update).
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn find_table(&mut self, near: Point3<f32>) -> Result<(), PlacementError> {
        self.start(Some(near))
    }

    /// Every table in the room, for display only.
    pub fn find_all_tables(&mut self) -> Result<(), PlacementError> {
        self.start(None)
    }

    fn start(&mut self, near: Option<Point3<f32>>) -> Result<(), PlacementError> {
        if self.query.is_some() {
            return Err(PlacementError::Busy);
        }
        if !self.backend.is_ready() {
            return Err(PlacementError::NotReady);
        }
        let backend = Arc::clone(&self.backend);
        let name = self.params.shape_name.clone();
        let max = self.params.max_shapes;
        let pending = PendingQuery::spawn("shapes", move || Found {
            shapes: backend.find_shapes(&name, max),
            alignment: backend.playspace_alignment(),
        })?;
        self.query = Some(ActiveQuery { near, pending });
        Ok(())
    }

    /// Poll the running query. `find_table` queries answer exactly once,
    /// `find_all_tables` only fills the debug boxes.
    pub fn update(&mut self) -> Option<TableMatch> {
        let active = self.query.as_mut()?;
        let found = match active.pending.poll() {
            Poll::Pending => return None,
            Poll::Ready(found) => Some(found),
            Poll::Lost => None,
        };
        let active = self.query.take()?;
        let alignment = found
            .as_ref()
            .map_or_else(|| self.backend.playspace_alignment(), |f| f.alignment);
        let shapes = found.map(|f| f.shapes).unwrap_or_default();
        log::info!(
            "find shape '{}' ({})",
            self.params.shape_name,
            shapes.len()
        );

        let Some(near) = active.near else {
            let rotation = alignment.rotation();
            self.boxes.extend(shapes.iter().map(|s| DebugBox {
                center: s.position,
                rotation,
                half_dims: half_size(s, &self.params),
            }));
            return None;
        };

        let position = select_table(&shapes, &near, &alignment, &self.params).map(|(p, d)| {
            log::debug!("table distance {d:.2}");
            p
        });
        Some(TableMatch {
            position,
            alignment,
        })
    }
}
