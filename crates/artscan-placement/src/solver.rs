//! Floor placement near a point.
//!
//! A query tries several candidate boxes on a worker thread. Results are
//! picked up by [`PlacementSolver::update`] on the main tick.

use std::sync::Arc;

use nalgebra::{Point3, Vector3};

use crate::worker::{PendingQuery, Poll};
use crate::{
    FloorPlacementParams, PlacementConstraint, PlacementDefinition, PlacementError,
    PlacementQuery, PlacementResult, PlacementRule, PlayspaceAlignment, SpatialUnderstanding,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

const FLOOR_QUERY_NAME: &str = "OnFloor - NearPoint";

/// Answer to [`PlacementSolver::query_on_floor_near_point`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FloorPlacement {
    /// Bottom centre of the placed box.
    Placed(Point3<f32>),
    NotFound,
}

impl FloorPlacement {
    pub fn success(&self) -> bool {
        matches!(self, Self::Placed(_))
    }

    /// Placement position, origin when nothing was found.
    pub fn position(&self) -> Point3<f32> {
        match self {
            Self::Placed(p) => *p,
            Self::NotFound => Point3::origin(),
        }
    }
}

#[derive(Debug, Default)]
struct Outcome {
    results: Vec<PlacementResult>,
    failed: usize,
}

struct ActiveQuery {
    name: String,
    origin: Point3<f32>,
    draw_debug: bool,
    pending: PendingQuery<Outcome>,
}

/// Floor candidates around `pos`, all identical.
pub fn floor_queries(pos: Point3<f32>, params: &FloorPlacementParams) -> Vec<PlacementQuery> {
    let h = params.half_dim;
    let query = PlacementQuery {
        definition: PlacementDefinition::OnFloor {
            half_dims: Vector3::new(h, h * params.height_factor, h),
        },
        rules: vec![PlacementRule::AwayFromOtherObjects {
            min_distance: h * params.keep_away_factor,
        }],
        constraints: vec![PlacementConstraint::NearPoint {
            point: pos,
            min_distance: params.near_min_distance,
            max_distance: params.near_max_distance,
        }],
    };
    vec![query; params.candidates]
}

/// Result closest to `origin` that lies between floor and ceiling.
pub fn nearest_in_band<'a>(
    results: &'a [PlacementResult],
    origin: &Point3<f32>,
    alignment: &PlayspaceAlignment,
) -> Option<&'a PlacementResult> {
    results
        .iter()
        .filter(|r| alignment.between_floor_and_ceiling(r.position.y))
        .min_by(|a, b| {
            let da = (a.position - origin).norm_squared();
            let db = (b.position - origin).norm_squared();
            da.total_cmp(&db)
        })
}

pub struct PlacementSolver {
    backend: Arc<dyn SpatialUnderstanding>,
    params: FloorPlacementParams,
    initialized: bool,
    query: Option<ActiveQuery>,
    placed: Vec<PlacementResult>,
}

impl PlacementSolver {
    pub fn new(backend: Arc<dyn SpatialUnderstanding>, params: FloorPlacementParams) -> Self {
        Self {
            backend,
            params,
            initialized: false,
            query: None,
            placed: Vec::new(),
        }
    }

    pub fn params(&self) -> &FloorPlacementParams {
        &self.params
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_busy(&self) -> bool {
        self.query.is_some()
    }

    /// Boxes accepted by queries issued with `draw_debug`.
    pub fn debug_placements(&self) -> &[PlacementResult] {
        &self.placed
    }

    /// Initialise the backend solver once scanning is done.
    pub fn initialize(&mut self) -> bool {
        if !self.initialized && self.backend.is_ready() {
            self.initialized = self.backend.init_solver();
        }
        self.initialized
    }

    /// Drop debug boxes, optionally also every object the backend placed.
    pub fn clear_geometry(&mut self, remove_all_objects: bool) {
        self.placed.clear();
        if remove_all_objects && self.backend.is_ready() {
            self.backend.remove_all_objects();
        }
    }

    pub fn clear(&mut self) {
        self.clear_geometry(true);
        self.initialized = false;
    }

    /// Look for a floor spot near `pos`. Rejected while another query runs.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip(self)))]
    pub fn query_on_floor_near_point(
        &mut self,
        pos: Point3<f32>,
        draw_debug: bool,
    ) -> Result<(), PlacementError> {
        if self.query.is_some() {
            return Err(PlacementError::Busy);
        }
        if !self.initialize() {
            return Err(PlacementError::NotReady);
        }

        let queries = floor_queries(pos, &self.params);
        let backend = Arc::clone(&self.backend);
        let pending = PendingQuery::spawn("floor", move || {
            let mut outcome = Outcome::default();
            for query in &queries {
                match backend.place_object(FLOOR_QUERY_NAME, query) {
                    Some(result) => outcome.results.push(result),
                    None => outcome.failed += 1,
                }
            }
            outcome
        })?;
        log::debug!("{FLOOR_QUERY_NAME} (processing)");
        self.query = Some(ActiveQuery {
            name: FLOOR_QUERY_NAME.to_string(),
            origin: pos,
            draw_debug,
            pending,
        });
        Ok(())
    }

    /// Poll the running query. Returns its answer exactly once.
    pub fn update(&mut self) -> Option<FloorPlacement> {
        let active = self.query.as_mut()?;
        let outcome = match active.pending.poll() {
            Poll::Pending => return None,
            Poll::Ready(outcome) => outcome,
            Poll::Lost => Outcome::default(),
        };
        let active = self.query.take()?;

        let alignment = self.backend.playspace_alignment();
        let chosen = nearest_in_band(&outcome.results, &active.origin, &alignment).copied();
        log::info!(
            "{} ({}/{})",
            active.name,
            usize::from(chosen.is_some()),
            outcome.results.len() + outcome.failed
        );
        Some(match chosen {
            Some(result) => {
                if active.draw_debug {
                    self.placed.push(result);
                }
                FloorPlacement::Placed(result.base())
            }
            None => FloorPlacement::NotFound,
        })
    }
}
