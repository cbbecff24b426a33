//! Placement queries for artwork assets.
//!
//! [`PlacementSolver`] finds floor spots, [`ShapeDetection`] finds tables. Both
//! run one query at a time on a worker thread against a host-provided
//! [`SpatialUnderstanding`] backend and report through a non-blocking
//! `update()` polled on the main tick. [`AssetPlacer`] is the call site that
//! turns an answer into an `asset<id>` world anchor.

mod alignment;
mod asset;
mod backend;
mod error;
mod params;
mod shapes;
mod solver;
mod worker;

pub use alignment::PlayspaceAlignment;
pub use asset::{AssetOutcome, AssetPlacer, AssetRequest, AssetSurface, InputGate};
pub use backend::{
    PlacementConstraint, PlacementDefinition, PlacementQuery, PlacementResult, PlacementRule,
    ShapeResult, SpatialUnderstanding,
};
pub use error::PlacementError;
pub use params::{FloorPlacementParams, TableParams};
pub use shapes::{select_table, table_distance, table_position, DebugBox, ShapeDetection, TableMatch};
pub use solver::{floor_queries, nearest_in_band, FloorPlacement, PlacementSolver};
