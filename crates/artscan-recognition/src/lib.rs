//! Recognition orchestration for artscan.
//!
//! The [`RecognitionCoordinator`] sits between the camera and the matching
//! engine. It turns engine hits into world-space [`Recognition`]s, checks them
//! against the spatial mesh with a [`SpatialValidator`], anchors the valid
//! ones and keeps the engine's model set in step with where the user is.
//!
//! ## Quickstart
//!
//! ```no_run
//! use artscan_core::Resolution;
//! use artscan_recognition::{
//!     engine_channel, BackgroundEngine, CoordinatorParams, FrameMatcher, RecognitionCoordinator,
//!     ValidatorParams,
//! };
//!
//! fn build<M: FrameMatcher>(matcher: M) -> RecognitionCoordinator {
//!     let (tx, rx) = engine_channel();
//!     let engine = BackgroundEngine::new(matcher, tx);
//!     RecognitionCoordinator::new(
//!         CoordinatorParams::default(),
//!         ValidatorParams::default(),
//!         Resolution::new(1408, 792),
//!         Box::new(engine),
//!         rx,
//!     )
//! }
//! ```

mod background;
mod coordinator;
mod engine;
mod model_ops;
mod params;
mod reconcile;
mod scan_area;
mod services;
mod validator;

pub use background::{BackgroundEngine, FrameMatcher};
pub use coordinator::{RecognitionCoordinator, ScanState};
pub use engine::{
    engine_channel, EngineError, EngineEvent, EngineHit, HitKind, RecognitionEngine,
};
pub use model_ops::{ModelOpQueue, ModelOperation};
pub use params::{CoordinatorParams, ProcessingMethod, ValidatorParams};
pub use reconcile::{reconcile_anchors, AnchorReport, SkippedAnchor};
pub use scan_area::{ScanAreaEvent, ScanAreaTracker};
pub use services::{ArtworkSource, Presenter, RaycastHit, RoomCache, Services, SpatialMesh};
pub use validator::{
    validate_quad, PlacedArtwork, Recognition, SpatialValidator, ValidationFailure,
    ValidationStatus,
};
