//! Core types and utilities for artwork recognition and world anchoring.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any camera, recognition engine or spatial-mapping backend; those
//! are reached through the traits defined in the sibling crates.

mod anchor;
mod artwork;
mod geometry;
mod logger;
mod planarity;

pub use anchor::{
    AnchorName, AnchorNameError, AnchorStoreError, JsonAnchorStore, MemoryAnchorStore,
    WorldAnchorStore, ARTWORK_ANCHOR_PREFIX, ASSET_ANCHOR_PREFIX,
};
pub use artwork::{
    ArtworkCatalog, ArtworkFlags, ArtworkId, ArtworkRecord, CatalogError, EligibleIds,
};
pub use geometry::{
    look_rotation, ndc_to_pixel, pixel_to_ndc, project_vector, unproject_vector, CameraMatrices,
    ImageQuad, Pose, Resolution, WorldQuad,
};
pub use planarity::{is_planar, planarity_scores, PlanarityScores, PLANARITY_THRESHOLD};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_filter, init_with_level, LogFilter, LogFilterError};
