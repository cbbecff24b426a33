use serde::{Deserialize, Serialize};

/// Matching strategy run by the recognition engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMethod {
    FeatureMatching,
    ImageHashing,
    #[default]
    HybridMatching,
}

impl ProcessingMethod {
    pub const ALL: [ProcessingMethod; 3] = [
        ProcessingMethod::FeatureMatching,
        ProcessingMethod::ImageHashing,
        ProcessingMethod::HybridMatching,
    ];
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorParams {
    /// Artwork ids outside `[0, artwork_limit)` are ignored everywhere.
    pub artwork_limit: usize,
    /// In user mode, keep scanning for artworks that have no scan area yet.
    pub scan_for_new_artworks: bool,
    /// Method used by live scanning. Caching always uses feature matching.
    pub live_scan_processing: ProcessingMethod,
    /// Anchor name under which the cached room mesh is stored.
    pub room_anchor_name: String,
}

impl Default for CoordinatorParams {
    fn default() -> Self {
        Self {
            artwork_limit: 100,
            scan_for_new_artworks: false,
            live_scan_processing: ProcessingMethod::HybridMatching,
            room_anchor_name: "room".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorParams {
    /// Maximum raycast length in meters.
    pub raycast_length: f32,
    /// Minimum agreement of opposite edge normals.
    pub planarity_threshold: f32,
    /// Distance from the wall to the scan-area anchor, along the wall normal.
    pub scan_area_offset: f32,
}

impl Default for ValidatorParams {
    fn default() -> Self {
        Self {
            raycast_length: 10.0,
            planarity_threshold: artscan_core::PLANARITY_THRESHOLD,
            scan_area_offset: 1.5,
        }
    }
}
