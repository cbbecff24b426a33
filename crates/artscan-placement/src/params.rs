use serde::{Deserialize, Serialize};

/// Candidate shape of a floor placement query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorPlacementParams {
    /// Candidate definitions tried per query.
    pub candidates: usize,
    /// Half extent of the footprint along x and z.
    pub half_dim: f32,
    /// Half height as a multiple of `half_dim`.
    pub height_factor: f32,
    /// Minimum distance to already placed objects, as a multiple of `half_dim`.
    pub keep_away_factor: f32,
    pub near_min_distance: f32,
    pub near_max_distance: f32,
}

impl Default for FloorPlacementParams {
    fn default() -> Self {
        Self {
            candidates: 4,
            half_dim: 0.25,
            height_factor: 3.6,
            keep_away_factor: 3.0,
            near_min_distance: 0.5,
            near_max_distance: 2.0,
        }
    }
}

/// Filter applied to table-shaped surfaces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableParams {
    pub shape_name: String,
    pub max_shapes: usize,
    /// Maximum distance from the query point.
    pub max_distance: f32,
    /// Band above the floor the table top must lie in.
    pub min_height: f32,
    pub max_height: f32,
    pub min_width: f32,
    pub min_depth: f32,
    /// Used when the backend reports (near) zero extents.
    pub default_half_dims: [f32; 3],
}

impl Default for TableParams {
    fn default() -> Self {
        Self {
            shape_name: "Table".to_string(),
            max_shapes: 32,
            max_distance: 2.0,
            min_height: 0.55,
            max_height: 1.5,
            min_width: 0.35,
            min_depth: 0.35,
            default_half_dims: [0.25, 0.025, 0.25],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_params_from_partial_json() {
        let json = r#"{ "shape_name": "Desk", "default_half_dims": [0.3, 0.02, 0.2] }"#;
        let params: TableParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.shape_name, "Desk");
        assert_eq!(params.default_half_dims, [0.3, 0.02, 0.2]);
        assert_eq!(params.max_shapes, 32);
        assert_eq!(params.min_height, 0.55);
    }

    #[test]
    fn floor_params_survive_json() {
        let json = serde_json::to_value(FloorPlacementParams::default()).unwrap();
        assert_eq!(json["candidates"], 4);
        let back: FloorPlacementParams = serde_json::from_value(json).unwrap();
        assert_eq!(back, FloorPlacementParams::default());
    }
}
