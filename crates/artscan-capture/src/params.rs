use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Photo-burst settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoCaptureParams {
    /// Seconds the gaze must rest on the spatial mesh before the next photo.
    pub time_between_photos: f32,
}

impl Default for PhotoCaptureParams {
    fn default() -> Self {
        Self {
            time_between_photos: 2.0,
        }
    }
}

/// Video recording settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoCaptureParams {
    pub output_dir: PathBuf,
    /// Recordings are named `<prefix>_<index>_<millis>.mp4`.
    pub file_prefix: String,
}

impl Default for VideoCaptureParams {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            file_prefix: "capture".to_string(),
        }
    }
}
