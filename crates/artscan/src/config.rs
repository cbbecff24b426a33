//! JSON application configuration.

use std::fs;
use std::path::Path;

use artscan_capture::{PhotoCaptureParams, VideoCaptureParams};
use artscan_placement::{FloorPlacementParams, TableParams};
use artscan_recognition::{CoordinatorParams, ValidatorParams};
use artscan_core::LogFilter;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    LogLevel(#[from] artscan_core::LogFilterError),
    #[error(transparent)]
    Logger(#[from] log::SetLoggerError),
}

/// Every tunable of a session. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// A level (`off` to `trace`) optionally followed by per-target
    /// overrides, e.g. `info,artscan_capture=debug`.
    pub log_level: String,
    /// Radius of the scan-area trigger spheres, in metres.
    pub scan_area_radius: f32,
    pub coordinator: CoordinatorParams,
    pub validator: ValidatorParams,
    pub photo: PhotoCaptureParams,
    pub video: VideoCaptureParams,
    pub placement: FloorPlacementParams,
    pub tables: TableParams,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            scan_area_radius: 1.5,
            coordinator: CoordinatorParams::default(),
            validator: ValidatorParams::default(),
            photo: PhotoCaptureParams::default(),
            video: VideoCaptureParams::default(),
            placement: FloorPlacementParams::default(),
            tables: TableParams::default(),
        }
    }
}

impl AppConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn log_filter(&self) -> Result<LogFilter, ConfigError> {
        Ok(self.log_level.parse()?)
    }
}
