//! High-level facade for artwork recognition and world anchoring.
//!
//! This crate re-exports the sub-crates and wires them into one session:
//!
//! - [`core`]: artwork ids, anchors, geometry and planarity.
//! - [`capture`]: photo/video capture lifecycles.
//! - [`recognition`]: the recognition coordinator and spatial validation.
//! - [`placement`]: floor and table placement of 3D assets.
//!
//! ## Quickstart
//!
//! ```no_run
//! use artscan::core::{ArtworkCatalog, JsonAnchorStore};
//! use artscan::{AppConfig, AppContext, Devices};
//!
//! fn start(devices: Devices) -> Result<AppContext, Box<dyn std::error::Error>> {
//!     let config = AppConfig::load_json("artscan.json")?;
//!     artscan::init_logging(&config)?;
//!     let anchors = JsonAnchorStore::open("anchors.json")?;
//!     let catalog = ArtworkCatalog::load_json("artworks.json")?;
//!     Ok(AppContext::new(config, devices, Box::new(anchors), catalog))
//! }
//! ```

pub use artscan_capture as capture;
pub use artscan_core as core;
pub use artscan_placement as placement;
pub use artscan_recognition as recognition;

mod app;
mod config;

pub use app::{AppContext, Devices, Host, TickReport};
pub use config::{AppConfig, ConfigError};

pub use artscan_core::{ArtworkCatalog, ArtworkId, Pose, WorldAnchorStore};
pub use artscan_recognition::{
    reconcile_anchors, AnchorReport, RecognitionCoordinator, ScanAreaEvent, ScanState,
};

/// Install logging for a session.
///
/// With the `tracing` feature, `log` records are bridged into a `tracing`
/// subscriber filtered by `RUST_LOG`, falling back to `config.log_level`.
/// Otherwise the session logger is installed with the directives of
/// `config.log_level`.
pub fn init_logging(config: &AppConfig) -> Result<(), ConfigError> {
    let filter = config.log_filter()?;
    install_logger(config, filter)
}

#[cfg(feature = "tracing")]
fn install_logger(
    config: &AppConfig,
    _filter: artscan_core::LogFilter,
) -> Result<(), ConfigError> {
    // a subscriber may already be installed by the host
    let _ = tracing_log::LogTracer::init();
    artscan_core::init_tracing(false, &config.log_level);
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn install_logger(
    _config: &AppConfig,
    filter: artscan_core::LogFilter,
) -> Result<(), ConfigError> {
    artscan_core::init_with_filter(filter)?;
    Ok(())
}
