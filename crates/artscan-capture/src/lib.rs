//! Camera capture for the artscan pipeline.
//!
//! [`PhotoCapture`] takes one photo at a time while the user looks at the
//! spatial mesh and hands it to a [`FrameSink`]. [`VideoCapture`] records
//! mixed-reality video. [`CaptureManager`] owns both and makes sure only one
//! of them holds the camera.
//!
//! Everything here is driven by `tick` calls from a single thread. Device
//! completions arrive on channels and are applied at the start of a tick.

mod device;
mod error;
mod manager;
mod params;
mod photo;
mod video;

pub use device::{
    photo_channel, video_channel, CaptureControl, Frame, FrameSink, PhotoDevice, PhotoEvent,
    RawPhoto, VideoDevice, VideoEvent, PIXEL_FORMAT_8UC3,
};
pub use error::CameraError;
pub use manager::{CaptureManager, CaptureMode};
pub use params::{PhotoCaptureParams, VideoCaptureParams};
pub use photo::PhotoCapture;
pub use video::VideoCapture;
