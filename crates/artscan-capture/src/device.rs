//! Hardware seams and the frame hand-off.
//!
//! Camera requests never block. A device acknowledges each request later by
//! sending an event on the channel created with [`photo_channel`] or
//! [`video_channel`]; the capture state machines drain those channels once per
//! tick.

use std::path::Path;

use artscan_core::{CameraMatrices, Resolution};
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::CameraError;

/// OpenCV type code of an 8-bit, 3-channel image.
pub const PIXEL_FORMAT_8UC3: i32 = 16;

/// A photo as delivered by the camera: BGRA32 rows, origin top-left.
#[derive(Clone, Debug, PartialEq)]
pub struct RawPhoto {
    pub resolution: Resolution,
    pub bgra: Vec<u8>,
    /// Pose and intrinsics, when the platform could provide them.
    pub matrices: Option<CameraMatrices>,
}

/// A tightly packed BGR frame ready for recognition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixel_format: i32,
    pub data: Vec<u8>,
}

impl Frame {
    /// Drop the alpha channel of a BGRA32 buffer.
    pub fn from_bgra(resolution: Resolution, bgra: &[u8]) -> Result<Self, CameraError> {
        if bgra.len() != resolution.pixel_count() * 4 {
            return Err(CameraError::buffer_size(bgra.len(), resolution));
        }
        let mut data = Vec::with_capacity(resolution.pixel_count() * 3);
        for px in bgra.chunks_exact(4) {
            data.extend_from_slice(&px[..3]);
        }
        Ok(Self {
            width: resolution.width,
            height: resolution.height,
            pixel_format: PIXEL_FORMAT_8UC3,
            data,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PhotoEvent {
    ModeStarted(Result<(), CameraError>),
    ModeStopped(Result<(), CameraError>),
    Captured(Result<RawPhoto, CameraError>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoEvent {
    ModeStarted(Result<(), CameraError>),
    ModeStopped(Result<(), CameraError>),
    RecordingStarted(Result<(), CameraError>),
    RecordingStopped(Result<(), CameraError>),
}

pub fn photo_channel() -> (Sender<PhotoEvent>, Receiver<PhotoEvent>) {
    unbounded()
}

pub fn video_channel() -> (Sender<VideoEvent>, Receiver<VideoEvent>) {
    unbounded()
}

/// Photo camera. Completions arrive as [`PhotoEvent`]s.
pub trait PhotoDevice {
    fn resolution(&self) -> Resolution;
    fn start_photo_mode(&mut self);
    fn stop_photo_mode(&mut self);
    fn take_photo(&mut self);
    /// Free the underlying camera object. No request follows this call.
    fn release(&mut self);
}

/// Video camera. Completions arrive as [`VideoEvent`]s.
pub trait VideoDevice {
    fn start_video_mode(&mut self);
    fn stop_video_mode(&mut self);
    fn start_recording(&mut self, path: &Path);
    fn stop_recording(&mut self);
    fn release(&mut self);
}

/// Consumer of captured frames, implemented by the recognition coordinator.
///
/// `set_matrices` is called right before the `add_image` of the same photo,
/// with `None` when the platform could not provide a pose for it.
pub trait FrameSink {
    fn set_matrices(&mut self, matrices: Option<CameraMatrices>);
    fn add_image(&mut self, frame: Frame);
}

/// What the recognition side may ask of the capture side.
pub trait CaptureControl {
    /// Enable or disable taking photos.
    fn set_active(&mut self, active: bool);
    /// Increment (`true`) or decrement (`false`) the pause counter.
    fn wait(&mut self, activate: bool);
    /// Paused and no photo is being processed.
    fn is_waiting(&self) -> bool;
    /// The last photo has been fully processed; capture may continue.
    fn processing_stopped(&mut self);
}
