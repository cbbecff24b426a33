use artscan_core::Resolution;

/// Failures reported by the camera hardware or while preparing a frame.
///
/// None of them are fatal: the capture state machines log the error and try
/// again on the next eligible tick.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera rejected `{0}`")]
    Rejected(&'static str),
    #[error("frame buffer has {got} bytes, expected {expected} for {width}x{height} BGRA")]
    BufferSize {
        got: usize,
        expected: usize,
        width: u32,
        height: u32,
    },
    #[error("camera device already released")]
    Released,
}

impl CameraError {
    pub(crate) fn buffer_size(got: usize, resolution: Resolution) -> Self {
        Self::BufferSize {
            got,
            expected: resolution.pixel_count() * 4,
            width: resolution.width,
            height: resolution.height,
        }
    }
}
