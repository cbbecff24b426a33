//! Seam to the image-matching engine.
//!
//! The engine works asynchronously. Everything it reports comes back as an
//! [`EngineEvent`] on a single-consumer channel, which the coordinator drains
//! at the start of each tick.

use std::path::Path;

use artscan_capture::Frame;
use artscan_core::{ArtworkId, ImageQuad};
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::ProcessingMethod;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    /// A known artwork was matched and located.
    Recognition,
    /// A picture-like shape was found without identifying it.
    Detection,
}

/// One located artwork in a processed frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineHit {
    pub artwork_id: ArtworkId,
    pub kind: HitKind,
    pub quad: ImageQuad,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// Result of one processed frame, possibly empty.
    Results {
        hits: Vec<EngineHit>,
        image: Option<Frame>,
    },
    Error(String),
}

pub fn engine_channel() -> (Sender<EngineEvent>, Receiver<EngineEvent>) {
    unbounded()
}

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("recognition worker is not running")]
    Disconnected,
    #[error("failed to spawn recognition worker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Model management and frame submission for the matching engine.
///
/// Model sets are kept per [`ProcessingMethod`]; only the method selected with
/// [`RecognitionEngine::set_processing`] is used for matching.
pub trait RecognitionEngine {
    fn set_processing(&mut self, method: ProcessingMethod);

    /// Start processing submitted frames. Calling it again is a no-op.
    fn run(&mut self) -> Result<(), EngineError>;

    fn submit(&mut self, frame: Frame) -> Result<(), EngineError>;

    fn add_model(
        &mut self,
        method: ProcessingMethod,
        image_path: &Path,
        id: ArtworkId,
    ) -> Result<(), EngineError>;

    fn remove_model(&mut self, method: ProcessingMethod, id: ArtworkId)
        -> Result<(), EngineError>;

    fn clear_models(&mut self, method: ProcessingMethod) -> Result<(), EngineError>;

    fn model_count(&self, method: ProcessingMethod) -> usize;
}
