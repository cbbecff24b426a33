//! A [`RecognitionEngine`] that runs an opaque matcher on its own thread.
//!
//! Model mutations and frames travel over one command channel, so the worker
//! applies them in submission order and never matches against a half-updated
//! model set. Model sets are mirrored on the caller side to answer
//! [`RecognitionEngine::model_count`] without a round trip.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use artscan_capture::Frame;
use artscan_core::ArtworkId;
use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::{EngineError, EngineEvent, EngineHit, ProcessingMethod, RecognitionEngine};

/// The pixel-level matching algorithm. Runs on the worker thread only.
pub trait FrameMatcher: Send + 'static {
    fn add_model(
        &mut self,
        method: ProcessingMethod,
        image_path: &Path,
        id: ArtworkId,
    ) -> Result<(), String>;

    fn remove_model(&mut self, method: ProcessingMethod, id: ArtworkId);

    fn clear_models(&mut self, method: ProcessingMethod);

    fn match_frame(&mut self, method: ProcessingMethod, frame: &Frame) -> Vec<EngineHit>;
}

enum Command {
    SetProcessing(ProcessingMethod),
    AddModel(ProcessingMethod, PathBuf, ArtworkId),
    RemoveModel(ProcessingMethod, ArtworkId),
    ClearModels(ProcessingMethod),
    Submit(Frame),
    Shutdown,
}

pub struct BackgroundEngine<M: FrameMatcher> {
    commands: Sender<Command>,
    pending: Option<(M, Receiver<Command>)>,
    events: Sender<EngineEvent>,
    worker: Option<JoinHandle<()>>,
    models: [BTreeSet<ArtworkId>; 3],
}

fn slot(method: ProcessingMethod) -> usize {
    match method {
        ProcessingMethod::FeatureMatching => 0,
        ProcessingMethod::ImageHashing => 1,
        ProcessingMethod::HybridMatching => 2,
    }
}

impl<M: FrameMatcher> BackgroundEngine<M> {
    /// Results and errors are sent to `events`. Commands issued before
    /// [`RecognitionEngine::run`] are buffered.
    pub fn new(matcher: M, events: Sender<EngineEvent>) -> Self {
        let (commands, rx) = unbounded();
        Self {
            commands,
            pending: Some((matcher, rx)),
            events,
            worker: None,
            models: Default::default(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .map_err(|_| EngineError::Disconnected)
    }
}

fn worker_loop<M: FrameMatcher>(
    mut matcher: M,
    commands: Receiver<Command>,
    events: Sender<EngineEvent>,
) {
    let mut method = ProcessingMethod::default();
    for command in commands.iter() {
        match command {
            Command::SetProcessing(m) => method = m,
            Command::AddModel(m, path, id) => {
                if let Err(e) = matcher.add_model(m, &path, id) {
                    let msg = format!("model {id} ({}): {e}", path.display());
                    if events.send(EngineEvent::Error(msg)).is_err() {
                        break;
                    }
                }
            }
            Command::RemoveModel(m, id) => matcher.remove_model(m, id),
            Command::ClearModels(m) => matcher.clear_models(m),
            Command::Submit(frame) => {
                let hits = matcher.match_frame(method, &frame);
                let event = EngineEvent::Results {
                    hits,
                    image: Some(frame),
                };
                if events.send(event).is_err() {
                    break;
                }
            }
            Command::Shutdown => break,
        }
    }
    log::debug!("recognition worker stopped");
}

impl<M: FrameMatcher> RecognitionEngine for BackgroundEngine<M> {
    fn set_processing(&mut self, method: ProcessingMethod) {
        if self.send(Command::SetProcessing(method)).is_err() {
            log::warn!("recognition worker gone, processing method not changed");
        }
    }

    fn run(&mut self) -> Result<(), EngineError> {
        let Some((matcher, rx)) = self.pending.take() else {
            return Ok(());
        };
        let events = self.events.clone();
        let handle = thread::Builder::new()
            .name("recognition-engine".into())
            .spawn(move || worker_loop(matcher, rx, events))?;
        self.worker = Some(handle);
        log::info!("recognition engine running");
        Ok(())
    }

    fn submit(&mut self, frame: Frame) -> Result<(), EngineError> {
        self.send(Command::Submit(frame))
    }

    fn add_model(
        &mut self,
        method: ProcessingMethod,
        image_path: &Path,
        id: ArtworkId,
    ) -> Result<(), EngineError> {
        self.send(Command::AddModel(method, image_path.to_path_buf(), id))?;
        self.models[slot(method)].insert(id);
        Ok(())
    }

    fn remove_model(
        &mut self,
        method: ProcessingMethod,
        id: ArtworkId,
    ) -> Result<(), EngineError> {
        self.send(Command::RemoveModel(method, id))?;
        self.models[slot(method)].remove(&id);
        Ok(())
    }

    fn clear_models(&mut self, method: ProcessingMethod) -> Result<(), EngineError> {
        self.send(Command::ClearModels(method))?;
        self.models[slot(method)].clear();
        Ok(())
    }

    fn model_count(&self, method: ProcessingMethod) -> usize {
        self.models[slot(method)].len()
    }
}

impl<M: FrameMatcher> Drop for BackgroundEngine<M> {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::error!("recognition worker panicked");
            }
        }
    }
}
