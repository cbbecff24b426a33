use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use artscan_capture::Frame;
use artscan_core::{ArtworkId, ImageQuad};
use artscan_recognition::{
    engine_channel, BackgroundEngine, EngineEvent, EngineHit, FrameMatcher, HitKind,
    ProcessingMethod, RecognitionEngine,
};
use nalgebra::Point2;

/// Reports every loaded model of the active method as found.
#[derive(Default)]
struct EchoMatcher {
    models: [BTreeSet<ArtworkId>; 3],
}

fn slot(method: ProcessingMethod) -> usize {
    ProcessingMethod::ALL
        .iter()
        .position(|m| *m == method)
        .unwrap_or(0)
}

impl FrameMatcher for EchoMatcher {
    fn add_model(
        &mut self,
        method: ProcessingMethod,
        image_path: &Path,
        id: ArtworkId,
    ) -> Result<(), String> {
        if image_path.as_os_str().is_empty() {
            return Err("empty image path".into());
        }
        self.models[slot(method)].insert(id);
        Ok(())
    }

    fn remove_model(&mut self, method: ProcessingMethod, id: ArtworkId) {
        self.models[slot(method)].remove(&id);
    }

    fn clear_models(&mut self, method: ProcessingMethod) {
        self.models[slot(method)].clear();
    }

    fn match_frame(&mut self, method: ProcessingMethod, _frame: &Frame) -> Vec<EngineHit> {
        let corner = Point2::new(0.0, 0.0);
        self.models[slot(method)]
            .iter()
            .map(|&artwork_id| EngineHit {
                artwork_id,
                kind: HitKind::Recognition,
                quad: ImageQuad {
                    top_left: corner,
                    top_right: corner,
                    bottom_right: corner,
                    bottom_left: corner,
                },
            })
            .collect()
    }
}

fn frame() -> Frame {
    Frame {
        width: 2,
        height: 1,
        pixel_format: artscan_capture::PIXEL_FORMAT_8UC3,
        data: vec![0; 6],
    }
}

fn next_hits(rx: &crossbeam_channel::Receiver<EngineEvent>) -> Vec<ArtworkId> {
    match rx.recv_timeout(Duration::from_secs(5)).expect("engine event") {
        EngineEvent::Results { hits, image } => {
            assert!(image.is_some());
            hits.into_iter().map(|h| h.artwork_id).collect()
        }
        EngineEvent::Error(msg) => panic!("unexpected engine error: {msg}"),
    }
}

#[test]
fn commands_before_run_are_applied_in_order() {
    let (tx, rx) = engine_channel();
    let mut engine = BackgroundEngine::new(EchoMatcher::default(), tx);
    let fm = ProcessingMethod::FeatureMatching;

    engine.set_processing(fm);
    engine.add_model(fm, Path::new("a.jpg"), ArtworkId(1)).unwrap();
    engine.add_model(fm, Path::new("b.jpg"), ArtworkId(2)).unwrap();
    engine.submit(frame()).unwrap();
    assert!(!engine.is_running());
    assert_eq!(engine.model_count(fm), 2);

    engine.run().unwrap();
    assert!(engine.is_running());
    assert_eq!(next_hits(&rx), vec![ArtworkId(1), ArtworkId(2)]);

    engine.remove_model(fm, ArtworkId(1)).unwrap();
    engine.submit(frame()).unwrap();
    assert_eq!(next_hits(&rx), vec![ArtworkId(2)]);
    assert_eq!(engine.model_count(fm), 1);
}

#[test]
fn processing_method_selects_model_set() {
    let (tx, rx) = engine_channel();
    let mut engine = BackgroundEngine::new(EchoMatcher::default(), tx);
    engine.run().unwrap();

    engine
        .add_model(ProcessingMethod::ImageHashing, Path::new("c.jpg"), ArtworkId(3))
        .unwrap();
    engine.set_processing(ProcessingMethod::FeatureMatching);
    engine.submit(frame()).unwrap();
    assert!(next_hits(&rx).is_empty());

    engine.set_processing(ProcessingMethod::ImageHashing);
    engine.submit(frame()).unwrap();
    assert_eq!(next_hits(&rx), vec![ArtworkId(3)]);

    engine.clear_models(ProcessingMethod::ImageHashing).unwrap();
    assert_eq!(engine.model_count(ProcessingMethod::ImageHashing), 0);
}

#[test]
fn matcher_errors_are_reported_as_events() {
    let (tx, rx) = engine_channel();
    let mut engine = BackgroundEngine::new(EchoMatcher::default(), tx);
    engine.run().unwrap();
    engine
        .add_model(ProcessingMethod::FeatureMatching, Path::new(""), ArtworkId(9))
        .unwrap();

    match rx.recv_timeout(Duration::from_secs(5)).expect("engine event") {
        EngineEvent::Error(msg) => assert!(msg.contains("empty image path"), "{msg}"),
        other => panic!("expected an error, got {other:?}"),
    }
}

#[test]
fn dropping_the_engine_stops_the_worker() {
    let (tx, rx) = engine_channel();
    let mut engine = BackgroundEngine::new(EchoMatcher::default(), tx);
    engine.run().unwrap();
    drop(engine);
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_err());
}
