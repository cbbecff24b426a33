use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use artscan_capture::{
    photo_channel, video_channel, CaptureControl, CaptureManager, CaptureMode, Frame, FrameSink,
    PhotoCapture, PhotoCaptureParams, PhotoDevice, PhotoEvent, RawPhoto, VideoCapture,
    VideoCaptureParams, VideoDevice, VideoEvent,
};
use artscan_core::{CameraMatrices, Resolution};
use crossbeam_channel::Sender;
use nalgebra::Matrix4;

type CallLog = Rc<RefCell<Vec<String>>>;

struct FakePhotoDevice {
    tx: Sender<PhotoEvent>,
    calls: CallLog,
}

impl PhotoDevice for FakePhotoDevice {
    fn resolution(&self) -> Resolution {
        Resolution::new(4, 2)
    }

    fn start_photo_mode(&mut self) {
        self.calls.borrow_mut().push("photo:start".into());
        self.tx.send(PhotoEvent::ModeStarted(Ok(()))).unwrap();
    }

    fn stop_photo_mode(&mut self) {
        self.calls.borrow_mut().push("photo:stop".into());
        self.tx.send(PhotoEvent::ModeStopped(Ok(()))).unwrap();
    }

    fn take_photo(&mut self) {
        self.calls.borrow_mut().push("photo:take".into());
        let photo = RawPhoto {
            resolution: self.resolution(),
            bgra: vec![7; 4 * 2 * 4],
            matrices: Some(CameraMatrices::new(Matrix4::identity(), Matrix4::identity())),
        };
        self.tx.send(PhotoEvent::Captured(Ok(photo))).unwrap();
    }

    fn release(&mut self) {
        self.calls.borrow_mut().push("photo:release".into());
    }
}

struct FakeVideoDevice {
    tx: Sender<VideoEvent>,
    calls: CallLog,
}

impl VideoDevice for FakeVideoDevice {
    fn start_video_mode(&mut self) {
        self.calls.borrow_mut().push("video:start".into());
        self.tx.send(VideoEvent::ModeStarted(Ok(()))).unwrap();
    }

    fn stop_video_mode(&mut self) {
        self.calls.borrow_mut().push("video:stop".into());
        self.tx.send(VideoEvent::ModeStopped(Ok(()))).unwrap();
    }

    fn start_recording(&mut self, path: &Path) {
        self.calls
            .borrow_mut()
            .push(format!("video:record {}", path.display()));
        self.tx.send(VideoEvent::RecordingStarted(Ok(()))).unwrap();
    }

    fn stop_recording(&mut self) {
        self.calls.borrow_mut().push("video:stop_record".into());
        self.tx.send(VideoEvent::RecordingStopped(Ok(()))).unwrap();
    }

    fn release(&mut self) {
        self.calls.borrow_mut().push("video:release".into());
    }
}

#[derive(Default)]
struct CollectingSink {
    matrices: usize,
    handoffs: usize,
    frames: Vec<Frame>,
}

impl FrameSink for CollectingSink {
    fn set_matrices(&mut self, matrices: Option<CameraMatrices>) {
        self.matrices += usize::from(matrices.is_some());
        self.handoffs += 1;
    }

    fn add_image(&mut self, frame: Frame) {
        self.frames.push(frame);
    }
}

fn manager() -> (CaptureManager, CallLog) {
    let calls: CallLog = Rc::default();
    let (photo_tx, photo_rx) = photo_channel();
    let (video_tx, video_rx) = video_channel();
    let photo = PhotoCapture::new(
        Box::new(FakePhotoDevice {
            tx: photo_tx,
            calls: calls.clone(),
        }),
        photo_rx,
        PhotoCaptureParams::default(),
    );
    let video = VideoCapture::new(
        Box::new(FakeVideoDevice {
            tx: video_tx,
            calls: calls.clone(),
        }),
        video_rx,
        VideoCaptureParams {
            output_dir: PathBuf::from("out"),
            file_prefix: "tour".into(),
        },
    );
    (CaptureManager::new(photo, video), calls)
}

fn run(mgr: &mut CaptureManager, sink: &mut CollectingSink, ticks: usize) {
    for _ in 0..ticks {
        mgr.tick(0.5, sink);
    }
}

fn count(calls: &CallLog, name: &str) -> usize {
    calls.borrow().iter().filter(|c| c.as_str() == name).count()
}

fn started_photo_manager() -> (CaptureManager, CallLog, CollectingSink) {
    let (mut mgr, calls) = manager();
    let mut sink = CollectingSink::default();
    mgr.start_capture(CaptureMode::Photo);
    run(&mut mgr, &mut sink, 3);
    assert!(mgr.photo().capture_started());
    assert!(!mgr.is_switching());
    (mgr, calls, sink)
}

#[test]
fn photo_is_taken_after_gaze_dwell_and_only_once_per_processing() {
    let (mut mgr, calls, mut sink) = started_photo_manager();
    mgr.set_active(true);
    mgr.photo_mut().set_gaze_on_mesh(true);

    run(&mut mgr, &mut sink, 10);
    assert_eq!(count(&calls, "photo:take"), 1);
    assert_eq!(sink.matrices, 1);
    assert_eq!(sink.handoffs, 1);
    assert_eq!(sink.frames.len(), 1);
    assert_eq!(sink.frames[0].data.len(), 4 * 2 * 3);

    // still processing: no second photo however long we wait
    run(&mut mgr, &mut sink, 20);
    assert_eq!(count(&calls, "photo:take"), 1);

    mgr.processing_stopped();
    run(&mut mgr, &mut sink, 10);
    assert_eq!(count(&calls, "photo:take"), 2);
}

#[test]
fn no_photo_without_gaze_on_mesh_or_when_inactive() {
    let (mut mgr, calls, mut sink) = started_photo_manager();
    mgr.photo_mut().set_gaze_on_mesh(true);
    run(&mut mgr, &mut sink, 10);
    assert_eq!(count(&calls, "photo:take"), 0, "inactive");

    mgr.set_active(true);
    mgr.photo_mut().set_gaze_on_mesh(false);
    run(&mut mgr, &mut sink, 10);
    assert_eq!(count(&calls, "photo:take"), 0, "gaze off mesh");
}

#[test]
fn wait_is_reference_counted() {
    let (mut mgr, _calls, _sink) = started_photo_manager();

    mgr.wait(true);
    mgr.wait(true);
    mgr.wait(false);
    assert!(mgr.is_waiting());
    mgr.wait(false);
    assert!(!mgr.is_waiting());

    // clamped at zero
    mgr.wait(false);
    mgr.wait(true);
    assert!(mgr.is_waiting());
    mgr.wait(false);
    assert!(!mgr.is_waiting());
}

#[test]
fn waiting_is_reported_only_once_processing_stopped() {
    let (mut mgr, calls, mut sink) = started_photo_manager();
    mgr.set_active(true);
    mgr.photo_mut().set_gaze_on_mesh(true);
    run(&mut mgr, &mut sink, 10);
    assert_eq!(count(&calls, "photo:take"), 1);

    mgr.wait(true);
    assert!(!mgr.is_waiting());
    mgr.processing_stopped();
    assert!(mgr.is_waiting());

    // paused: no photos
    run(&mut mgr, &mut sink, 10);
    assert_eq!(count(&calls, "photo:take"), 1);
}

#[test]
fn switching_to_video_stops_photo_mode_first() {
    let (mut mgr, calls, mut sink) = started_photo_manager();

    mgr.start_video_recording();
    run(&mut mgr, &mut sink, 8);
    assert_eq!(mgr.current_mode(), CaptureMode::Video);
    assert!(mgr.video().is_recording());
    assert!(!mgr.photo().capture_started());

    let log = calls.borrow().clone();
    let stop = log.iter().position(|c| c == "photo:stop").expect("photo stopped");
    let start = log.iter().position(|c| c == "video:start").expect("video started");
    assert!(stop < start, "{log:?}");

    let file = mgr.video().last_file().expect("recording file");
    assert_eq!(file.parent(), Some(Path::new("out")));
    let name = file.file_name().and_then(|n| n.to_str()).expect("name");
    assert!(name.starts_with("tour_0_") && name.ends_with(".mp4"), "{name}");

    mgr.stop_video_recording();
    run(&mut mgr, &mut sink, 10);
    assert_eq!(mgr.current_mode(), CaptureMode::Photo);
    assert!(!mgr.video().is_recording());
    assert!(!mgr.video().capture_started());
    assert!(mgr.photo().capture_started());
    assert_eq!(count(&calls, "video:stop_record"), 1);
}

#[test]
fn dispose_releases_both_devices() {
    let (mut mgr, calls, mut sink) = started_photo_manager();

    mgr.dispose();
    run(&mut mgr, &mut sink, 6);
    assert!(mgr.is_disposed());
    assert_eq!(count(&calls, "photo:release"), 1);
    assert_eq!(count(&calls, "video:release"), 1);

    mgr.start_capture(CaptureMode::Photo);
    run(&mut mgr, &mut sink, 6);
    assert_eq!(count(&calls, "photo:start"), 1);
}

#[test]
fn dispose_while_idle_releases_immediately() {
    let (mut mgr, calls) = manager();
    let mut sink = CollectingSink::default();
    mgr.dispose();
    mgr.tick(0.5, &mut sink);
    assert!(mgr.is_disposed());
    assert_eq!(count(&calls, "photo:start"), 0);
}
