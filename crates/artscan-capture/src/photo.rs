//! Photo-burst capture.
//!
//! One photo at a time: a new photo is only requested after the recognition
//! side called [`CaptureControl::processing_stopped`] for the previous one.

use crossbeam_channel::Receiver;

use artscan_core::Resolution;

use crate::{CaptureControl, Frame, FrameSink, PhotoCaptureParams, PhotoDevice, PhotoEvent};

#[cfg(feature = "tracing")]
use tracing::instrument;

pub struct PhotoCapture {
    device: Box<dyn PhotoDevice>,
    events: Receiver<PhotoEvent>,
    params: PhotoCaptureParams,
    resolution: Resolution,

    should_capture: bool,
    capture_started: bool,
    starting: bool,
    stopping: bool,
    processing: bool,

    active: bool,
    wait_counter: u32,
    waiting: bool,

    gaze_on_mesh: bool,
    dwell: f32,
    reset_dwell: bool,
    photo_count: u64,

    dispose_requested: bool,
    released: bool,
}

impl PhotoCapture {
    pub fn new(
        device: Box<dyn PhotoDevice>,
        events: Receiver<PhotoEvent>,
        params: PhotoCaptureParams,
    ) -> Self {
        let resolution = device.resolution();
        Self {
            device,
            events,
            params,
            resolution,
            should_capture: false,
            capture_started: false,
            starting: false,
            stopping: false,
            processing: false,
            active: false,
            wait_counter: 0,
            waiting: false,
            gaze_on_mesh: false,
            dwell: 0.0,
            reset_dwell: false,
            photo_count: 0,
            dispose_requested: false,
            released: false,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Whether photo mode is currently running on the device.
    pub fn capture_started(&self) -> bool {
        self.capture_started
    }

    pub fn set_should_capture(&mut self, should: bool) {
        self.should_capture = should;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn photo_count(&self) -> u64 {
        self.photo_count
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// The gazed-at object changed. Restarts the dwell timer.
    pub fn set_gaze_on_mesh(&mut self, on_mesh: bool) {
        self.gaze_on_mesh = on_mesh;
        self.reset_dwell = true;
    }

    /// Stop photo mode, then release the device.
    pub fn dispose_active(&mut self) {
        self.dispose_requested = true;
    }

    /// Release the device right away. Only valid while photo mode is off.
    pub fn dispose_inactive(&mut self) {
        if self.released {
            return;
        }
        self.device.release();
        self.released = true;
        log::info!("photo capture device released");
    }

    /// Advance by `dt` seconds.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn tick(&mut self, dt: f32, sink: &mut dyn FrameSink) {
        self.drain_events(sink);

        if self.dispose_requested {
            self.should_capture = false;
        }
        if self.released {
            return;
        }

        if self.capture_started {
            if !self.should_capture && !self.stopping && !self.processing {
                self.stopping = true;
                self.device.stop_photo_mode();
            }
            if self.should_capture {
                self.dwell += dt;
                if self.reset_dwell {
                    self.dwell = 0.0;
                    self.reset_dwell = false;
                }
                if self.ready_for_photo() {
                    self.reset_dwell = true;
                    self.processing = true;
                    self.photo_count += 1;
                    self.device.take_photo();
                    log::info!("took photo {}", self.photo_count);
                }
            }
        } else if !self.starting {
            if self.should_capture {
                log::info!("starting photo mode");
                self.starting = true;
                self.device.start_photo_mode();
            } else if self.dispose_requested {
                self.dispose_inactive();
            }
        }
    }

    fn ready_for_photo(&self) -> bool {
        self.active
            && !self.waiting
            && !self.processing
            && self.gaze_on_mesh
            && self.dwell > self.params.time_between_photos
    }

    fn drain_events(&mut self, sink: &mut dyn FrameSink) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                PhotoEvent::ModeStarted(result) => {
                    match result {
                        Ok(()) => {
                            self.capture_started = true;
                            log::info!("photo mode started");
                        }
                        Err(e) => log::warn!("unable to start photo mode: {e}"),
                    }
                    self.starting = false;
                }
                PhotoEvent::ModeStopped(result) => {
                    match result {
                        Ok(()) => self.capture_started = false,
                        Err(e) => log::warn!("failed to stop photo mode: {e}"),
                    }
                    self.stopping = false;
                }
                PhotoEvent::Captured(Ok(photo)) => {
                    sink.set_matrices(photo.matrices);
                    match Frame::from_bgra(photo.resolution, &photo.bgra) {
                        Ok(frame) => sink.add_image(frame),
                        Err(e) => {
                            log::warn!("dropping photo {}: {e}", self.photo_count);
                            self.processing = false;
                        }
                    }
                }
                PhotoEvent::Captured(Err(e)) => {
                    log::warn!("failed to capture photo: {e}");
                    self.processing = false;
                }
            }
        }
    }
}

impl CaptureControl for PhotoCapture {
    fn set_active(&mut self, active: bool) {
        self.active = active;
        log::info!(
            "photo capture {}",
            if active { "enabled" } else { "disabled" }
        );
    }

    fn wait(&mut self, activate: bool) {
        if activate {
            self.wait_counter += 1;
            self.waiting = true;
        } else {
            self.wait_counter = self.wait_counter.saturating_sub(1);
            if self.wait_counter == 0 {
                self.waiting = false;
            }
        }
        log::debug!("wait counter: {}", self.wait_counter);
    }

    fn is_waiting(&self) -> bool {
        self.waiting && !self.processing
    }

    fn processing_stopped(&mut self) {
        self.processing = false;
    }
}
