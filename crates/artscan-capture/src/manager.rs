//! Switching between photo and video capture.
//!
//! Both modes share one camera, so a switch first stops the old mode and only
//! starts the new one after the device reported it stopped.

use serde::{Deserialize, Serialize};

use crate::{CaptureControl, FrameSink, PhotoCapture, VideoCapture};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    #[default]
    None,
    Photo,
    Video,
}

pub struct CaptureManager {
    photo: PhotoCapture,
    video: VideoCapture,
    requested: CaptureMode,
    current: CaptureMode,
    next: CaptureMode,
    switching: bool,
    dispose_requested: bool,
}

impl CaptureManager {
    pub fn new(photo: PhotoCapture, video: VideoCapture) -> Self {
        Self {
            photo,
            video,
            requested: CaptureMode::None,
            current: CaptureMode::None,
            next: CaptureMode::None,
            switching: false,
            dispose_requested: false,
        }
    }

    pub fn photo(&self) -> &PhotoCapture {
        &self.photo
    }

    pub fn photo_mut(&mut self) -> &mut PhotoCapture {
        &mut self.photo
    }

    pub fn video(&self) -> &VideoCapture {
        &self.video
    }

    /// Mode the manager settled on (or is switching to).
    pub fn current_mode(&self) -> CaptureMode {
        self.current
    }

    pub fn is_switching(&self) -> bool {
        self.switching
    }

    pub fn start_capture(&mut self, mode: CaptureMode) {
        if !self.dispose_requested {
            self.requested = mode;
        }
    }

    pub fn stop_capture(&mut self) {
        self.requested = CaptureMode::None;
    }

    pub fn start_video_recording(&mut self) {
        self.start_capture(CaptureMode::Video);
    }

    /// Stop recording and return to photo capture.
    pub fn stop_video_recording(&mut self) {
        self.start_capture(CaptureMode::Photo);
    }

    /// Stop all capture and release both devices. Irreversible.
    pub fn dispose(&mut self) {
        log::info!("disposing capture");
        self.dispose_requested = true;
    }

    pub fn is_disposed(&self) -> bool {
        self.photo.is_released() && self.video.is_released()
    }

    pub fn tick(&mut self, dt: f32, sink: &mut dyn FrameSink) {
        if self.switching {
            self.settle_switch();
        } else {
            if self.dispose_requested {
                self.requested = CaptureMode::None;
                if self.current == CaptureMode::None {
                    self.photo.dispose_inactive();
                    self.video.dispose_inactive();
                }
            }
            if self.requested != self.current {
                self.begin_switch();
            }
        }
        self.photo.tick(dt, sink);
        self.video.tick(dt);
    }

    fn settle_switch(&mut self) {
        self.switching = match self.next {
            CaptureMode::None => self.photo.capture_started() || self.video.capture_started(),
            CaptureMode::Photo => {
                if !self.video.capture_started() {
                    self.photo.set_should_capture(true);
                }
                !self.photo.capture_started()
            }
            CaptureMode::Video => {
                if !self.photo.capture_started() {
                    self.video.set_should_capture(true);
                }
                !self.video.capture_started()
            }
        };
        if !self.switching {
            log::debug!("capture switched to {:?}", self.next);
        }
    }

    fn begin_switch(&mut self) {
        self.next = self.requested;
        self.switching = true;
        log::debug!("capture switching {:?} -> {:?}", self.current, self.next);
        match (self.current, self.next) {
            (CaptureMode::Photo, CaptureMode::None) => {
                self.photo.set_should_capture(false);
                if self.dispose_requested {
                    self.video.dispose_inactive();
                    self.photo.dispose_active();
                }
            }
            (CaptureMode::Video, CaptureMode::None) => {
                self.video.set_should_capture(false);
                if self.dispose_requested {
                    self.photo.dispose_inactive();
                    self.video.dispose_active();
                }
            }
            (CaptureMode::None, CaptureMode::Photo) => self.photo.set_should_capture(true),
            (CaptureMode::Video, CaptureMode::Photo) => self.video.set_should_capture(false),
            (CaptureMode::None, CaptureMode::Video) => self.video.set_should_capture(true),
            (CaptureMode::Photo, CaptureMode::Video) => self.photo.set_should_capture(false),
            _ => {}
        }
        self.current = self.next;
    }
}

impl CaptureControl for CaptureManager {
    fn set_active(&mut self, active: bool) {
        self.photo.set_active(active);
    }

    fn wait(&mut self, activate: bool) {
        self.photo.wait(activate);
    }

    fn is_waiting(&self) -> bool {
        self.photo.is_waiting()
    }

    fn processing_stopped(&mut self) {
        self.photo.processing_stopped();
    }
}
