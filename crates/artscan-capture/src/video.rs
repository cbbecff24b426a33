//! Mixed-reality video recording.

use std::path::PathBuf;

use crossbeam_channel::Receiver;

use crate::{VideoCaptureParams, VideoDevice, VideoEvent};

pub struct VideoCapture {
    device: Box<dyn VideoDevice>,
    events: Receiver<VideoEvent>,
    params: VideoCaptureParams,

    should_capture: bool,
    capture_started: bool,
    starting_mode: bool,
    starting_recording: bool,
    stopping_recording: bool,
    stopping_mode: bool,
    recording: bool,

    naming_index: u32,
    elapsed: f64,
    last_file: Option<PathBuf>,

    dispose_requested: bool,
    released: bool,
}

impl VideoCapture {
    pub fn new(
        device: Box<dyn VideoDevice>,
        events: Receiver<VideoEvent>,
        params: VideoCaptureParams,
    ) -> Self {
        Self {
            device,
            events,
            params,
            should_capture: false,
            capture_started: false,
            starting_mode: false,
            starting_recording: false,
            stopping_recording: false,
            stopping_mode: false,
            recording: false,
            naming_index: 0,
            elapsed: 0.0,
            last_file: None,
            dispose_requested: false,
            released: false,
        }
    }

    pub fn capture_started(&self) -> bool {
        self.capture_started
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn set_should_capture(&mut self, should: bool) {
        self.should_capture = should;
    }

    /// Path of the most recently requested recording.
    pub fn last_file(&self) -> Option<&PathBuf> {
        self.last_file.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn dispose_active(&mut self) {
        self.dispose_requested = true;
    }

    pub fn dispose_inactive(&mut self) {
        if self.released {
            return;
        }
        self.device.release();
        self.released = true;
        log::info!("video capture device released");
    }

    fn next_file(&mut self) -> PathBuf {
        let millis = (self.elapsed * 1000.0) as u64;
        let name = format!(
            "{}_{}_{}.mp4",
            self.params.file_prefix, self.naming_index, millis
        );
        self.naming_index += 1;
        self.params.output_dir.join(name)
    }

    pub fn tick(&mut self, dt: f32) {
        self.elapsed += f64::from(dt);
        self.drain_events();

        if self.dispose_requested {
            self.should_capture = false;
        }
        if self.released {
            return;
        }

        if self.capture_started {
            if !self.should_capture {
                if self.recording && !self.stopping_recording {
                    self.stopping_recording = true;
                    self.device.stop_recording();
                } else if !self.recording
                    && !self.starting_recording
                    && !self.stopping_recording
                    && !self.stopping_mode
                {
                    // recording never came up; leave video mode anyway
                    self.stopping_mode = true;
                    self.device.stop_video_mode();
                }
            } else if self.should_capture && !self.recording && !self.starting_recording {
                let path = self.next_file();
                log::info!("recording to {}", path.display());
                self.device.start_recording(&path);
                self.last_file = Some(path);
                self.starting_recording = true;
            }
        } else if !self.starting_mode {
            if self.should_capture {
                log::info!("starting video mode");
                self.starting_mode = true;
                self.device.start_video_mode();
            } else if self.dispose_requested {
                self.dispose_inactive();
            }
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                VideoEvent::ModeStarted(result) => {
                    match result {
                        Ok(()) => {
                            self.capture_started = true;
                            log::info!("video mode started");
                        }
                        Err(e) => log::warn!("unable to start video mode: {e}"),
                    }
                    self.starting_mode = false;
                }
                VideoEvent::RecordingStarted(result) => {
                    match result {
                        Ok(()) => {
                            self.recording = true;
                            log::info!("video recording started");
                        }
                        Err(e) => log::warn!("failed to start video recording: {e}"),
                    }
                    self.starting_recording = false;
                }
                VideoEvent::RecordingStopped(result) => {
                    match result {
                        Ok(()) => {
                            log::info!("video recording stopped");
                            self.recording = false;
                            self.stopping_mode = true;
                            self.device.stop_video_mode();
                        }
                        Err(e) => log::warn!("failed to stop video recording: {e}"),
                    }
                    self.stopping_recording = false;
                }
                VideoEvent::ModeStopped(result) => {
                    match result {
                        Ok(()) => self.capture_started = false,
                        Err(e) => log::warn!("failed to stop video mode: {e}"),
                    }
                    self.stopping_mode = false;
                }
            }
        }
    }
}
