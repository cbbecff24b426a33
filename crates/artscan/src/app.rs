//! Explicit wiring of one session.
//!
//! [`AppContext`] owns every component and drives them in a fixed order on
//! each host frame: capture, recognition, scan-area triggers, asset placement.

use std::sync::Arc;

use artscan_capture::{
    CaptureManager, PhotoCapture, PhotoDevice, PhotoEvent, VideoCapture, VideoDevice, VideoEvent,
};
use artscan_core::{ArtworkCatalog, ArtworkId, WorldAnchorStore};
use artscan_placement::{
    AssetOutcome, AssetPlacer, AssetRequest, InputGate, PlacementError, PlacementSolver,
    ShapeDetection, SpatialUnderstanding,
};
use artscan_recognition::{
    EngineEvent, Presenter, RecognitionCoordinator, RecognitionEngine, RoomCache, ScanAreaEvent,
    ScanAreaTracker, Services, SpatialMesh,
};
use crossbeam_channel::Receiver;
use nalgebra::Point3;

use crate::AppConfig;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Devices and backends the host creates before the session starts.
pub struct Devices {
    pub photo: Box<dyn PhotoDevice>,
    pub photo_events: Receiver<PhotoEvent>,
    pub video: Box<dyn VideoDevice>,
    pub video_events: Receiver<VideoEvent>,
    pub engine: Box<dyn RecognitionEngine>,
    pub engine_events: Receiver<EngineEvent>,
    pub spatial: Arc<dyn SpatialUnderstanding>,
}

/// Per-frame view of the host.
pub struct Host<'a> {
    pub mesh: &'a dyn SpatialMesh,
    pub room: &'a mut dyn RoomCache,
    pub presenter: &'a mut dyn Presenter,
    pub input: &'a mut dyn InputGate,
    /// Current camera position, if tracked.
    pub camera: Option<Point3<f32>>,
    /// The user's gaze rests on the spatial mesh.
    pub gaze_on_mesh: bool,
    /// The host finished its own start-up.
    pub host_ready: bool,
}

/// What happened during one [`AppContext::tick`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickReport {
    pub scan_area_events: Vec<ScanAreaEvent>,
    pub asset: Option<AssetOutcome>,
    /// The anchor store was reset and the cameras are released; the host
    /// should tear this context down and start a new session.
    pub restart: bool,
}

pub struct AppContext {
    config: AppConfig,
    capture: CaptureManager,
    coordinator: RecognitionCoordinator,
    anchors: Box<dyn WorldAnchorStore>,
    catalog: ArtworkCatalog,
    scan_areas: ScanAreaTracker,
    /// Number of anchored artworks the tracker was last loaded with.
    scan_areas_loaded: Option<usize>,
    gaze_on_mesh: Option<bool>,
    solver: PlacementSolver,
    shapes: ShapeDetection,
    assets: AssetPlacer,
    restart_issued: bool,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        devices: Devices,
        anchors: Box<dyn WorldAnchorStore>,
        catalog: ArtworkCatalog,
    ) -> Self {
        let photo = PhotoCapture::new(devices.photo, devices.photo_events, config.photo.clone());
        let video = VideoCapture::new(devices.video, devices.video_events, config.video.clone());
        let resolution = photo.resolution();
        let coordinator = RecognitionCoordinator::new(
            config.coordinator.clone(),
            config.validator.clone(),
            resolution,
            devices.engine,
            devices.engine_events,
        );
        let solver = PlacementSolver::new(Arc::clone(&devices.spatial), config.placement.clone());
        let shapes = ShapeDetection::new(devices.spatial, config.tables.clone());
        log::info!("{} artworks in the catalog", catalog.len());
        Self {
            scan_areas: ScanAreaTracker::new(config.scan_area_radius),
            config,
            capture: CaptureManager::new(photo, video),
            coordinator,
            anchors,
            catalog,
            scan_areas_loaded: None,
            gaze_on_mesh: None,
            solver,
            shapes,
            assets: AssetPlacer::new(),
            restart_issued: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn capture(&self) -> &CaptureManager {
        &self.capture
    }

    pub fn capture_mut(&mut self) -> &mut CaptureManager {
        &mut self.capture
    }

    pub fn coordinator(&self) -> &RecognitionCoordinator {
        &self.coordinator
    }

    pub fn anchors(&self) -> &dyn WorldAnchorStore {
        self.anchors.as_ref()
    }

    pub fn catalog(&self) -> &ArtworkCatalog {
        &self.catalog
    }

    pub fn scan_areas(&self) -> &ScanAreaTracker {
        &self.scan_areas
    }

    pub fn shapes(&self) -> &ShapeDetection {
        &self.shapes
    }

    pub fn enter_scanning_mode(&mut self, cached: bool) {
        self.coordinator
            .enter_scanning_mode(cached, &mut self.capture, &self.catalog);
    }

    pub fn leave_scanning_mode(&mut self) {
        self.coordinator.leave_scanning_mode();
    }

    pub fn scan_new_artworks(&mut self) {
        self.coordinator.scan_new_artworks();
    }

    pub fn missing_anchors(&self) -> Vec<ArtworkId> {
        self.coordinator.missing_anchors(&self.catalog)
    }

    /// Wipe every anchor and restart, e.g. on user request.
    pub fn tabula_rasa(&mut self) {
        self.coordinator
            .tabula_rasa(self.anchors.as_mut(), &mut self.capture);
    }

    /// Place the 3D asset of an artwork. See [`AssetPlacer::request`].
    pub fn request_asset(
        &mut self,
        request: AssetRequest,
        input: &mut dyn InputGate,
    ) -> Result<Option<AssetOutcome>, PlacementError> {
        self.assets.request(
            request,
            self.anchors.as_ref(),
            input,
            &mut self.solver,
            &mut self.shapes,
        )
    }

    /// Highlight every table in the room.
    pub fn find_all_tables(&mut self) -> Result<(), PlacementError> {
        self.shapes.find_all_tables()
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn tick(&mut self, dt: f32, host: &mut Host<'_>) -> TickReport {
        let mut report = TickReport::default();

        if self.gaze_on_mesh != Some(host.gaze_on_mesh) {
            self.gaze_on_mesh = Some(host.gaze_on_mesh);
            self.capture.photo_mut().set_gaze_on_mesh(host.gaze_on_mesh);
        }
        self.capture.tick(dt, &mut self.coordinator);

        let mut svc = Services {
            capture: &mut self.capture,
            anchors: self.anchors.as_mut(),
            mesh: host.mesh,
            room: &mut *host.room,
            data: &self.catalog,
            presenter: &mut *host.presenter,
            host_ready: host.host_ready,
        };
        self.coordinator.tick(&mut svc);

        if self.coordinator.anchors_loaded() && !self.coordinator.restart_requested() {
            let ids = self.coordinator.scan_areas();
            if self.scan_areas_loaded != Some(ids.len()) {
                self.scan_areas.load(self.anchors.as_ref(), &ids);
                self.scan_areas_loaded = Some(ids.len());
                log::info!("{} scan areas loaded", self.scan_areas.len());
            }
        }

        if let Some(camera) = host.camera {
            for event in self.scan_areas.update(&camera) {
                match event {
                    ScanAreaEvent::Entered(id) => self.coordinator.on_scan_area_enter(id),
                    ScanAreaEvent::Exited(id) => self.coordinator.on_scan_area_exit(id),
                }
                report.scan_area_events.push(event);
            }
        }

        self.solver.initialize();
        report.asset = self.assets.update(
            self.anchors.as_mut(),
            &mut *host.input,
            &mut self.solver,
            &mut self.shapes,
        );
        // all-tables queries only feed the debug boxes
        if !self.assets.is_busy() {
            self.shapes.update();
        }

        if self.coordinator.restart_requested() {
            if !self.restart_issued {
                log::warn!("anchor store reset, releasing cameras before restart");
                self.scan_areas.clear();
                self.capture.dispose();
                self.restart_issued = true;
            }
            report.restart = self.capture.is_disposed();
        }
        report
    }
}
