#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use artscan_capture::{CaptureControl, Frame};
use artscan_core::{
    ArtworkCatalog, ArtworkId, ArtworkRecord, CameraMatrices, ImageQuad, MemoryAnchorStore,
    Resolution,
};
use artscan_recognition::{
    engine_channel, CoordinatorParams, EngineError, EngineEvent, EngineHit, HitKind,
    PlacedArtwork, Presenter, ProcessingMethod, RaycastHit, RecognitionCoordinator,
    RecognitionEngine, RoomCache, Services, SpatialMesh, ValidatorParams,
};
use crossbeam_channel::Sender;
use nalgebra::{Matrix4, Point3, Vector3};

pub type Log = Rc<RefCell<Vec<String>>>;

pub const RESOLUTION: Resolution = Resolution {
    width: 1408,
    height: 792,
};

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

pub struct FakeEngine {
    log: Log,
    models: HashMap<ProcessingMethod, BTreeSet<ArtworkId>>,
}

impl RecognitionEngine for FakeEngine {
    fn set_processing(&mut self, method: ProcessingMethod) {
        self.log.borrow_mut().push(format!("processing {method:?}"));
    }

    fn run(&mut self) -> Result<(), EngineError> {
        self.log.borrow_mut().push("run".into());
        Ok(())
    }

    fn submit(&mut self, frame: Frame) -> Result<(), EngineError> {
        self.log
            .borrow_mut()
            .push(format!("submit {}x{}", frame.width, frame.height));
        Ok(())
    }

    fn add_model(
        &mut self,
        method: ProcessingMethod,
        _image_path: &Path,
        id: ArtworkId,
    ) -> Result<(), EngineError> {
        if method == ProcessingMethod::FeatureMatching {
            self.log.borrow_mut().push(format!("add {id}"));
        }
        self.models.entry(method).or_default().insert(id);
        Ok(())
    }

    fn remove_model(
        &mut self,
        method: ProcessingMethod,
        id: ArtworkId,
    ) -> Result<(), EngineError> {
        if method == ProcessingMethod::FeatureMatching {
            self.log.borrow_mut().push(format!("remove {id}"));
        }
        self.models.entry(method).or_default().remove(&id);
        Ok(())
    }

    fn clear_models(&mut self, method: ProcessingMethod) -> Result<(), EngineError> {
        self.log.borrow_mut().push(format!("clear {method:?}"));
        self.models.remove(&method);
        Ok(())
    }

    fn model_count(&self, method: ProcessingMethod) -> usize {
        self.models.get(&method).map_or(0, BTreeSet::len)
    }
}

/// Capture double sharing the engine's log, so interleaving is visible.
pub struct FakeCapture {
    pub log: Log,
    pub counter: u32,
    pub processing: bool,
    pub active: Option<bool>,
    pub stopped: usize,
}

impl CaptureControl for FakeCapture {
    fn set_active(&mut self, active: bool) {
        self.active = Some(active);
        self.log.borrow_mut().push(format!("active {active}"));
    }

    fn wait(&mut self, activate: bool) {
        if activate {
            self.counter += 1;
        } else {
            self.counter = self.counter.saturating_sub(1);
        }
        self.log.borrow_mut().push(format!("wait {activate}"));
    }

    fn is_waiting(&self) -> bool {
        self.counter > 0 && !self.processing
    }

    fn processing_stopped(&mut self) {
        self.processing = false;
        self.stopped += 1;
    }
}

/// A flat wall at `z = wall_z`, facing `+z`.
pub struct WallMesh {
    pub wall_z: f32,
}

impl SpatialMesh for WallMesh {
    fn raycast(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
    ) -> Option<RaycastHit> {
        if direction.z.abs() < 1e-6 {
            return None;
        }
        let t = (self.wall_z - origin.z) / direction.z;
        if t <= 0.0 || t > max_distance {
            return None;
        }
        Some(RaycastHit {
            point: origin + direction * t,
            normal: Vector3::z(),
        })
    }
}

/// Returns pre-recorded hits in call order.
pub struct ScriptedMesh {
    pub hits: RefCell<VecDeque<Option<RaycastHit>>>,
}

impl ScriptedMesh {
    pub fn new(points: impl IntoIterator<Item = Option<Point3<f32>>>) -> Self {
        let hits = points
            .into_iter()
            .map(|p| {
                p.map(|point| RaycastHit {
                    point,
                    normal: Vector3::z(),
                })
            })
            .collect();
        Self {
            hits: RefCell::new(hits),
        }
    }
}

impl SpatialMesh for ScriptedMesh {
    fn raycast(&self, _: &Point3<f32>, _: &Vector3<f32>, _: f32) -> Option<RaycastHit> {
        self.hits.borrow_mut().pop_front().flatten()
    }
}

#[derive(Default)]
pub struct FakeRoom {
    pub loads: usize,
}

impl RoomCache for FakeRoom {
    fn load_room(&mut self) {
        self.loads += 1;
    }
}

#[derive(Default)]
pub struct FakePresenter {
    pub placed: Vec<PlacedArtwork>,
    pub messages: Vec<(String, bool)>,
}

impl Presenter for FakePresenter {
    fn artwork_placed(&mut self, placed: &PlacedArtwork) {
        self.placed.push(placed.clone());
    }

    fn info(&mut self, message: &str, sticky: bool) {
        self.messages.push((message.to_string(), sticky));
    }
}

pub fn catalog(ids: impl IntoIterator<Item = i64>) -> ArtworkCatalog {
    ArtworkCatalog::new(ids.into_iter().map(|id| ArtworkRecord {
        id: ArtworkId(id),
        image_path: PathBuf::from(format!("art/{id}.jpg")),
        title: None,
        artist: None,
        year: None,
    }))
    .expect("catalog")
}

pub fn projection() -> Matrix4<f32> {
    Matrix4::new(
        1.52, 0.0, 0.0, 0.0, //
        0.0, 2.70, 0.0, 0.0, //
        0.0, 0.0, -1.0, 0.0, //
        0.0, 0.0, -1.0, 0.0,
    )
}

/// Camera at the origin looking down `-z`.
pub fn camera() -> CameraMatrices {
    CameraMatrices::new(Matrix4::identity(), projection())
}

/// Image quad of a `0.8 x 0.6` picture centred at `center`, facing the camera.
pub fn quad_of(center: Point3<f32>) -> ImageQuad {
    let cam = camera();
    let px = |dx: f32, dy: f32| {
        cam.project_world_point(&(center + Vector3::new(dx, dy, 0.0)), RESOLUTION)
            .expect("visible")
    };
    ImageQuad {
        top_left: px(-0.4, 0.3),
        top_right: px(0.4, 0.3),
        bottom_right: px(0.4, -0.3),
        bottom_left: px(-0.4, -0.3),
    }
}

pub fn hit(id: i64, center: Point3<f32>) -> EngineHit {
    EngineHit {
        artwork_id: ArtworkId(id),
        kind: HitKind::Recognition,
        quad: quad_of(center),
    }
}

pub fn results(hits: Vec<EngineHit>) -> EngineEvent {
    EngineEvent::Results { hits, image: None }
}

/// Coordinator plus every collaborator it needs.
pub struct Harness {
    pub coordinator: RecognitionCoordinator,
    pub engine_tx: Sender<EngineEvent>,
    pub log: Log,
    pub capture: FakeCapture,
    pub anchors: MemoryAnchorStore,
    pub room: FakeRoom,
    pub presenter: FakePresenter,
    pub catalog: ArtworkCatalog,
    pub host_ready: bool,
}

impl Harness {
    pub fn new(
        params: CoordinatorParams,
        anchors: MemoryAnchorStore,
        catalog: ArtworkCatalog,
    ) -> Self {
        let log: Log = Rc::default();
        let (engine_tx, engine_rx) = engine_channel();
        let engine = FakeEngine {
            log: log.clone(),
            models: HashMap::new(),
        };
        let coordinator = RecognitionCoordinator::new(
            params,
            ValidatorParams::default(),
            RESOLUTION,
            Box::new(engine),
            engine_rx,
        );
        Self {
            coordinator,
            engine_tx,
            capture: FakeCapture {
                log: log.clone(),
                counter: 0,
                processing: false,
                active: None,
                stopped: 0,
            },
            log,
            anchors,
            room: FakeRoom::default(),
            presenter: FakePresenter::default(),
            catalog,
            host_ready: true,
        }
    }

    pub fn with_limit(limit: usize, anchors: MemoryAnchorStore) -> Self {
        let params = CoordinatorParams {
            artwork_limit: limit,
            ..CoordinatorParams::default()
        };
        Self::new(params, anchors, catalog(0..6))
    }

    pub fn tick_with(&mut self, mesh: &dyn SpatialMesh) {
        let mut svc = Services {
            capture: &mut self.capture,
            anchors: &mut self.anchors,
            mesh,
            room: &mut self.room,
            data: &self.catalog,
            presenter: &mut self.presenter,
            host_ready: self.host_ready,
        };
        self.coordinator.tick(&mut svc);
    }

    pub fn tick(&mut self) {
        self.tick_with(&WallMesh { wall_z: -3.0 });
    }

    pub fn enter_scanning_mode(&mut self, cached: bool) {
        self.coordinator
            .enter_scanning_mode(cached, &mut self.capture, &self.catalog);
    }

    /// Deliver one photo's matrices and its engine results.
    pub fn photo(&mut self, hits: Vec<EngineHit>) {
        use artscan_capture::FrameSink;
        self.capture.processing = true;
        self.coordinator.set_matrices(Some(camera()));
        self.engine_tx.send(results(hits)).expect("send");
    }

    /// Deliver a photo the platform could not attach a pose to.
    pub fn photo_without_pose(&mut self, hits: Vec<EngineHit>) {
        use artscan_capture::FrameSink;
        self.capture.processing = true;
        self.coordinator.set_matrices(None);
        self.engine_tx.send(results(hits)).expect("send");
    }
}
