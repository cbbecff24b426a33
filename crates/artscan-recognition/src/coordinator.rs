//! The recognition coordinator: glue between capture, the matching engine,
//! spatial validation and the anchor store.
//!
//! All state changes happen inside [`RecognitionCoordinator::tick`] or the
//! explicit mode-switch calls, on the host's main loop. Engine results arrive
//! as [`EngineEvent`]s and are applied at the start of the next tick.

use std::collections::BTreeMap;

use artscan_capture::{CaptureControl, Frame, FrameSink};
use artscan_core::{
    ArtworkCatalog, ArtworkFlags, ArtworkId, CameraMatrices, EligibleIds, Resolution,
    WorldAnchorStore,
};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use crate::reconcile::{reconcile_anchors, AnchorReport};
use crate::{
    CoordinatorParams, EngineEvent, EngineHit, HitKind, ModelOpQueue, ModelOperation,
    ProcessingMethod, Recognition, RecognitionEngine, Services, SpatialValidator,
    ValidationStatus, ValidatorParams,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    #[default]
    None,
    /// Scanning without creating a room cache.
    LiveScan,
    /// Scanning while caching the room and creating scan areas.
    Caching,
    /// Using a cached room and its scan areas.
    UserMode,
}

pub struct RecognitionCoordinator {
    params: CoordinatorParams,
    validator_params: ValidatorParams,
    ids: EligibleIds,
    resolution: Resolution,

    engine: Box<dyn RecognitionEngine>,
    events: Receiver<EngineEvent>,
    matrices: Option<CameraMatrices>,

    state: ScanState,
    configured: bool,
    anchors_loaded: bool,
    new_room: bool,
    scan_area_trigger: bool,

    world_anchors: ArtworkFlags,
    recognized: ArtworkFlags,
    recognitions: BTreeMap<ArtworkId, Recognition>,
    validators: BTreeMap<ArtworkId, SpatialValidator>,
    new_data: bool,

    model_ops: ModelOpQueue,
    release_capture: bool,
    restart_requested: bool,
}

impl RecognitionCoordinator {
    /// `resolution` is the photo size the engine's image coordinates refer to.
    pub fn new(
        params: CoordinatorParams,
        validator_params: ValidatorParams,
        resolution: Resolution,
        engine: Box<dyn RecognitionEngine>,
        events: Receiver<EngineEvent>,
    ) -> Self {
        let ids = EligibleIds::new(params.artwork_limit);
        log::info!(
            "camera resolution {}x{}, {} eligible artworks",
            resolution.width,
            resolution.height,
            ids.limit()
        );
        Self {
            params,
            validator_params,
            ids,
            resolution,
            engine,
            events,
            matrices: None,
            state: ScanState::None,
            configured: false,
            anchors_loaded: false,
            new_room: true,
            scan_area_trigger: false,
            world_anchors: ArtworkFlags::new(ids),
            recognized: ArtworkFlags::new(ids),
            recognitions: BTreeMap::new(),
            validators: BTreeMap::new(),
            new_data: false,
            model_ops: ModelOpQueue::new(),
            release_capture: false,
            restart_requested: false,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn eligible_ids(&self) -> EligibleIds {
        self.ids
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn anchors_loaded(&self) -> bool {
        self.anchors_loaded
    }

    /// No usable scan areas were found at startup.
    pub fn is_new_room(&self) -> bool {
        self.new_room
    }

    pub fn scan_area_trigger_enabled(&self) -> bool {
        self.scan_area_trigger
    }

    /// Artworks with a scan-area anchor loaded at startup.
    pub fn scan_areas(&self) -> Vec<ArtworkId> {
        self.world_anchors.iter_set().collect()
    }

    pub fn is_recognized(&self, id: ArtworkId) -> bool {
        self.recognized.get(id)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Recognition> {
        self.recognitions.values()
    }

    pub fn queued_model_ops(&self) -> usize {
        self.model_ops.len() + usize::from(self.model_ops.in_flight().is_some())
    }

    pub fn engine(&self) -> &dyn RecognitionEngine {
        self.engine.as_ref()
    }

    /// The anchor store was wiped; the host should restart the session.
    pub fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Eligible catalog artworks that have no scan-area anchor yet.
    pub fn missing_anchors(&self, catalog: &ArtworkCatalog) -> Vec<ArtworkId> {
        let missing: Vec<_> = catalog
            .eligible(&self.ids)
            .map(|r| r.id)
            .filter(|&id| !self.world_anchors.get(id))
            .collect();
        for id in &missing {
            log::info!("artwork {id} was not anchored yet");
        }
        missing
    }

    /// Start a full scanning session: caching (`cached == true`) or live.
    ///
    /// Every eligible artwork is added to every method's model set.
    pub fn enter_scanning_mode(
        &mut self,
        cached: bool,
        capture: &mut dyn CaptureControl,
        catalog: &ArtworkCatalog,
    ) {
        self.state = if cached {
            ScanState::Caching
        } else {
            ScanState::LiveScan
        };
        let method = match self.state {
            ScanState::LiveScan => self.params.live_scan_processing,
            _ => ProcessingMethod::FeatureMatching,
        };
        log::info!("entering {:?} with {method:?}", self.state);
        self.engine.set_processing(method);
        self.run_engine();

        for record in catalog.eligible(&self.ids) {
            for method in ProcessingMethod::ALL {
                if let Err(e) = self.engine.add_model(method, &record.image_path, record.id) {
                    log::warn!("artwork {}: {e}", record.id);
                }
            }
            log::debug!("artwork {} added to the engine", record.id);
        }
        capture.set_active(true);
    }

    /// Opportunistic scanning: queue models of all artworks without anchor.
    pub fn scan_new_artworks(&mut self) {
        self.model_ops.push(ModelOperation::AddNew);
    }

    pub fn leave_scanning_mode(&mut self) {
        self.model_ops.push(ModelOperation::RemoveAll);
    }

    /// The camera entered the scan area of `id`.
    pub fn on_scan_area_enter(&mut self, id: ArtworkId) {
        if self.scan_area_trigger && self.ids.is_eligible(id) {
            self.model_ops.push(ModelOperation::Add(id));
        }
    }

    pub fn on_scan_area_exit(&mut self, id: ArtworkId) {
        if self.scan_area_trigger && self.ids.is_eligible(id) {
            self.model_ops.push(ModelOperation::Remove(id));
        }
    }

    /// Wipe the anchor store and every bit of session state.
    pub fn tabula_rasa(
        &mut self,
        anchors: &mut dyn WorldAnchorStore,
        capture: &mut dyn CaptureControl,
    ) {
        log::warn!("discarding all anchors and restarting");
        if let Err(e) = anchors.clear() {
            log::error!("failed to clear anchor store: {e}");
        }
        self.model_ops.clear(capture);
        self.enter_none();
        self.world_anchors.clear();
        self.recognized.clear();
        self.recognitions.clear();
        self.validators.clear();
        self.new_data = false;
        self.new_room = true;
        self.scan_area_trigger = false;
        self.restart_requested = true;
    }

    fn enter_none(&mut self) {
        self.state = ScanState::None;
        for method in ProcessingMethod::ALL {
            if let Err(e) = self.engine.clear_models(method) {
                log::warn!("clearing {method:?} models: {e}");
            }
        }
    }

    fn run_engine(&mut self) {
        if let Err(e) = self.engine.run() {
            log::error!("recognition engine did not start: {e}");
        }
    }

    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(state = ?self.state)))]
    pub fn tick(&mut self, svc: &mut Services<'_>) {
        if std::mem::take(&mut self.release_capture) {
            svc.capture.processing_stopped();
        }
        self.drain_engine_events(svc);

        if !self.anchors_loaded {
            self.load_world_anchors(svc);
        }

        if self.anchors_loaded && svc.data.is_ready() && !self.configured && svc.host_ready {
            if self.state == ScanState::UserMode {
                self.start_cached_recognition();
            }
            self.configured = true;
            log::info!("recognition configured in {:?}", self.state);
        }

        if self.new_data {
            self.poll_validations(svc);
        }

        if self.configured {
            let engine = self.engine.as_mut();
            let catalog = svc.data.catalog();
            let ids = &self.ids;
            let world_anchors = &self.world_anchors;
            self.model_ops.advance(svc.capture, |op| {
                apply_model_op(engine, catalog, ids, world_anchors, op)
            });
        }
    }

    fn load_world_anchors(&mut self, svc: &mut Services<'_>) {
        if !svc.anchors.is_ready() {
            return;
        }
        let names = svc.anchors.ids();
        let report = reconcile_anchors(&names, &self.params.room_anchor_name, self.ids);
        self.apply_anchor_report(&report, svc);
        self.anchors_loaded = true;
    }

    fn apply_anchor_report(&mut self, report: &AnchorReport, svc: &mut Services<'_>) {
        if report.room_cached {
            svc.room.load_room();
            self.state = ScanState::UserMode;
        }
        for &id in &report.scan_areas {
            self.world_anchors.set(id, true);
            self.new_room = false;
        }
        let room_in_use = self.state == ScanState::UserMode;
        if self.new_room == room_in_use {
            self.tabula_rasa(svc.anchors, svc.capture);
        }
    }

    fn start_cached_recognition(&mut self) {
        self.engine.set_processing(ProcessingMethod::FeatureMatching);
        self.run_engine();
        self.scan_area_trigger = !self.new_room;
        if self.params.scan_for_new_artworks {
            self.scan_new_artworks();
        }
    }

    fn drain_engine_events(&mut self, svc: &mut Services<'_>) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                EngineEvent::Results { hits, .. } => self.handle_results(&hits, svc),
                EngineEvent::Error(msg) => log::error!("recognition engine: {msg}"),
            }
        }
    }

    fn handle_results(&mut self, hits: &[EngineHit], svc: &mut Services<'_>) {
        // matrices belong to exactly one photo
        let matrices = match self.matrices.take() {
            Some(m) if !hits.is_empty() => m,
            _ => {
                log::debug!("no results");
                svc.capture.processing_stopped();
                return;
            }
        };
        let catalog = svc.data.catalog();
        let mut new_results = false;
        for hit in hits {
            let id = hit.artwork_id;
            if hit.kind != HitKind::Recognition || !self.ids.is_eligible(id) {
                log::debug!("artwork {id}: ineligible result");
                continue;
            }
            if self.recognized.get(id) {
                log::debug!("artwork {id} already recognized");
                continue;
            }
            if self.recognitions.contains_key(&id) {
                log::debug!("artwork {id} already pending validation");
                continue;
            }
            if !catalog.contains(id) {
                log::warn!("artwork {id} recognized but not in the catalog");
                continue;
            }
            log::info!("corners found for artwork {id}");
            let quad = matrices.world_quad(&hit.quad, self.resolution);
            self.recognitions.insert(id, Recognition::new(id, quad));
            new_results = true;
        }

        if new_results {
            self.new_data = true;
        } else {
            svc.capture.processing_stopped();
        }
    }

    fn poll_validations(&mut self, svc: &mut Services<'_>) {
        let mut all_finished = true;
        let unfinished: Vec<ArtworkId> = self
            .recognitions
            .values()
            .filter(|r| !r.validation_finished)
            .map(|r| r.artwork_id)
            .collect();

        for id in unfinished {
            let status = self.validators.get(&id).map(SpatialValidator::status);
            match status {
                None => {
                    log::debug!("artwork {id}: validating");
                    if let Some(rec) = self.recognitions.get(&id) {
                        let validator = SpatialValidator::new(*rec, self.validator_params.clone());
                        self.validators.insert(id, validator);
                    }
                    all_finished = false;
                }
                Some(ValidationStatus::Pending) => all_finished = false,
                Some(ValidationStatus::Valid) => {
                    log::info!("artwork {id}: valid");
                    self.finish(id);
                    self.recognized.set(id, true);
                    self.on_artwork_valid(id, svc);
                }
                Some(ValidationStatus::Invalid) => {
                    log::info!("artwork {id}: not valid");
                    self.finish(id);
                }
            }
        }

        for validator in self.validators.values_mut() {
            validator.update(svc.mesh, svc.anchors, svc.presenter);
        }

        if all_finished {
            self.new_data = false;
            self.recognitions.clear();
            svc.capture.processing_stopped();
        }
    }

    fn finish(&mut self, id: ArtworkId) {
        if let Some(rec) = self.recognitions.get_mut(&id) {
            rec.validation_finished = true;
        }
        self.validators.remove(&id);
    }

    fn on_artwork_valid(&mut self, id: ArtworkId, svc: &mut Services<'_>) {
        let fm = ProcessingMethod::FeatureMatching;
        if self.state == ScanState::LiveScan && self.params.live_scan_processing != fm {
            return;
        }
        if let Err(e) = self.engine.remove_model(fm, id) {
            log::warn!("artwork {id}: {e}");
        }
        let count = self.engine.model_count(fm);
        svc.capture.set_active(count > 0);
        log::info!("artwork {id} removed from the engine, {count} models left");
        if self.state == ScanState::Caching {
            if count == 0 {
                svc.presenter.info("All artworks scanned.", true);
            } else {
                let msg = format!("Artwork #{id} scanned. {count} artworks left.");
                svc.presenter.info(&msg, false);
            }
        }
    }
}

impl FrameSink for RecognitionCoordinator {
    fn set_matrices(&mut self, matrices: Option<CameraMatrices>) {
        self.matrices = matrices;
    }

    fn add_image(&mut self, frame: Frame) {
        if let Err(e) = self.engine.submit(frame) {
            log::warn!("frame dropped: {e}");
            self.release_capture = true;
        }
    }
}

/// Mutate the feature-matching model set; returns the models left.
fn apply_model_op(
    engine: &mut dyn RecognitionEngine,
    catalog: &ArtworkCatalog,
    ids: &EligibleIds,
    world_anchors: &ArtworkFlags,
    op: ModelOperation,
) -> usize {
    let fm = ProcessingMethod::FeatureMatching;
    let result = match op {
        ModelOperation::Add(id) => match catalog.get(id).filter(|_| ids.is_eligible(id)) {
            Some(record) => engine.add_model(fm, &record.image_path, id),
            None => Ok(()),
        },
        ModelOperation::Remove(id) if ids.is_eligible(id) && catalog.contains(id) => {
            engine.remove_model(fm, id)
        }
        ModelOperation::Remove(_) => Ok(()),
        ModelOperation::RemoveAll => engine.clear_models(fm),
        ModelOperation::AddNew => catalog
            .eligible(ids)
            .filter(|r| !world_anchors.get(r.id))
            .try_for_each(|r| engine.add_model(fm, &r.image_path, r.id)),
    };
    if let Err(e) = result {
        log::warn!("model operation {op:?} failed: {e}");
    }
    engine.model_count(fm)
}
