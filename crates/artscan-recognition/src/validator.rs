//! Spatial validation of a recognised artwork.
//!
//! The recognised quad only gives viewing rays. Casting them onto the spatial
//! mesh yields the actual wall points; if all five rays hit and the hits lie on
//! one plane, the artwork is real and gets a scan-area anchor in front of it.

use artscan_core::{
    look_rotation, planarity_scores, AnchorName, ArtworkId, PlanarityScores, Pose,
    WorldAnchorStore, WorldQuad,
};
use nalgebra::{Point3, Vector3};

use crate::{Presenter, RaycastHit, SpatialMesh, ValidatorParams};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// A recognised artwork awaiting validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Recognition {
    pub artwork_id: ArtworkId,
    pub validation_finished: bool,
    pub quad: WorldQuad,
}

impl Recognition {
    pub fn new(artwork_id: ArtworkId, quad: WorldQuad) -> Self {
        Self {
            artwork_id,
            validation_finished: false,
            quad,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationStatus {
    Pending,
    Valid,
    Invalid,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ValidationFailure {
    /// Ray index: 0 middle, then top-left, top-right, bottom-right, bottom-left.
    RaycastMiss { ray: usize },
    NotPlanar(PlanarityScores),
}

/// A validated artwork, handed to the [`Presenter`].
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedArtwork {
    pub artwork_id: ArtworkId,
    pub anchor_name: String,
    /// Scan-area anchor: in front of the wall, facing away from it.
    pub anchor: Pose,
    pub middle: Point3<f32>,
    pub top_left: Point3<f32>,
    pub top_right: Point3<f32>,
    pub normal: Vector3<f32>,
}

/// Raycast and planarity check of one recognition.
///
/// Returns the five mesh hits in [`WorldQuad::targets`] order.
pub fn validate_quad(
    quad: &WorldQuad,
    mesh: &dyn SpatialMesh,
    params: &ValidatorParams,
) -> Result<[RaycastHit; 5], ValidationFailure> {
    let mut hits = [RaycastHit {
        point: Point3::origin(),
        normal: Vector3::zeros(),
    }; 5];
    for (ray, target) in quad.targets().iter().enumerate() {
        let hit = (target - quad.camera)
            .try_normalize(f32::EPSILON)
            .and_then(|dir| mesh.raycast(&quad.camera, &dir, params.raycast_length))
            .ok_or(ValidationFailure::RaycastMiss { ray })?;
        hits[ray] = hit;
    }

    let [m, tl, tr, br, bl] = hits.map(|h| h.point);
    let scores = planarity_scores(&m, &tl, &tr, &br, &bl);
    log::debug!(
        "corner agreement {:.1}% / {:.1}%",
        scores.dot1 * 100.0,
        scores.dot2 * 100.0
    );
    if !scores.accepts(params.planarity_threshold) {
        return Err(ValidationFailure::NotPlanar(scores));
    }
    Ok(hits)
}

enum State {
    New,
    Done(Result<PlacedArtwork, ValidationFailure>),
}

pub struct SpatialValidator {
    recognition: Recognition,
    params: ValidatorParams,
    state: State,
}

impl SpatialValidator {
    pub fn new(recognition: Recognition, params: ValidatorParams) -> Self {
        Self {
            recognition,
            params,
            state: State::New,
        }
    }

    pub fn artwork_id(&self) -> ArtworkId {
        self.recognition.artwork_id
    }

    pub fn status(&self) -> ValidationStatus {
        match &self.state {
            State::New => ValidationStatus::Pending,
            State::Done(Ok(_)) => ValidationStatus::Valid,
            State::Done(Err(_)) => ValidationStatus::Invalid,
        }
    }

    pub fn placed(&self) -> Option<&PlacedArtwork> {
        match &self.state {
            State::Done(Ok(placed)) => Some(placed),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<ValidationFailure> {
        match &self.state {
            State::Done(Err(failure)) => Some(*failure),
            _ => None,
        }
    }

    /// Run validation once. Later calls do nothing.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all, fields(artwork = %self.recognition.artwork_id)))]
    pub fn update(
        &mut self,
        mesh: &dyn SpatialMesh,
        anchors: &mut dyn WorldAnchorStore,
        presenter: &mut dyn Presenter,
    ) {
        if !matches!(self.state, State::New) {
            return;
        }
        let id = self.recognition.artwork_id;
        let result = validate_quad(&self.recognition.quad, mesh, &self.params).map(|hits| {
            let [middle, top_left, top_right, ..] = hits;
            let facing = look_rotation(&middle.normal, true);
            let anchor = Pose::new(middle.point, facing)
                .translate_local(&Vector3::new(0.0, 0.0, self.params.scan_area_offset));
            PlacedArtwork {
                artwork_id: id,
                anchor_name: AnchorName::artwork(id),
                anchor,
                middle: middle.point,
                top_left: top_left.point,
                top_right: top_right.point,
                normal: middle.normal,
            }
        });

        match &result {
            Ok(placed) => {
                if let Err(e) = anchors.replace(&placed.anchor_name, placed.anchor) {
                    log::error!("artwork {id}: could not persist anchor: {e}");
                }
                presenter.artwork_placed(placed);
            }
            Err(ValidationFailure::RaycastMiss { ray }) => {
                log::info!("artwork {id}: raycast {ray} missed the spatial mesh");
            }
            Err(ValidationFailure::NotPlanar(scores)) => {
                log::info!(
                    "artwork {id}: not planar ({:.3}, {:.3})",
                    scores.dot1,
                    scores.dot2
                );
            }
        }
        self.state = State::Done(result);
    }
}
