//! Placing an artwork's 3D asset in the room.
//!
//! Each request reuses the stored `asset<id>` anchor if there is one.
//! Otherwise it disables user input, runs exactly one solver query and
//! re-enables input when the answer arrives, whatever it is.

use artscan_core::{AnchorName, ArtworkId, Pose, WorldAnchorStore};
use serde::{Deserialize, Serialize};

use crate::{FloorPlacement, PlacementError, PlacementSolver, ShapeDetection};

/// Host input system. Disables nest.
pub trait InputGate {
    fn push_disable(&mut self);
    fn pop_disable(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSurface {
    /// On a table near the artwork, facing along the room axes.
    Table,
    /// On the floor near the artwork, oriented like the artwork.
    Floor,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssetRequest {
    pub artwork_id: ArtworkId,
    pub surface: AssetSurface,
    /// Where the artwork hangs; the search starts here.
    pub artwork_pose: Pose,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AssetOutcome {
    /// The asset already had an anchor.
    Existing(Pose),
    /// A new anchor was stored.
    Placed(Pose),
    NotFound(AssetSurface),
}

impl AssetOutcome {
    /// Message for the user when nothing was found.
    pub fn failure_message(&self) -> Option<&'static str> {
        match self {
            Self::NotFound(AssetSurface::Table) => {
                Some("An adequate table surface couldn't be found.")
            }
            Self::NotFound(AssetSurface::Floor) => {
                Some("An adequate floor position couldn't be found.")
            }
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct AssetPlacer {
    pending: Option<AssetRequest>,
}

impl AssetPlacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Start placing an asset.
    ///
    /// Returns the stored pose right away when the anchor exists; `Ok(None)`
    /// means a query was issued and [`update`](Self::update) will answer.
    pub fn request(
        &mut self,
        request: AssetRequest,
        anchors: &dyn WorldAnchorStore,
        input: &mut dyn InputGate,
        solver: &mut PlacementSolver,
        shapes: &mut ShapeDetection,
    ) -> Result<Option<AssetOutcome>, PlacementError> {
        let name = AnchorName::asset(request.artwork_id);
        if let Some(pose) = anchors.get(&name) {
            log::info!("found 3D asset anchor {name}");
            return Ok(Some(AssetOutcome::Existing(pose)));
        }
        if self.pending.is_some() {
            return Err(PlacementError::Busy);
        }

        input.push_disable();
        let origin = request.artwork_pose.position;
        let issued = match request.surface {
            AssetSurface::Table => shapes.find_table(origin),
            AssetSurface::Floor => solver.query_on_floor_near_point(origin, false),
        };
        if let Err(e) = issued {
            input.pop_disable();
            return Err(e);
        }
        self.pending = Some(request);
        Ok(None)
    }

    /// Poll the query of the pending request.
    pub fn update(
        &mut self,
        anchors: &mut dyn WorldAnchorStore,
        input: &mut dyn InputGate,
        solver: &mut PlacementSolver,
        shapes: &mut ShapeDetection,
    ) -> Option<AssetOutcome> {
        let request = self.pending?;
        let pose = match request.surface {
            AssetSurface::Table => {
                let found = shapes.update()?;
                found.position.map(|p| {
                    let forward = request.artwork_pose.forward();
                    Pose::new(p, found.alignment.aligned_rotation(&forward))
                })
            }
            AssetSurface::Floor => match solver.update()? {
                FloorPlacement::Placed(p) => Some(Pose::new(p, request.artwork_pose.rotation)),
                FloorPlacement::NotFound => None,
            },
        };
        self.pending = None;
        input.pop_disable();

        let outcome = match pose {
            Some(pose) => {
                let name = AnchorName::asset(request.artwork_id);
                if let Err(e) = anchors.replace(&name, pose) {
                    log::error!("could not store {name}: {e}");
                }
                AssetOutcome::Placed(pose)
            }
            None => AssetOutcome::NotFound(request.surface),
        };
        if let Some(msg) = outcome.failure_message() {
            log::info!("{msg}");
        }
        Some(outcome)
    }
}
