//! Host-provided collaborators, passed into every coordinator tick.

use artscan_capture::CaptureControl;
use artscan_core::{ArtworkCatalog, WorldAnchorStore};
use nalgebra::{Point3, Vector3};

use crate::PlacedArtwork;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaycastHit {
    pub point: Point3<f32>,
    /// Unit surface normal, pointing out of the surface.
    pub normal: Vector3<f32>,
}

/// The spatial-mapping mesh.
pub trait SpatialMesh {
    /// First hit along `direction` (unit length) within `max_distance`.
    fn raycast(
        &self,
        origin: &Point3<f32>,
        direction: &Vector3<f32>,
        max_distance: f32,
    ) -> Option<RaycastHit>;
}

/// The persisted room mesh.
pub trait RoomCache {
    fn load_room(&mut self);
}

/// The data layer. Recognition initialises once it reports ready.
pub trait ArtworkSource {
    fn is_ready(&self) -> bool;
    fn catalog(&self) -> &ArtworkCatalog;
}

impl ArtworkSource for ArtworkCatalog {
    fn is_ready(&self) -> bool {
        true
    }

    fn catalog(&self) -> &ArtworkCatalog {
        self
    }
}

/// Rendering and UI side.
pub trait Presenter {
    /// A validated artwork got its anchor; show its content there.
    fn artwork_placed(&mut self, placed: &PlacedArtwork);

    /// Status line for the user. `sticky` messages stay until replaced.
    fn info(&mut self, message: &str, sticky: bool);
}

/// Everything the coordinator touches during one tick.
pub struct Services<'a> {
    pub capture: &'a mut dyn CaptureControl,
    pub anchors: &'a mut dyn WorldAnchorStore,
    pub mesh: &'a dyn SpatialMesh,
    pub room: &'a mut dyn RoomCache,
    pub data: &'a dyn ArtworkSource,
    pub presenter: &'a mut dyn Presenter,
    /// The host finished its own start-up and recognition may begin.
    pub host_ready: bool,
}
