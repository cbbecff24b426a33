//! Spherical trigger volumes around stored scan-area anchors.

use std::collections::{BTreeMap, BTreeSet};

use artscan_core::{AnchorName, ArtworkId, WorldAnchorStore};
use nalgebra::Point3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanAreaEvent {
    Entered(ArtworkId),
    Exited(ArtworkId),
}

/// Tracks which scan areas contain the camera.
///
/// Feed the returned events to
/// [`RecognitionCoordinator::on_scan_area_enter`](crate::RecognitionCoordinator::on_scan_area_enter)
/// and its `exit` counterpart.
#[derive(Clone, Debug)]
pub struct ScanAreaTracker {
    radius: f32,
    areas: BTreeMap<ArtworkId, Point3<f32>>,
    inside: BTreeSet<ArtworkId>,
}

impl ScanAreaTracker {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            areas: BTreeMap::new(),
            inside: BTreeSet::new(),
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn insert(&mut self, id: ArtworkId, center: Point3<f32>) {
        self.areas.insert(id, center);
    }

    /// Replace all areas with the `artwork<id>` anchors of `ids`.
    pub fn load(&mut self, anchors: &dyn WorldAnchorStore, ids: &[ArtworkId]) {
        self.clear();
        for &id in ids {
            match anchors.get(&AnchorName::artwork(id)) {
                Some(pose) => self.insert(id, pose.position),
                None => log::warn!("scan area {id} has no stored anchor"),
            }
        }
    }

    pub fn clear(&mut self) {
        self.areas.clear();
        self.inside.clear();
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn contains_camera(&self, id: ArtworkId) -> bool {
        self.inside.contains(&id)
    }

    /// Transitions since the last call, exits first.
    pub fn update(&mut self, camera: &Point3<f32>) -> Vec<ScanAreaEvent> {
        let r2 = self.radius * self.radius;
        let now: BTreeSet<ArtworkId> = self
            .areas
            .iter()
            .filter(|(_, c)| (*c - camera).norm_squared() <= r2)
            .map(|(id, _)| *id)
            .collect();

        let mut events: Vec<_> = self
            .inside
            .difference(&now)
            .map(|&id| ScanAreaEvent::Exited(id))
            .collect();
        events.extend(now.difference(&self.inside).map(|&id| ScanAreaEvent::Entered(id)));
        self.inside = now;
        events
    }
}
