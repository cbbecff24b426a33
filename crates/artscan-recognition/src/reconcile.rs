//! Startup interpretation of the persisted anchor set.

use artscan_core::{AnchorName, ArtworkId, EligibleIds};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkippedAnchor {
    Malformed { name: String },
    Ineligible { name: String, id: ArtworkId },
}

/// What the anchor store says about the previous session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnchorReport {
    pub room_cached: bool,
    /// Eligible artworks with a scan-area anchor, ascending.
    pub scan_areas: Vec<ArtworkId>,
    pub assets: Vec<ArtworkId>,
    pub other: Vec<String>,
    pub skipped: Vec<SkippedAnchor>,
}

impl AnchorReport {
    /// A cached room needs scan areas and scan areas need a cached room.
    /// Anything else is discarded as a whole.
    pub fn needs_reset(&self) -> bool {
        self.room_cached == self.scan_areas.is_empty()
    }
}

/// Classify every stored anchor name.
///
/// Malformed and out-of-range artwork anchors are logged and skipped.
pub fn reconcile_anchors<S: AsRef<str>>(
    names: &[S],
    room_anchor_name: &str,
    ids: EligibleIds,
) -> AnchorReport {
    let mut report = AnchorReport::default();
    for name in names.iter().map(AsRef::as_ref) {
        log::info!("stored anchor: {name}");
        match AnchorName::parse(name, room_anchor_name) {
            Ok(AnchorName::Room) => report.room_cached = true,
            Ok(AnchorName::Artwork(id)) if ids.is_eligible(id) => report.scan_areas.push(id),
            Ok(AnchorName::Artwork(id)) => {
                log::warn!("anchor {name}: artwork id {id} not eligible");
                report.skipped.push(SkippedAnchor::Ineligible {
                    name: name.to_owned(),
                    id,
                });
            }
            Ok(AnchorName::Asset(id)) => report.assets.push(id),
            Ok(AnchorName::Other(other)) => report.other.push(other),
            Err(e) => {
                log::warn!("{e}");
                report.skipped.push(SkippedAnchor::Malformed {
                    name: name.to_owned(),
                });
            }
        }
    }
    report.scan_areas.sort_unstable();
    report.scan_areas.dedup();
    report.assets.sort_unstable();
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_areas_without_room_need_reset() {
        let report = reconcile_anchors(&["artwork2", "artwork5"], "room", EligibleIds::new(10));
        assert!(!report.room_cached);
        assert_eq!(report.scan_areas, vec![ArtworkId(2), ArtworkId(5)]);
        assert!(report.needs_reset());
    }

    #[test]
    fn room_with_scan_areas_is_consistent() {
        let report = reconcile_anchors(
            &["room", "artwork3", "asset3", "artworkX", "artwork42"],
            "room",
            EligibleIds::new(10),
        );
        assert!(report.room_cached);
        assert_eq!(report.scan_areas, vec![ArtworkId(3)]);
        assert_eq!(report.assets, vec![ArtworkId(3)]);
        assert_eq!(report.skipped.len(), 2);
        assert!(!report.needs_reset());
    }

    #[test]
    fn room_alone_needs_reset_and_empty_store_does_not() {
        assert!(reconcile_anchors(&["room"], "room", EligibleIds::new(10)).needs_reset());
        let empty: [&str; 0] = [];
        assert!(!reconcile_anchors(&empty, "room", EligibleIds::new(10)).needs_reset());
    }

    #[test]
    fn ineligible_only_anchors_count_as_new_room() {
        let report = reconcile_anchors(&["artwork12"], "room", EligibleIds::new(10));
        assert!(report.scan_areas.is_empty());
        assert!(!report.needs_reset());
    }
}
