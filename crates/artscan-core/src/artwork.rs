//! Artwork identifiers, the eligible id range and the artwork catalog.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifier of a physical artwork.
///
/// Ids come from the data layer, from the recognition engine and from parsed
/// anchor names, so any integer can show up. Only ids inside the configured
/// [`EligibleIds`] range are ever acted upon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkId(pub i64);

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ArtworkId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// The half-open id range `[0, limit)` of artworks that may be recognised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibleIds {
    limit: usize,
}

impl EligibleIds {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    #[inline]
    pub fn is_eligible(&self, id: ArtworkId) -> bool {
        self.index(id).is_some()
    }

    /// Dense index of an eligible id.
    #[inline]
    pub fn index(&self, id: ArtworkId) -> Option<usize> {
        usize::try_from(id.0).ok().filter(|&i| i < self.limit)
    }

    pub fn iter(&self) -> impl Iterator<Item = ArtworkId> {
        (0..self.limit as i64).map(ArtworkId)
    }
}

/// Dense boolean set over [`EligibleIds`].
///
/// Reads of ineligible ids return `false` and writes to them are dropped, so
/// callers can pass engine or anchor ids through unchecked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtworkFlags {
    ids: EligibleIds,
    bits: Vec<bool>,
}

impl ArtworkFlags {
    pub fn new(ids: EligibleIds) -> Self {
        Self {
            ids,
            bits: vec![false; ids.limit()],
        }
    }

    #[inline]
    pub fn ids(&self) -> EligibleIds {
        self.ids
    }

    #[inline]
    pub fn get(&self, id: ArtworkId) -> bool {
        self.ids.index(id).map(|i| self.bits[i]).unwrap_or(false)
    }

    /// Set the flag of `id`. Returns `false` if the id is not eligible.
    pub fn set(&mut self, id: ArtworkId, value: bool) -> bool {
        match self.ids.index(id) {
            Some(i) => {
                self.bits[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.bits.iter_mut().for_each(|b| *b = false);
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Ids whose flag is set, ascending.
    pub fn iter_set(&self) -> impl Iterator<Item = ArtworkId> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| ArtworkId(i as i64))
    }
}

/// Read-only description of an artwork, owned by the data layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtworkRecord {
    pub id: ArtworkId,
    /// Local path of the reference image the recognition models are built from.
    pub image_path: PathBuf,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("artwork {0} listed twice")]
    DuplicateId(ArtworkId),
}

/// All artworks known for the session. Loaded once, immutable afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArtworkCatalog {
    records: BTreeMap<ArtworkId, ArtworkRecord>,
}

impl ArtworkCatalog {
    pub fn new(records: impl IntoIterator<Item = ArtworkRecord>) -> Result<Self, CatalogError> {
        let mut map = BTreeMap::new();
        for record in records {
            let id = record.id;
            if map.insert(id, record).is_some() {
                return Err(CatalogError::DuplicateId(id));
            }
        }
        Ok(Self { records: map })
    }

    /// Load a JSON array of [`ArtworkRecord`]s.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        let records: Vec<ArtworkRecord> = serde_json::from_str(&raw)?;
        Self::new(records)
    }

    #[inline]
    pub fn get(&self, id: ArtworkId) -> Option<&ArtworkRecord> {
        self.records.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: ArtworkId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ArtworkRecord> {
        self.records.values()
    }

    /// Records whose id lies inside `ids`.
    pub fn eligible<'a>(&'a self, ids: &'a EligibleIds) -> impl Iterator<Item = &'a ArtworkRecord> {
        self.records.values().filter(move |r| ids.is_eligible(r.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64) -> ArtworkRecord {
        ArtworkRecord {
            id: ArtworkId(id),
            image_path: PathBuf::from(format!("art/{id}.jpg")),
            title: None,
            artist: None,
            year: None,
        }
    }

    #[test]
    fn eligibility_is_half_open_range() {
        let ids = EligibleIds::new(10);
        for raw in -3..15 {
            assert_eq!(
                ids.is_eligible(ArtworkId(raw)),
                (0..10).contains(&raw),
                "id {raw}"
            );
        }
    }

    #[test]
    fn flags_ignore_ineligible_ids() {
        let mut flags = ArtworkFlags::new(EligibleIds::new(4));
        assert!(!flags.set(ArtworkId(4), true));
        assert!(!flags.set(ArtworkId(-1), true));
        assert!(flags.is_empty());

        assert!(flags.set(ArtworkId(2), true));
        assert!(flags.get(ArtworkId(2)));
        assert!(!flags.get(ArtworkId(17)));
        assert_eq!(flags.iter_set().collect::<Vec<_>>(), vec![ArtworkId(2)]);

        flags.clear();
        assert_eq!(flags.count(), 0);
    }

    #[test]
    fn catalog_rejects_duplicates_and_filters_eligible() {
        assert!(matches!(
            ArtworkCatalog::new([record(1), record(1)]),
            Err(CatalogError::DuplicateId(ArtworkId(1)))
        ));

        let catalog = ArtworkCatalog::new([record(0), record(3), record(12)]).expect("catalog");
        let ids = EligibleIds::new(10);
        let eligible: Vec<_> = catalog.eligible(&ids).map(|r| r.id.0).collect();
        assert_eq!(eligible, vec![0, 3]);
    }

    #[test]
    fn catalog_loads_from_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{"id": 2, "image_path": "img/2.jpg", "title": "Sunflowers"},
                {"id": 5, "image_path": "img/5.jpg"}]"#,
        )
        .expect("write");

        let catalog = ArtworkCatalog::load_json(&path).expect("load");
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.get(ArtworkId(2)).and_then(|r| r.title.as_deref()),
            Some("Sunflowers")
        );
    }
}
