//! World anchors: naming scheme and the persistent store seam.
//!
//! Anchors are named poses that survive between sessions. Three kinds of names
//! are produced by this workspace: the room anchor (configurable file name),
//! `artwork<id>` for validated artworks and `asset<id>` for placed assets.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ArtworkId, Pose};

pub const ARTWORK_ANCHOR_PREFIX: &str = "artwork";
pub const ASSET_ANCHOR_PREFIX: &str = "asset";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnchorNameError {
    #[error("anchor `{name}` has a non-numeric id suffix")]
    InvalidId { name: String },
}

/// Parsed meaning of a stored anchor name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnchorName {
    Room,
    Artwork(ArtworkId),
    Asset(ArtworkId),
    Other(String),
}

impl AnchorName {
    /// Classify `name`. A prefix only matches when the name is strictly longer
    /// than it, so a bare `artwork` is [`AnchorName::Other`].
    pub fn parse(name: &str, room_name: &str) -> Result<Self, AnchorNameError> {
        if name == room_name {
            return Ok(Self::Room);
        }
        let kinds: [(&str, fn(ArtworkId) -> Self); 2] = [
            (ARTWORK_ANCHOR_PREFIX, Self::Artwork),
            (ASSET_ANCHOR_PREFIX, Self::Asset),
        ];
        for (prefix, make) in kinds {
            if let Some(suffix) = name.strip_prefix(prefix).filter(|s| !s.is_empty()) {
                return suffix
                    .parse::<i64>()
                    .map(|id| make(ArtworkId(id)))
                    .map_err(|_| AnchorNameError::InvalidId {
                        name: name.to_owned(),
                    });
            }
        }
        Ok(Self::Other(name.to_owned()))
    }

    pub fn artwork(id: ArtworkId) -> String {
        format!("{ARTWORK_ANCHOR_PREFIX}{id}")
    }

    pub fn asset(id: ArtworkId) -> String {
        format!("{ASSET_ANCHOR_PREFIX}{id}")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum AnchorStoreError {
    #[error("anchor store is not ready")]
    NotReady,
    #[error("anchor `{0}` already exists")]
    Exists(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Persistent named poses.
///
/// Implementations on device wrap the platform anchor store; the host keeps
/// [`WorldAnchorStore::is_ready`] false until it has finished loading.
pub trait WorldAnchorStore {
    fn is_ready(&self) -> bool;

    /// All stored names, in a stable order.
    fn ids(&self) -> Vec<String>;

    fn get(&self, name: &str) -> Option<Pose>;

    /// Store a new anchor. Fails with [`AnchorStoreError::Exists`] if the
    /// name is taken.
    fn save(&mut self, name: &str, pose: Pose) -> Result<(), AnchorStoreError>;

    /// Returns whether an anchor was removed.
    fn remove(&mut self, name: &str) -> Result<bool, AnchorStoreError>;

    fn clear(&mut self) -> Result<(), AnchorStoreError>;

    /// Remove a stale anchor of the same name, then save.
    fn replace(&mut self, name: &str, pose: Pose) -> Result<(), AnchorStoreError> {
        self.remove(name)?;
        self.save(name, pose)
    }
}

/// In-memory store, always ready unless told otherwise.
#[derive(Clone, Debug)]
pub struct MemoryAnchorStore {
    anchors: BTreeMap<String, Pose>,
    ready: bool,
}

impl Default for MemoryAnchorStore {
    fn default() -> Self {
        Self {
            anchors: BTreeMap::new(),
            ready: true,
        }
    }
}

impl MemoryAnchorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchors<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut store = Self::new();
        for name in names {
            store.anchors.insert(name.to_owned(), Pose::identity());
        }
        store
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

impl WorldAnchorStore for MemoryAnchorStore {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn ids(&self) -> Vec<String> {
        self.anchors.keys().cloned().collect()
    }

    fn get(&self, name: &str) -> Option<Pose> {
        self.anchors.get(name).copied()
    }

    fn save(&mut self, name: &str, pose: Pose) -> Result<(), AnchorStoreError> {
        if !self.ready {
            return Err(AnchorStoreError::NotReady);
        }
        if self.anchors.contains_key(name) {
            return Err(AnchorStoreError::Exists(name.to_owned()));
        }
        self.anchors.insert(name.to_owned(), pose);
        Ok(())
    }

    fn remove(&mut self, name: &str) -> Result<bool, AnchorStoreError> {
        Ok(self.anchors.remove(name).is_some())
    }

    fn clear(&mut self) -> Result<(), AnchorStoreError> {
        self.anchors.clear();
        Ok(())
    }
}

/// Store persisted as a pretty-printed JSON object `{ name: pose }`.
///
/// Every mutation rewrites the file.
#[derive(Debug)]
pub struct JsonAnchorStore {
    path: PathBuf,
    anchors: BTreeMap<String, Pose>,
}

impl JsonAnchorStore {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AnchorStoreError> {
        let path = path.as_ref().to_path_buf();
        let anchors: BTreeMap<String, Pose> = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        log::debug!("opened anchor store {} ({} anchors)", path.display(), anchors.len());
        Ok(Self { path, anchors })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), AnchorStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.anchors)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl WorldAnchorStore for JsonAnchorStore {
    fn is_ready(&self) -> bool {
        true
    }

    fn ids(&self) -> Vec<String> {
        self.anchors.keys().cloned().collect()
    }

    fn get(&self, name: &str) -> Option<Pose> {
        self.anchors.get(name).copied()
    }

    fn save(&mut self, name: &str, pose: Pose) -> Result<(), AnchorStoreError> {
        if self.anchors.contains_key(name) {
            return Err(AnchorStoreError::Exists(name.to_owned()));
        }
        self.anchors.insert(name.to_owned(), pose);
        self.persist()
    }

    fn remove(&mut self, name: &str) -> Result<bool, AnchorStoreError> {
        if self.anchors.remove(name).is_none() {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), AnchorStoreError> {
        self.anchors.clear();
        self.persist()
    }
}
