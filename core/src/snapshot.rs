//! Snapshot format for persisting and restoring store state.
//!
//! The snapshot is the bridge between the in-memory stores and the
//! platform's key-value storage. Recordings are serialized newest-first so
//! the persisted document matches the order the shell displays them in.
//! Songs carry no local timestamp, so they are serialized in id order to
//! keep successive snapshots of the same state byte-identical.

use crate::error::{Error, Result};
use crate::{CatalogStore, Recording, RecordingStore, Song};
use serde::{Deserialize, Serialize};

/// Version of the snapshot format for forward compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time snapshot of both local stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Snapshot format version
    pub format_version: u32,
    /// All recordings, newest-first by creation time
    pub recordings: Vec<Recording>,
    /// All locally known songs, in id order
    pub songs: Vec<Song>,
}

impl StoreSnapshot {
    /// Capture the current state of both stores.
    pub fn from_stores(recordings: &RecordingStore, catalog: &CatalogStore) -> Self {
        let mut songs: Vec<Song> = catalog.all().cloned().collect();
        songs.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            recordings: recordings.all_newest_first(),
            songs,
        }
    }

    /// Rebuild the stores from this snapshot.
    pub fn restore(self) -> Result<(RecordingStore, CatalogStore)> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(Error::InvalidSnapshot(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }

        let mut recordings = RecordingStore::new();
        for rec in self.recordings {
            recordings.upsert(rec);
        }

        let mut catalog = CatalogStore::new();
        for song in self.songs {
            catalog.upsert(song)?;
        }

        Ok((recordings, catalog))
    }

    /// Serialize to the persisted JSON document.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::StorageWriteFailed(e.to_string()))
    }

    /// Decode a persisted JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }
}
