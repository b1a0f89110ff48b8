//! In-memory stores for recordings and catalog entries.
//!
//! These are the single owners of their entity types; the app layer wraps
//! them with persistence and is the only writer of `is_synced` (as the
//! terminal step of a confirmed upload, via [`RecordingStore::mark_synced`]).

use crate::error::Result;
use crate::song::validate_lyrics;
use crate::{Recording, RecordingId, Song, SongId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Owning container for all local recordings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStore {
    records: HashMap<RecordingId, Recording>,
}

impl RecordingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Idempotent upsert by id.
    pub fn upsert(&mut self, recording: Recording) {
        self.records.insert(recording.id.clone(), recording);
    }

    /// Get a recording by id.
    pub fn get(&self, id: &str) -> Option<&Recording> {
        self.records.get(id)
    }

    /// Remove a recording, returning it so the owner can release the audio
    /// asset. Removing an unknown id is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<Recording> {
        self.records.remove(id)
    }

    /// Check if a recording exists.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Set `is_synced = true` for a recording.
    ///
    /// Idempotent; calling on an unknown id is a no-op. Returns whether the
    /// flag actually changed.
    pub fn mark_synced(&mut self, id: &str) -> bool {
        match self.records.get_mut(id) {
            Some(rec) => rec.mark_synced(),
            None => false,
        }
    }

    /// All recordings, unordered.
    pub fn all(&self) -> impl Iterator<Item = &Recording> {
        self.records.values()
    }

    /// All recordings, newest-first by creation time.
    pub fn all_newest_first(&self) -> Vec<Recording> {
        let mut list: Vec<Recording> = self.records.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        list
    }

    /// The reconciler's work queue: every recording not yet confirmed
    /// uploaded. Reflects all completed upserts not yet followed by
    /// [`mark_synced`](Self::mark_synced).
    pub fn unsynced(&self) -> Vec<Recording> {
        let mut list: Vec<Recording> = self
            .records
            .values()
            .filter(|r| !r.is_synced)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        list
    }

    /// Count of recordings still pending upload.
    pub fn pending_count(&self) -> usize {
        self.records.values().filter(|r| !r.is_synced).count()
    }

    /// Count of all recordings.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store holds no recordings.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Owning container for locally known songs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStore {
    songs: HashMap<SongId, Song>,
}

impl CatalogStore {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            songs: HashMap::new(),
        }
    }

    /// Upsert a song after validating its lyric timeline.
    pub fn upsert(&mut self, song: Song) -> Result<()> {
        validate_lyrics(&song.lyrics)?;
        self.songs.insert(song.id.clone(), song);
        Ok(())
    }

    /// Get a song by id.
    pub fn get(&self, id: &str) -> Option<&Song> {
        self.songs.get(id)
    }

    /// All known songs, unordered.
    pub fn all(&self) -> impl Iterator<Item = &Song> {
        self.songs.values()
    }

    /// Point a song at a verified local audio copy. Returns false for an
    /// unknown id.
    pub fn mark_downloaded(&mut self, id: &str, local_path: &str) -> bool {
        match self.songs.get_mut(id) {
            Some(song) => {
                song.mark_downloaded(local_path);
                true
            }
            None => false,
        }
    }

    /// Revert a song to its remote locator. Returns the local path that was
    /// in use, so the caller can delete the file.
    pub fn clear_download(&mut self, id: &str) -> Option<String> {
        let song = self.songs.get_mut(id)?;
        if !song.is_downloaded {
            return None;
        }
        let local_path = song.audio_url.clone();
        song.clear_download();
        Some(local_path)
    }

    /// Remove a song entirely.
    pub fn remove(&mut self, id: &str) -> Option<Song> {
        self.songs.remove(id)
    }

    /// Count of known songs.
    pub fn len(&self) -> usize {
        self.songs.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }
}
