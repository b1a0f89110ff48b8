//! The recording model.
//!
//! A [`Recording`] is durable the moment it lands in the local store; the
//! `is_synced` flag tracks whether the cloud copy exists and only ever moves
//! from `false` to `true`.

use crate::{DurationMs, RecordingId, SongId, Timestamp};
use serde::{Deserialize, Serialize};

/// Descriptive metadata supplied when a capture is committed.
///
/// Everything is optional; an unknown duration commits as the `0` sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMeta {
    /// Song this performance was sung against; `None` for freeform takes.
    pub song_id: Option<SongId>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration_ms: Option<DurationMs>,
    pub is_public: bool,
    pub tags: Vec<String>,
}

/// A locally captured performance plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Locally generated, collision-resistant identifier.
    pub id: RecordingId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song_id: Option<SongId>,
    /// Handle to the captured audio asset, owned by the local store.
    pub audio_path: String,
    pub duration_ms: DurationMs,
    /// Set once at commit time, immutable thereafter.
    pub created_at: Timestamp,
    /// False at creation; flips true exactly once after a confirmed upload.
    pub is_synced: bool,
    pub is_public: bool,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    pub tags: Vec<String>,
    pub play_count: u64,
}

impl Recording {
    /// Create a new, unsynced recording from commit-time metadata.
    pub fn new(
        id: impl Into<RecordingId>,
        audio_path: impl Into<String>,
        created_at: Timestamp,
        meta: RecordingMeta,
    ) -> Self {
        Self {
            id: id.into(),
            song_id: meta.song_id,
            audio_path: audio_path.into(),
            duration_ms: meta.duration_ms.unwrap_or(0),
            created_at,
            is_synced: false,
            is_public: meta.is_public,
            title: meta.title.unwrap_or_else(|| "Untitled recording".to_string()),
            artist: meta.artist,
            tags: meta.tags,
            play_count: 0,
        }
    }

    /// Mark this recording as having a confirmed remote copy.
    ///
    /// Idempotent and monotone; returns whether the flag actually changed.
    pub fn mark_synced(&mut self) -> bool {
        if self.is_synced {
            return false;
        }
        self.is_synced = true;
        true
    }

    /// Record one local playback. Descriptive metadata stays mutable
    /// independent of sync state.
    pub fn touch_play(&mut self) {
        self.play_count += 1;
    }
}
