//! Catalog entries with time-aligned lyrics.

use crate::error::{Error, Result};
use crate::{DurationMs, SongId};
use serde::{Deserialize, Serialize};

/// One lyric line with its display window in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricLine {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// A karaoke catalog entry.
///
/// While downloaded, `audio_url` points at the local copy and the original
/// remote locator is parked in `remote_audio_url` so deletion can revert it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    pub duration_ms: DurationMs,
    pub audio_url: String,
    pub lyrics: Vec<LyricLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether a verified local audio copy exists.
    #[serde(default)]
    pub is_downloaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_audio_url: Option<String>,
}

impl Song {
    /// Point this entry at a verified local audio copy.
    pub fn mark_downloaded(&mut self, local_path: impl Into<String>) {
        if !self.is_downloaded {
            self.remote_audio_url = Some(std::mem::replace(&mut self.audio_url, local_path.into()));
            self.is_downloaded = true;
        } else {
            self.audio_url = local_path.into();
        }
    }

    /// Revert to the remote locator after the local copy is deleted.
    pub fn clear_download(&mut self) {
        if let Some(url) = self.remote_audio_url.take() {
            self.audio_url = url;
        }
        self.is_downloaded = false;
    }
}

/// Validate a lyric timeline: each line `start < end`, lines sorted
/// ascending by start, and no two windows overlapping.
pub fn validate_lyrics(lyrics: &[LyricLine]) -> Result<()> {
    for (i, line) in lyrics.iter().enumerate() {
        if line.start_ms >= line.end_ms {
            return Err(Error::InvalidLyrics(format!(
                "line {} has start {} >= end {}",
                i, line.start_ms, line.end_ms
            )));
        }
        if i > 0 {
            let prev = &lyrics[i - 1];
            if line.start_ms < prev.start_ms {
                return Err(Error::InvalidLyrics(format!(
                    "line {} starts before line {}",
                    i,
                    i - 1
                )));
            }
            if line.start_ms < prev.end_ms {
                return Err(Error::InvalidLyrics(format!(
                    "line {} overlaps line {}",
                    i,
                    i - 1
                )));
            }
        }
    }
    Ok(())
}
