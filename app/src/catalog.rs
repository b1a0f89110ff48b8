//! Song catalog resolver.
//!
//! Resolution order: the local downloaded copy wins and never touches the
//! network; otherwise the remote catalog is consulted only when the monitor
//! confirms connectivity. Downloading audio is a separate, explicit step
//! with a verified non-empty write before the song is marked downloaded.

use crate::local::LocalRecordingStore;
use crate::network::NetworkMonitor;
use crate::remote::RemoteStore;
use crate::storage::AudioAssets;
use encore_core::{Error, Result, Song, SongId};
use std::path::Path;
use std::sync::Arc;

/// Resolves songs against local storage first, the remote catalog second.
pub struct SongCatalogResolver {
    local: Arc<LocalRecordingStore>,
    remote: Arc<dyn RemoteStore>,
    network: Arc<NetworkMonitor>,
    assets: AudioAssets,
}

impl SongCatalogResolver {
    pub fn new(
        local: Arc<LocalRecordingStore>,
        remote: Arc<dyn RemoteStore>,
        network: Arc<NetworkMonitor>,
        assets: AudioAssets,
    ) -> Self {
        Self {
            local,
            remote,
            network,
            assets,
        }
    }

    /// Resolve a song for playback.
    ///
    /// A downloaded local copy is returned immediately with no network
    /// call. Otherwise: offline fails with `SongUnavailableOffline` (no
    /// network IO is attempted), and a remote fetch failure surfaces
    /// distinctly as `SongFetchFailed`. A successful fetch caches the
    /// catalog entry but does not download its audio.
    pub async fn resolve_song(&self, id: &SongId) -> Result<Song> {
        if let Some(song) = self.local.get_song(id).await {
            if song.is_downloaded {
                tracing::debug!(song = %id, "resolved from local download");
                return Ok(song);
            }
        }

        if !self.network.is_online() {
            return Err(Error::SongUnavailableOffline(id.clone()));
        }

        let song = self.remote.fetch_song(id).await?;
        self.local.save_song(song.clone()).await?;
        Ok(song)
    }

    /// Download a song's audio for offline use.
    ///
    /// Returns `Ok(true)` once a verified, non-empty local copy exists and
    /// the catalog entry points at it. A zero-byte or unwritable result is
    /// a failure (`Ok(false)`) that leaves the entry un-downloaded and
    /// uncorrupted. An entry already marked downloaded is re-verified on
    /// disk and fetched again if its copy has gone missing.
    pub async fn download_song(&self, id: &SongId) -> Result<bool> {
        let song = self.resolve_song(id).await?;
        if song.is_downloaded {
            // The flag can outlive the file (cache wipe, manual delete);
            // a missing copy falls through to a fresh download.
            if tokio::fs::try_exists(Path::new(&song.audio_url))
                .await
                .unwrap_or(false)
            {
                return Ok(true);
            }
            tracing::warn!(song = %id, "downloaded audio missing on disk, fetching again");
        }

        if !self.network.is_online() {
            return Err(Error::SongUnavailableOffline(id.clone()));
        }

        // A re-download starts from the parked remote locator, not the
        // stale local path.
        let remote_url = song.remote_audio_url.as_deref().unwrap_or(&song.audio_url);
        let bytes = self.remote.fetch_audio(remote_url).await?;
        if bytes.is_empty() {
            tracing::warn!(song = %id, "remote audio was empty, not marking downloaded");
            return Ok(false);
        }

        let file_name = format!("song-{id}.mp3");
        let local_path = match self.assets.import_bytes(&file_name, &bytes).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(song = %id, error = %e, "could not store downloaded audio");
                return Ok(false);
            }
        };

        self.local
            .mark_song_downloaded(id, &local_path.display().to_string())
            .await?;
        tracing::info!(song = %id, bytes = bytes.len(), "song downloaded");
        Ok(true)
    }

    /// Delete a song's local audio copy, reverting it to streaming-only.
    pub async fn delete_download(&self, id: &SongId) -> Result<()> {
        self.local.delete_song_download(id).await
    }
}
