//! Remote recording store adapter.
//!
//! Thin wrapper over the cloud document/object API, used only when online.
//! It performs no retries and no de-duplication: callers own the retry
//! policy (the reconciler) and the in-flight guard. Any transport or server
//! error, including timeouts imposed by the transport, surfaces as the
//! ordinary `UploadFailed`/`SongFetchFailed`.

use async_trait::async_trait;
use encore_core::{Error, Recording, Result, Song, UserId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Cloud-side recording document, created exactly once per successfully
/// uploaded recording. `createdAt`/`updatedAt` are server-assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRecordingDoc {
    /// Local recording id, embedded so the local↔remote mapping is stable.
    pub recording_id: String,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song_artist: Option<String>,
    pub audio_url: String,
    pub duration_ms: u64,
    pub is_public: bool,
    pub tags: Vec<String>,
    pub play_count: u64,
}

impl RemoteRecordingDoc {
    /// Build the document for an uploaded recording. Song title/artist come
    /// from the catalog entry when known, else from the recording's own
    /// metadata.
    pub fn for_upload(
        recording: &Recording,
        user_id: UserId,
        audio_url: String,
        song: Option<&Song>,
    ) -> Self {
        Self {
            recording_id: recording.id.clone(),
            user_id,
            song_id: recording.song_id.clone(),
            song_title: song
                .map(|s| s.title.clone())
                .or_else(|| Some(recording.title.clone())),
            song_artist: song.map(|s| s.artist.clone()).or_else(|| recording.artist.clone()),
            audio_url,
            duration_ms: recording.duration_ms,
            is_public: recording.is_public,
            tags: recording.tags.clone(),
            play_count: recording.play_count,
        }
    }
}

/// The remote store boundary.
///
/// A trait seam so the sync pipeline can run against a test double; the
/// production implementation is [`HttpRemoteStore`].
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Transfer an audio asset, returning a stable fetchable locator.
    async fn upload_audio(&self, local_path: &Path) -> Result<String>;

    /// Create one remote recording document, returning the server id.
    /// Not idempotent; callers must de-duplicate by recording id.
    async fn create_recording(&self, doc: &RemoteRecordingDoc) -> Result<String>;

    /// Fetch a catalog entry.
    async fn fetch_song(&self, id: &str) -> Result<Song>;

    /// Fetch an audio asset's bytes.
    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
}

/// HTTP implementation of the remote store.
pub struct HttpRemoteStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemoteStore {
    /// Create an adapter for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn upload_audio(&self, local_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| Error::UploadFailed(format!("read {}: {e}", local_path.display())))?;

        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.bin")
            .to_string();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/v1/blobs", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::UploadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::UploadFailed(e.to_string()))?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| Error::UploadFailed(e.to_string()))?;
        Ok(body.url)
    }

    async fn create_recording(&self, doc: &RemoteRecordingDoc) -> Result<String> {
        let response = self
            .client
            .post(format!("{}/v1/recordings", self.base_url))
            .json(doc)
            .send()
            .await
            .map_err(|e| Error::UploadFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::UploadFailed(e.to_string()))?;

        let body: CreateResponse = response
            .json()
            .await
            .map_err(|e| Error::UploadFailed(e.to_string()))?;
        Ok(body.id)
    }

    async fn fetch_song(&self, id: &str) -> Result<Song> {
        let response = self
            .client
            .get(format!("{}/v1/songs/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| Error::SongFetchFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::SongFetchFailed(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| Error::SongFetchFailed(e.to_string()))
    }

    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::SongFetchFailed(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::SongFetchFailed(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::SongFetchFailed(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
