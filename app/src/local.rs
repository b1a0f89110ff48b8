//! Local recording store.
//!
//! The durable source of truth for everything not yet confirmed uploaded.
//! Wraps the in-memory core stores and persists a snapshot to key-value
//! storage after every mutation; a mutation that cannot be persisted is
//! rolled back in memory and surfaced as `StorageWriteFailed`.
//!
//! This component is the sole writer of `is_synced`: the flag is set only
//! through [`LocalRecordingStore::mark_synced`], as the terminal step of a
//! confirmed upload.

use crate::storage::{AudioAssets, KeyValueStorage};
use encore_core::{CatalogStore, Recording, RecordingStore, Result, Song, StoreSnapshot};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const STORE_KEY: &str = "store";

struct StoreState {
    recordings: RecordingStore,
    catalog: CatalogStore,
}

/// On-device store for recordings and the downloaded-song list.
pub struct LocalRecordingStore {
    kv: Arc<dyn KeyValueStorage>,
    assets: AudioAssets,
    state: Mutex<StoreState>,
}

impl LocalRecordingStore {
    /// Open the store, restoring any persisted snapshot.
    pub async fn open(kv: Arc<dyn KeyValueStorage>, assets: AudioAssets) -> Result<Arc<Self>> {
        let (recordings, catalog) = match kv.get(STORE_KEY).await? {
            Some(raw) => StoreSnapshot::from_json(&raw)?.restore()?,
            None => (RecordingStore::new(), CatalogStore::new()),
        };

        tracing::info!(
            recordings = recordings.len(),
            pending = recordings.pending_count(),
            songs = catalog.len(),
            "local store opened"
        );

        Ok(Arc::new(Self {
            kv,
            assets,
            state: Mutex::new(StoreState {
                recordings,
                catalog,
            }),
        }))
    }

    async fn persist(&self, state: &StoreState) -> Result<()> {
        let json = StoreSnapshot::from_stores(&state.recordings, &state.catalog).to_json()?;
        self.kv.set(STORE_KEY, &json).await
    }

    /// Idempotent upsert by id. Never touches the network; fails only on
    /// local storage trouble.
    pub async fn save(&self, recording: Recording) -> Result<()> {
        let mut state = self.state.lock().await;
        let previous = state.recordings.get(&recording.id).cloned();
        let id = recording.id.clone();
        state.recordings.upsert(recording);

        if let Err(e) = self.persist(&state).await {
            // Roll back so memory never claims durability storage refused.
            match previous {
                Some(prev) => state.recordings.upsert(prev),
                None => {
                    state.recordings.remove(&id);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Get a recording by id.
    pub async fn get(&self, id: &str) -> Option<Recording> {
        self.state.lock().await.recordings.get(id).cloned()
    }

    /// All recordings, newest-first.
    pub async fn list(&self) -> Vec<Recording> {
        self.state.lock().await.recordings.all_newest_first()
    }

    /// Delete a recording and release its audio asset. Deleting an unknown
    /// id is a no-op, not an error.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let Some(removed) = state.recordings.remove(id) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&state).await {
            state.recordings.upsert(removed);
            return Err(e);
        }

        // Asset release happens after the delete is durable; a leftover
        // file is preferable to a dangling record.
        self.assets.remove(Path::new(&removed.audio_path)).await;
        tracing::debug!(recording = %id, "recording deleted");
        Ok(())
    }

    /// Terminal step of a confirmed upload. Idempotent; unknown ids are a
    /// no-op. Returns whether the flag actually changed.
    pub async fn mark_synced(&self, id: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.recordings.mark_synced(id) {
            return Ok(false);
        }
        // The flag stays set even if this persist fails: sync state is
        // monotone, and the snapshot is rewritten on the next mutation.
        self.persist(&state).await?;
        Ok(true)
    }

    /// The reconciler's work queue: all recordings with `is_synced = false`,
    /// oldest-first so retries favor the longest-waiting takes.
    pub async fn unsynced_recordings(&self) -> Vec<Recording> {
        self.state.lock().await.recordings.unsynced()
    }

    /// Count of recordings pending upload.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.recordings.pending_count()
    }

    /// Cache or update a catalog entry (validates lyrics).
    pub async fn save_song(&self, song: Song) -> Result<()> {
        let mut state = self.state.lock().await;
        let previous = state.catalog.get(&song.id).cloned();
        let id = song.id.clone();
        state.catalog.upsert(song)?;

        if let Err(e) = self.persist(&state).await {
            match previous {
                Some(prev) => {
                    // The previous entry already validated once.
                    let _ = state.catalog.upsert(prev);
                }
                None => {
                    state.catalog.remove(&id);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// Get a locally known song.
    pub async fn get_song(&self, id: &str) -> Option<Song> {
        self.state.lock().await.catalog.get(id).cloned()
    }

    /// All locally known songs.
    pub async fn songs(&self) -> Vec<Song> {
        self.state.lock().await.catalog.all().cloned().collect()
    }

    /// Flip a song to downloaded, pointing it at the verified local copy.
    pub async fn mark_song_downloaded(&self, id: &str, local_path: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let previous = state.catalog.get(id).cloned();
        if !state.catalog.mark_downloaded(id, local_path) {
            return Ok(false);
        }

        if let Err(e) = self.persist(&state).await {
            if let Some(prev) = previous {
                let _ = state.catalog.upsert(prev);
            }
            return Err(e);
        }
        Ok(true)
    }

    /// Delete a song's local audio copy and revert it to the remote URL.
    pub async fn delete_song_download(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let previous = state.catalog.get(id).cloned();
        let Some(local_path) = state.catalog.clear_download(id) else {
            return Ok(());
        };

        if let Err(e) = self.persist(&state).await {
            if let Some(prev) = previous {
                let _ = state.catalog.upsert(prev);
            }
            return Err(e);
        }

        self.assets.remove(Path::new(&local_path)).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use encore_core::{Error, RecordingMeta};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// KV double whose writes can be made to fail, the way a full disk
    /// would, while reads keep working.
    struct FlakyStorage {
        inner: MemoryStorage,
        failing: AtomicBool,
    }

    impl FlakyStorage {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryStorage::new(),
                failing: AtomicBool::new(false),
            })
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl KeyValueStorage for FlakyStorage {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error::StorageWriteFailed("disk full".into()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key).await
        }
    }

    async fn open_store(kv: Arc<dyn KeyValueStorage>) -> (Arc<LocalRecordingStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let assets = AudioAssets::open(dir.path()).await.unwrap();
        let store = LocalRecordingStore::open(kv, assets).await.unwrap();
        (store, dir)
    }

    fn recording(id: &str, created_at: u64) -> Recording {
        Recording::new(id, format!("/audio/{id}.wav"), created_at, RecordingMeta::default())
    }

    #[tokio::test]
    async fn save_survives_reopen() {
        let kv: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let (store, dir) = open_store(kv.clone()).await;

        store.save(recording("rec-1", 1000)).await.unwrap();
        store.save(recording("rec-2", 2000)).await.unwrap();
        store.mark_synced("rec-1").await.unwrap();
        drop(store);

        let assets = AudioAssets::open(dir.path()).await.unwrap();
        let reopened = LocalRecordingStore::open(kv, assets).await.unwrap();
        assert!(reopened.get("rec-1").await.unwrap().is_synced);
        let pending: Vec<_> = reopened
            .unsynced_recordings()
            .await
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(pending, vec!["rec-2"]);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let kv: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let (store, _dir) = open_store(kv).await;

        store.save(recording("rec-old", 1000)).await.unwrap();
        store.save(recording("rec-new", 9000)).await.unwrap();

        let ids: Vec<_> = store.list().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["rec-new", "rec-old"]);
    }

    #[tokio::test]
    async fn delete_releases_audio_and_is_noop_on_unknown() {
        let kv: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let dir = tempfile::tempdir().unwrap();
        let assets = AudioAssets::open(dir.path()).await.unwrap();
        let store = LocalRecordingStore::open(kv, assets.clone()).await.unwrap();

        let audio = assets.import_bytes("rec-1.wav", b"pcm").await.unwrap();
        let mut rec = recording("rec-1", 1000);
        rec.audio_path = audio.display().to_string();
        store.save(rec).await.unwrap();

        store.delete("rec-1").await.unwrap();
        assert!(store.get("rec-1").await.is_none());
        assert!(!audio.exists());

        store.delete("rec-1").await.unwrap(); // no-op
        store.delete("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn mark_synced_is_idempotent_across_persistence() {
        let kv: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let (store, _dir) = open_store(kv).await;

        store.save(recording("rec-1", 1000)).await.unwrap();
        assert!(store.mark_synced("rec-1").await.unwrap());
        assert!(!store.mark_synced("rec-1").await.unwrap());
        assert!(!store.mark_synced("ghost").await.unwrap());
        assert_eq!(store.pending_count().await, 0);
    }

    fn song(id: &str) -> Song {
        Song {
            id: id.into(),
            title: "Song".into(),
            artist: "Artist".into(),
            duration_ms: 1000,
            audio_url: format!("https://cdn.example.com/{id}.mp3"),
            lyrics: Vec::new(),
            genre: None,
            language: None,
            difficulty: None,
            is_public: true,
            download_count: 0,
            rating: 0.0,
            tags: Vec::new(),
            is_downloaded: false,
            remote_audio_url: None,
        }
    }

    #[tokio::test]
    async fn song_download_lifecycle() {
        let kv: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let dir = tempfile::tempdir().unwrap();
        let assets = AudioAssets::open(dir.path()).await.unwrap();
        let store = LocalRecordingStore::open(kv, assets.clone()).await.unwrap();

        store.save_song(song("song-1")).await.unwrap();

        let local = assets.import_bytes("song-1.mp3", b"audio").await.unwrap();
        assert!(store
            .mark_song_downloaded("song-1", &local.display().to_string())
            .await
            .unwrap());
        assert!(store.get_song("song-1").await.unwrap().is_downloaded);

        store.delete_song_download("song-1").await.unwrap();
        let song = store.get_song("song-1").await.unwrap();
        assert!(!song.is_downloaded);
        assert_eq!(song.audio_url, "https://cdn.example.com/song-1.mp3");
        assert!(!local.exists());
    }

    #[tokio::test]
    async fn failed_persist_rolls_back_new_save() {
        let kv = FlakyStorage::new();
        let (store, _dir) = open_store(kv.clone()).await;

        kv.set_failing(true);
        let err = store.save(recording("rec-1", 1000)).await.unwrap_err();
        assert!(matches!(err, Error::StorageWriteFailed(_)));

        // Memory never claims durability storage refused.
        assert!(store.get("rec-1").await.is_none());
        assert_eq!(store.pending_count().await, 0);

        // Storage recovers and the same save lands.
        kv.set_failing(false);
        store.save(recording("rec-1", 1000)).await.unwrap();
        assert!(store.get("rec-1").await.is_some());
    }

    #[tokio::test]
    async fn failed_persist_restores_previous_record() {
        let kv = FlakyStorage::new();
        let (store, _dir) = open_store(kv.clone()).await;

        let original = Recording::new(
            "rec-1",
            "/audio/rec-1.wav",
            1000,
            RecordingMeta {
                duration_ms: Some(3000),
                ..RecordingMeta::default()
            },
        );
        store.save(original.clone()).await.unwrap();

        kv.set_failing(true);
        let mut updated = original.clone();
        updated.duration_ms = 9000;
        let err = store.save(updated).await.unwrap_err();
        assert!(matches!(err, Error::StorageWriteFailed(_)));

        assert_eq!(store.get("rec-1").await.unwrap(), original);
    }

    #[tokio::test]
    async fn failed_persist_rolls_back_delete() {
        let kv = FlakyStorage::new();
        let (store, _dir) = open_store(kv.clone()).await;

        store.save(recording("rec-1", 1000)).await.unwrap();

        kv.set_failing(true);
        let err = store.delete("rec-1").await.unwrap_err();
        assert!(matches!(err, Error::StorageWriteFailed(_)));
        assert!(store.get("rec-1").await.is_some());
        assert_eq!(store.pending_count().await, 1);
    }

    #[tokio::test]
    async fn mark_synced_flag_survives_persist_failure() {
        let kv = FlakyStorage::new();
        let (store, dir) = open_store(kv.clone()).await;

        store.save(recording("rec-1", 1000)).await.unwrap();

        kv.set_failing(true);
        let err = store.mark_synced("rec-1").await.unwrap_err();
        assert!(matches!(err, Error::StorageWriteFailed(_)));
        // Sync state is monotone: the in-memory flag stays set.
        assert!(store.get("rec-1").await.unwrap().is_synced);

        // The next successful mutation rewrites the snapshot with the flag.
        kv.set_failing(false);
        store.save(recording("rec-2", 2000)).await.unwrap();
        drop(store);

        let assets = AudioAssets::open(dir.path()).await.unwrap();
        let reopened = LocalRecordingStore::open(kv, assets).await.unwrap();
        assert!(reopened.get("rec-1").await.unwrap().is_synced);
    }

    #[tokio::test]
    async fn failed_persist_rolls_back_song_download() {
        let kv = FlakyStorage::new();
        let (store, _dir) = open_store(kv.clone()).await;

        store.save_song(song("song-1")).await.unwrap();

        kv.set_failing(true);
        let err = store
            .mark_song_downloaded("song-1", "/data/song-1.mp3")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageWriteFailed(_)));

        let song = store.get_song("song-1").await.unwrap();
        assert!(!song.is_downloaded);
        assert_eq!(song.audio_url, "https://cdn.example.com/song-1.mp3");
    }
}
