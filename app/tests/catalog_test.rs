//! Integration tests for song resolution and download.

use async_trait::async_trait;
use encore_app::{
    AudioAssets, KeyValueStorage, LocalRecordingStore, MemoryStorage, NetworkMonitor,
    RemoteRecordingDoc, RemoteStore, SongCatalogResolver,
};
use encore_core::{Error, LyricLine, Result, Song};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Catalog-side remote double: serves songs and audio from maps, counting
/// every network touch so offline tests can assert none happened.
#[derive(Default)]
struct MockCatalog {
    songs: Mutex<HashMap<String, Song>>,
    audio: Mutex<HashMap<String, Vec<u8>>>,
    fetch_calls: AtomicUsize,
}

impl MockCatalog {
    fn with_song(song: Song, audio: &[u8]) -> Self {
        let catalog = Self::default();
        catalog
            .audio
            .lock()
            .unwrap()
            .insert(song.audio_url.clone(), audio.to_vec());
        catalog
            .songs
            .lock()
            .unwrap()
            .insert(song.id.clone(), song);
        catalog
    }
}

#[async_trait]
impl RemoteStore for MockCatalog {
    async fn upload_audio(&self, _local_path: &Path) -> Result<String> {
        Err(Error::UploadFailed("not a recording store".into()))
    }

    async fn create_recording(&self, _doc: &RemoteRecordingDoc) -> Result<String> {
        Err(Error::UploadFailed("not a recording store".into()))
    }

    async fn fetch_song(&self, id: &str) -> Result<Song> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.songs
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SongFetchFailed(format!("unknown song {id}")))
    }

    async fn fetch_audio(&self, url: &str) -> Result<Vec<u8>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.audio
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::SongFetchFailed(format!("unknown asset {url}")))
    }
}

fn test_song(id: &str) -> Song {
    Song {
        id: id.into(),
        title: "Test Song".into(),
        artist: "Test Artist".into(),
        duration_ms: 180_000,
        audio_url: format!("https://cdn.test/{id}.mp3"),
        lyrics: vec![LyricLine {
            text: "la la".into(),
            start_ms: 0,
            end_ms: 1500,
        }],
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

struct Stack {
    local: Arc<LocalRecordingStore>,
    remote: Arc<MockCatalog>,
    network: Arc<NetworkMonitor>,
    resolver: SongCatalogResolver,
    _dir: tempfile::TempDir,
}

async fn stack(remote: MockCatalog, online: bool) -> Stack {
    let dir = tempfile::tempdir().unwrap();
    let kv: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
    let assets = AudioAssets::open(dir.path()).await.unwrap();
    let local = LocalRecordingStore::open(kv, assets.clone()).await.unwrap();
    let remote = Arc::new(remote);
    let network = NetworkMonitor::new_shared(online);
    let resolver = SongCatalogResolver::new(
        local.clone(),
        remote.clone(),
        network.clone(),
        assets,
    );
    Stack {
        local,
        remote,
        network,
        resolver,
        _dir: dir,
    }
}

#[tokio::test]
async fn downloaded_song_resolves_offline_without_network() {
    // A downloaded song never triggers a network call.
    let s = stack(MockCatalog::with_song(test_song("s1"), b"audio-bytes"), true).await;

    assert!(s.resolver.download_song(&"s1".to_string()).await.unwrap());
    let fetches_after_download = s.remote.fetch_calls.load(Ordering::SeqCst);

    s.network.set_online(false);
    let song = s.resolver.resolve_song(&"s1".to_string()).await.unwrap();
    assert!(song.is_downloaded);
    assert_eq!(s.remote.fetch_calls.load(Ordering::SeqCst), fetches_after_download);
}

#[tokio::test]
async fn undownloaded_song_offline_fails_informatively() {
    let s = stack(MockCatalog::with_song(test_song("s1"), b"audio"), false).await;

    let err = s.resolver.resolve_song(&"s1".to_string()).await.unwrap_err();
    assert_eq!(err, Error::SongUnavailableOffline("s1".into()));
    // No network IO was attempted while offline.
    assert_eq!(s.remote.fetch_calls.load(Ordering::SeqCst), 0);

    // A cached-but-not-downloaded entry behaves the same.
    s.network.set_online(true);
    s.resolver.resolve_song(&"s1".to_string()).await.unwrap();
    s.network.set_online(false);
    let err = s.resolver.resolve_song(&"s1".to_string()).await.unwrap_err();
    assert_eq!(err, Error::SongUnavailableOffline("s1".into()));
}

#[tokio::test]
async fn remote_fetch_failure_is_distinct_from_offline() {
    let s = stack(MockCatalog::default(), true).await;

    let err = s.resolver.resolve_song(&"ghost".to_string()).await.unwrap_err();
    assert!(matches!(err, Error::SongFetchFailed(_)));
}

#[tokio::test]
async fn resolve_caches_entry_without_downloading_audio() {
    let s = stack(MockCatalog::with_song(test_song("s1"), b"audio"), true).await;

    let song = s.resolver.resolve_song(&"s1".to_string()).await.unwrap();
    assert!(!song.is_downloaded);

    let cached = s.local.get_song("s1").await.unwrap();
    assert!(!cached.is_downloaded);
    assert!(cached.audio_url.starts_with("https://"));
}

#[tokio::test]
async fn zero_byte_download_is_failure_not_success() {
    // A 0-byte remote asset must not mark the song downloaded.
    let s = stack(MockCatalog::with_song(test_song("s1"), b""), true).await;

    assert!(!s.resolver.download_song(&"s1".to_string()).await.unwrap());

    let song = s.local.get_song("s1").await.unwrap();
    assert!(!song.is_downloaded);
    assert!(song.audio_url.starts_with("https://"));
}

#[tokio::test]
async fn download_rewrites_url_and_delete_reverts() {
    let s = stack(MockCatalog::with_song(test_song("s1"), b"real audio"), true).await;

    assert!(s.resolver.download_song(&"s1".to_string()).await.unwrap());
    let song = s.local.get_song("s1").await.unwrap();
    assert!(song.is_downloaded);
    assert!(!song.audio_url.starts_with("https://"));
    let local_path = std::path::PathBuf::from(&song.audio_url);
    assert_eq!(tokio::fs::read(&local_path).await.unwrap(), b"real audio");

    // Downloading again is a no-op success.
    assert!(s.resolver.download_song(&"s1".to_string()).await.unwrap());

    s.resolver.delete_download(&"s1".to_string()).await.unwrap();
    let song = s.local.get_song("s1").await.unwrap();
    assert!(!song.is_downloaded);
    assert!(song.audio_url.starts_with("https://"));
    assert!(!local_path.exists());
}

#[tokio::test]
async fn missing_local_copy_is_fetched_again() {
    // A downloaded entry whose file was wiped behind our back must not
    // report success on a dangling path.
    let s = stack(MockCatalog::with_song(test_song("s1"), b"real audio"), true).await;

    assert!(s.resolver.download_song(&"s1".to_string()).await.unwrap());
    let song = s.local.get_song("s1").await.unwrap();
    let local_path = std::path::PathBuf::from(&song.audio_url);
    tokio::fs::remove_file(&local_path).await.unwrap();

    // Offline, the dangling entry fails like any other unavailable song.
    s.network.set_online(false);
    assert_eq!(
        s.resolver.download_song(&"s1".to_string()).await.unwrap_err(),
        Error::SongUnavailableOffline("s1".into())
    );

    // Online, the audio is fetched again from the parked remote locator.
    s.network.set_online(true);
    let fetches_before = s.remote.fetch_calls.load(Ordering::SeqCst);
    assert!(s.resolver.download_song(&"s1".to_string()).await.unwrap());
    assert!(s.remote.fetch_calls.load(Ordering::SeqCst) > fetches_before);

    let song = s.local.get_song("s1").await.unwrap();
    assert!(song.is_downloaded);
    assert_eq!(song.remote_audio_url.as_deref(), Some("https://cdn.test/s1.mp3"));
    let restored = std::path::PathBuf::from(&song.audio_url);
    assert_eq!(tokio::fs::read(&restored).await.unwrap(), b"real audio");
}

#[tokio::test]
async fn download_while_offline_fails_fast() {
    let s = stack(MockCatalog::with_song(test_song("s1"), b"audio"), false).await;

    let err = s.resolver.download_song(&"s1".to_string()).await.unwrap_err();
    assert_eq!(err, Error::SongUnavailableOffline("s1".into()));
    assert_eq!(s.remote.fetch_calls.load(Ordering::SeqCst), 0);
}
