//! Encore App - offline-first recording lifecycle and sync orchestration.
//!
//! This crate wires the pure `encore-core` domain logic to the device: local
//! key-value and file storage, the remote HTTP store, the connectivity
//! monitor, and the background tasks that push pending recordings to the
//! cloud. Every user-facing operation succeeds with only local storage;
//! uploading is an opportunistic enhancement driven by the
//! [`reconciler::SyncReconciler`].
//!
//! The platform shell (mobile or web) constructs the components at startup,
//! injecting the storage backend and audio device it runs on.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod local;
pub mod network;
pub mod reconciler;
pub mod remote;
pub mod storage;

pub use auth::{AuthProvider, Session, SessionStore, StaticAuth};
pub use catalog::SongCatalogResolver;
pub use config::{AppConfig, ConfigError};
pub use controller::{AudioDevice, RecordingController};
pub use local::LocalRecordingStore;
pub use network::{NetworkMonitor, NetworkState, Subscription};
pub use reconciler::{ReconcileOutcome, SyncReconciler};
pub use remote::{HttpRemoteStore, RemoteRecordingDoc, RemoteStore};
pub use storage::{AudioAssets, FileStorage, KeyValueStorage, MemoryStorage};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing for the process.
///
/// Call once from the shell's entry point. Filtering is controlled by
/// `RUST_LOG`, defaulting to debug output for the app crates.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_app=debug,encore_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
