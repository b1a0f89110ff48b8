//! # Encore Core
//!
//! The offline-first domain core for the Encore karaoke app.
//!
//! This crate holds the logic that must behave identically on every
//! platform shell: the recording model and its sync flag, the capture
//! state machine, the song catalog entries with time-aligned lyrics,
//! the in-memory stores, and the snapshot format used for persistence.
//!
//! ## Design Principles
//!
//! - **No IO**: the core has no knowledge of files, network, or platform
//! - **Local is the source of truth**: a recording exists the moment it
//!   is in the [`RecordingStore`]; the cloud is an opportunistic copy
//! - **Sync is monotone**: [`Recording::is_synced`] transitions
//!   false → true exactly once and never reverts
//! - **Testable**: pure logic, no mocks needed
//!
//! ## Core Concepts
//!
//! ### Recordings
//!
//! A [`Recording`] is a captured performance plus metadata. It is created
//! unsynced; the app layer uploads it in the background and calls
//! [`RecordingStore::mark_synced`] as the terminal step of a confirmed
//! upload. Nothing else may set the flag.
//!
//! ### Capture
//!
//! The [`CaptureMachine`] enforces the `idle → recording → stopping → idle`
//! lifecycle so at most one capture is ever active, without locking.
//!
//! ### Catalog
//!
//! A [`Song`] carries an ordered, non-overlapping lyric timeline and an
//! `is_downloaded` flag that flips true only after a verified local copy
//! of the audio exists.
//!
//! ## Persistence
//!
//! Use [`StoreSnapshot`] to serialize both stores to a single versioned
//! document and restore them later. Recordings are ordered newest-first
//! in the snapshot.

pub mod capture;
pub mod error;
pub mod recording;
pub mod snapshot;
pub mod song;
pub mod status;
pub mod store;

// Re-export main types at crate root
pub use capture::{CaptureMachine, CaptureState};
pub use error::{Error, Result};
pub use recording::{Recording, RecordingMeta};
pub use snapshot::{StoreSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use song::{validate_lyrics, LyricLine, Song};
pub use status::SyncStatus;
pub use store::{CatalogStore, RecordingStore};

/// Type aliases for clarity
pub type RecordingId = String;
pub type SongId = String;
pub type UserId = String;
/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;
/// A duration in milliseconds.
pub type DurationMs = u64;
