//! Error taxonomy for the Encore core.
//!
//! Two propagation classes exist: failures on the synchronous local-commit
//! path (`StorageWriteFailed`, the capture-machine errors) are fatal to the
//! triggering operation and surface to the caller. Failures on opportunistic
//! background paths (`UploadFailed`, `SongFetchFailed`) are recovered by the
//! reconciler and never surface as fatal — the recording simply stays
//! pending.

use crate::capture::CaptureState;
use crate::SongId;
use thiserror::Error;

/// All errors produced by the recording and catalog subsystem.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Local persistence failed. Fatal to the triggering operation.
    #[error("local storage write failed: {0}")]
    StorageWriteFailed(String),

    /// A stop or commit was requested with no capture in progress.
    #[error("no active recording")]
    NoActiveRecording,

    /// The capture state machine rejected a transition.
    #[error("invalid capture transition: {from} -> {to}")]
    InvalidStateTransition {
        from: CaptureState,
        to: CaptureState,
    },

    /// Transferring an audio asset to the remote store failed. Transient;
    /// the recording remains unsynced and is retried on the next pass.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// Fetching a song or its audio from the remote catalog failed.
    #[error("song fetch failed: {0}")]
    SongFetchFailed(String),

    /// A user-initiated sync was requested while offline.
    #[error("no network connection")]
    NoConnection,

    /// The requested song has no local copy and the device is offline.
    #[error("song not available offline: {0}")]
    SongUnavailableOffline(SongId),

    /// A lyric timeline violated ordering or overlap rules.
    #[error("invalid lyrics: {0}")]
    InvalidLyrics(String),

    /// A persisted snapshot could not be decoded.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
