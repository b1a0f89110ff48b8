//! Sync reconciler.
//!
//! Drives every unsynced recording to the remote store, one at a time, and
//! flips the local sync flag on success. Two producers feed it: the
//! commit-time background upload and the periodic/event-driven pass. Both
//! funnel into the single idempotent consumer [`SyncReconciler::upload_and_mark`],
//! guarded by an in-flight set keyed by recording id, so racing producers
//! cannot create duplicate remote records.

use crate::auth::AuthProvider;
use crate::local::LocalRecordingStore;
use crate::network::NetworkMonitor;
use crate::remote::{RemoteRecordingDoc, RemoteStore};
use dashmap::DashSet;
use encore_core::{Error, RecordingId, Result, SyncStatus};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// How a reconciliation pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A pass ran to completion over the whole queue.
    Completed { synced: usize, failed: usize },
    /// The device is offline; nothing was attempted.
    SkippedOffline,
    /// Another pass was already in flight; this trigger was dropped.
    AlreadyRunning,
}

/// Clears the syncing flag when a pass ends, on every exit path.
struct SyncingGuard<'a>(&'a AtomicBool);

impl Drop for SyncingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Removes an id from the in-flight set when an upload attempt ends.
struct InFlightGuard<'a> {
    set: &'a DashSet<RecordingId>,
    id: RecordingId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.remove(&self.id);
    }
}

/// Pushes locally-pending recordings to the remote store.
pub struct SyncReconciler {
    local: Arc<LocalRecordingStore>,
    remote: Arc<dyn RemoteStore>,
    network: Arc<NetworkMonitor>,
    auth: Arc<dyn AuthProvider>,
    interval: Duration,
    syncing: AtomicBool,
    in_flight: DashSet<RecordingId>,
    /// Millisecond timestamp of the last completed pass; 0 = never.
    last_sync_ms: AtomicU64,
}

impl SyncReconciler {
    /// Create a reconciler. `interval` is the periodic trigger spacing.
    pub fn new(
        local: Arc<LocalRecordingStore>,
        remote: Arc<dyn RemoteStore>,
        network: Arc<NetworkMonitor>,
        auth: Arc<dyn AuthProvider>,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            local,
            remote,
            network,
            auth,
            interval,
            syncing: AtomicBool::new(false),
            in_flight: DashSet::new(),
            last_sync_ms: AtomicU64::new(0),
        })
    }

    /// Run one reconciliation pass.
    ///
    /// Returns immediately (without error) when offline or when another
    /// pass is in flight. Per-item failures are isolated: a failing upload
    /// leaves that recording unsynced for the next pass and processing
    /// continues.
    pub async fn reconcile(&self) -> ReconcileOutcome {
        if !self.network.is_online() {
            return ReconcileOutcome::SkippedOffline;
        }
        if self.syncing.swap(true, Ordering::SeqCst) {
            return ReconcileOutcome::AlreadyRunning;
        }
        let _guard = SyncingGuard(&self.syncing);

        let queue = self.local.unsynced_recordings().await;
        tracing::debug!(pending = queue.len(), "reconciliation pass started");

        // Sequential uploads: bounded resource use matters more than
        // throughput on a phone.
        let mut synced = 0;
        let mut failed = 0;
        for rec in queue {
            match self.upload_and_mark(&rec.id).await {
                Ok(true) => synced += 1,
                Ok(false) => {} // already synced, in flight, or anonymous
                Err(e) => {
                    failed += 1;
                    tracing::warn!(recording = %rec.id, error = %e, "sync failed, will retry");
                }
            }
        }

        self.last_sync_ms
            .store(chrono::Utc::now().timestamp_millis() as u64, Ordering::SeqCst);
        tracing::info!(synced, failed, "reconciliation pass finished");
        ReconcileOutcome::Completed { synced, failed }
    }

    /// User-initiated sync. Unlike the background triggers, being offline
    /// is surfaced immediately as [`Error::NoConnection`].
    pub async fn force_sync(&self) -> Result<ReconcileOutcome> {
        if !self.network.is_online() {
            return Err(Error::NoConnection);
        }
        Ok(self.reconcile().await)
    }

    /// The single idempotent consumer both producers feed.
    ///
    /// Uploads one recording's audio, creates its remote document, and
    /// marks it synced. Returns `Ok(true)` only when this call performed
    /// the upload; `Ok(false)` when there was nothing to do (already
    /// synced, already in flight elsewhere, deleted meanwhile, or no
    /// signed-in user). A cancelled or failed attempt leaves the local
    /// recording unmodified: the only local write is the terminal
    /// `mark_synced`.
    pub async fn upload_and_mark(&self, id: &str) -> Result<bool> {
        if !self.in_flight.insert(id.to_string()) {
            tracing::debug!(recording = %id, "upload already in flight, skipping");
            return Ok(false);
        }
        let _guard = InFlightGuard {
            set: &self.in_flight,
            id: id.to_string(),
        };

        let Some(recording) = self.local.get(id).await else {
            return Ok(false);
        };
        if recording.is_synced {
            return Ok(false);
        }
        let Some(user_id) = self.auth.user_id() else {
            tracing::debug!(recording = %id, "no signed-in user, staying local-only");
            return Ok(false);
        };

        let audio_url = self
            .remote
            .upload_audio(Path::new(&recording.audio_path))
            .await?;

        let song = match &recording.song_id {
            Some(song_id) => self.local.get_song(song_id).await,
            None => None,
        };
        let doc = RemoteRecordingDoc::for_upload(&recording, user_id, audio_url, song.as_ref());
        let remote_id = self.remote.create_recording(&doc).await?;

        self.local.mark_synced(id).await?;
        tracing::info!(recording = %id, remote = %remote_id, "recording synced");
        Ok(true)
    }

    /// Derived view of the sync subsystem.
    pub async fn status(&self) -> SyncStatus {
        let last = self.last_sync_ms.load(Ordering::SeqCst);
        SyncStatus {
            is_online: self.network.is_online(),
            is_syncing: self.syncing.load(Ordering::SeqCst),
            pending_uploads: self.local.pending_count().await,
            last_sync_time: if last == 0 { None } else { Some(last) },
        }
    }

    /// Spawn the background loop: a periodic pass plus a pass on every
    /// offline→online transition. The task ends when the network monitor
    /// is dropped.
    pub fn run(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let mut subscription = self.network.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; that doubles as the
            // catch-up pass after startup.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.reconcile().await;
                    }
                    state = subscription.rx.recv() => match state {
                        Some(state) if state.online => {
                            tracing::info!("connectivity restored, reconciling");
                            self.reconcile().await;
                        }
                        Some(_) => {}
                        None => break,
                    },
                }
            }
        })
    }
}
