//! Recording lifecycle controller.
//!
//! Orchestrates capture → local commit → optional background upload. The
//! local commit is the durability boundary: `commit_recording` returns an
//! id only after the recording is persisted locally, independent of network
//! state. Upload is fire-and-forget; its failures never reach the caller.

use crate::auth::AuthProvider;
use crate::local::LocalRecordingStore;
use crate::network::NetworkMonitor;
use crate::reconciler::SyncReconciler;
use crate::storage::AudioAssets;
use async_trait::async_trait;
use chrono::Utc;
use encore_core::{CaptureMachine, CaptureState, Recording, RecordingId, RecordingMeta, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// The audio capture device boundary.
///
/// The platform shell injects its driver; the controller only needs the
/// start/stop/cancel primitives, with `stop` yielding the ephemeral handle
/// of the finished take.
#[async_trait]
pub trait AudioDevice: Send + Sync {
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<PathBuf>;
    async fn cancel(&self) -> Result<()>;
}

/// Owns the capture state machine and the commit path.
pub struct RecordingController {
    device: Arc<dyn AudioDevice>,
    local: Arc<LocalRecordingStore>,
    reconciler: Arc<SyncReconciler>,
    network: Arc<NetworkMonitor>,
    auth: Arc<dyn AuthProvider>,
    assets: AudioAssets,
    machine: Mutex<CaptureMachine>,
}

impl RecordingController {
    pub fn new(
        device: Arc<dyn AudioDevice>,
        local: Arc<LocalRecordingStore>,
        reconciler: Arc<SyncReconciler>,
        network: Arc<NetworkMonitor>,
        auth: Arc<dyn AuthProvider>,
        assets: AudioAssets,
    ) -> Self {
        Self {
            device,
            local,
            reconciler,
            network,
            auth,
            assets,
            machine: Mutex::new(CaptureMachine::new()),
        }
    }

    /// Current capture state.
    pub async fn capture_state(&self) -> CaptureState {
        self.machine.lock().await.state()
    }

    /// Begin a capture. If one is already active this is a no-op that
    /// returns the existing state.
    pub async fn start_capture(&self) -> Result<CaptureState> {
        let mut machine = self.machine.lock().await;
        if machine.state() != CaptureState::Idle {
            return Ok(machine.state());
        }
        self.device.start().await?;
        Ok(machine.start())
    }

    /// Stop the active capture and finalize its audio to a durable
    /// location, falling back (move → copy → original handle) so the take
    /// is never silently discarded. Fails with `NoActiveRecording` when
    /// idle.
    pub async fn stop_capture(&self) -> Result<PathBuf> {
        let mut machine = self.machine.lock().await;
        machine.begin_stop()?;

        let ephemeral = match self.device.stop().await {
            Ok(path) => path,
            Err(e) => {
                // The device kept or lost the asset; either way the
                // machine must return to idle.
                let _ = machine.finish();
                return Err(e);
            }
        };

        let final_path = self.assets.finalize(&ephemeral).await;
        machine.finish()?;
        Ok(final_path)
    }

    /// Discard the in-progress capture. Valid only while recording or
    /// stopping.
    pub async fn cancel_capture(&self) -> Result<()> {
        let mut machine = self.machine.lock().await;
        machine.cancel()?;
        if let Err(e) = self.device.cancel().await {
            tracing::warn!(error = %e, "device cancel failed after state reset");
        }
        Ok(())
    }

    /// Commit a finished capture.
    ///
    /// Synchronously persists the recording locally — this must succeed or
    /// the whole operation fails — then returns the new id. If the device
    /// is online and a user is signed in, a best-effort background upload
    /// is scheduled; its failure is logged and left for the reconciler.
    pub async fn commit_recording(
        &self,
        raw_audio: &Path,
        meta: RecordingMeta,
    ) -> Result<RecordingId> {
        let created_at = Utc::now().timestamp_millis() as u64;
        let id = generate_recording_id(created_at);

        let recording = Recording::new(
            id.clone(),
            raw_audio.display().to_string(),
            created_at,
            meta,
        );
        self.local.save(recording).await?;
        tracing::info!(recording = %id, "recording committed locally");

        if self.network.is_online() && self.auth.user_id().is_some() {
            let reconciler = self.reconciler.clone();
            let upload_id = id.clone();
            tokio::spawn(async move {
                if let Err(e) = reconciler.upload_and_mark(&upload_id).await {
                    tracing::warn!(
                        recording = %upload_id,
                        error = %e,
                        "background upload failed, left for reconciliation"
                    );
                }
            });
        }

        Ok(id)
    }
}

/// Locally generated, collision-resistant id: commit timestamp plus a
/// random suffix.
fn generate_recording_id(created_at_ms: u64) -> RecordingId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("rec-{created_at_ms}-{}", &suffix[..8])
}
