//! Audio asset area.
//!
//! Owns the file-system directory where captured and downloaded audio
//! lives. Finalizing a capture must never silently discard data, so the
//! path is: move the ephemeral file in, fall back to a copy, and as a last
//! resort keep using the ephemeral handle directly.

use encore_core::{Error, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Handle to the audio file area, addressed by generated filenames.
#[derive(Debug, Clone)]
pub struct AudioAssets {
    dir: PathBuf,
}

impl AudioAssets {
    /// Open (creating if needed) the asset directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::StorageWriteFailed(e.to_string()))?;
        Ok(Self { dir })
    }

    /// The directory assets live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Move a finished ephemeral capture into the asset area.
    ///
    /// Fallback chain: rename, then copy, then keep the ephemeral handle.
    /// The returned path is wherever the audio durably is.
    pub async fn finalize(&self, ephemeral: &Path) -> PathBuf {
        let ext = ephemeral
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav");
        let dest = self.dir.join(format!("capture-{}.{ext}", Uuid::new_v4()));

        match tokio::fs::rename(ephemeral, &dest).await {
            Ok(()) => return dest,
            Err(e) => {
                tracing::debug!(error = %e, "rename into asset area failed, trying copy");
            }
        }

        match tokio::fs::copy(ephemeral, &dest).await {
            Ok(_) => {
                if let Err(e) = tokio::fs::remove_file(ephemeral).await {
                    tracing::debug!(error = %e, "could not remove ephemeral capture after copy");
                }
                dest
            }
            Err(e) => {
                // Last resort: the original handle still holds the audio.
                tracing::warn!(
                    error = %e,
                    path = %ephemeral.display(),
                    "could not finalize capture, keeping ephemeral handle"
                );
                ephemeral.to_path_buf()
            }
        }
    }

    /// Write downloaded bytes under a generated name, verifying the result
    /// is a non-empty file of the expected size.
    pub async fn import_bytes(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        if bytes.is_empty() {
            return Err(Error::StorageWriteFailed(format!(
                "refusing to import empty asset {name}"
            )));
        }

        let dest = self.dir.join(name);
        let tmp = self.dir.join(format!("{name}.part"));
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| Error::StorageWriteFailed(e.to_string()))?;

        let written = tokio::fs::metadata(&tmp)
            .await
            .map_err(|e| Error::StorageWriteFailed(e.to_string()))?
            .len();
        if written != bytes.len() as u64 {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Error::StorageWriteFailed(format!(
                "short write for asset {name}: {written} of {} bytes",
                bytes.len()
            )));
        }

        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| Error::StorageWriteFailed(e.to_string()))?;
        Ok(dest)
    }

    /// Release an asset file. Missing files are a no-op.
    pub async fn remove(&self, path: &Path) {
        if let Err(e) = tokio::fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "could not release audio asset");
            }
        }
    }
}
