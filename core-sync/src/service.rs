//! Reconciliation Service
//!
//! The owning facade over the reconciliation core: one constructed
//! instance holds the cache, the reconciler, and the scheduler, and is
//! passed by handle to request handlers. The web layer calls only this
//! surface.

use std::path::PathBuf;
use std::sync::Arc;
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument, warn};

use bridge_traits::AccessTokenSource;
use core_gallery::{resolve_destination, GalleryError, ImageCache, ImageRecord};
use core_runtime::GalleryConfig;

use crate::reconciler::{write_atomic, Reconciler};
use crate::scheduler::{SyncOutcome, SyncScheduler};

/// Per-file result of an upload ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Bytes stored locally; `filename` is the final (possibly suffixed)
    /// name.
    Stored { filename: String },
    /// Exact duplicate of an existing file; bytes were discarded.
    Duplicate,
    /// Ingestion failed; the uploader should be told.
    Failed { reason: String },
}

/// Advisory status snapshot for the sync-status surface.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryStatus {
    /// Whether a credential is currently obtainable for the remote store
    pub connected: bool,
    /// Number of images in the local gallery
    pub local_count: usize,
    /// Seconds since the last reconciliation attempt, if any
    pub seconds_since_last_sync: Option<u64>,
    /// Whether a non-forced sync would run right now
    pub can_sync_now: bool,
}

/// Owning handle over cache, reconciler, and scheduler.
///
/// Constructed once from a validated [`GalleryConfig`] and shared across
/// request handlers; all interior state is behind its own locks.
pub struct ReconciliationService {
    cache: Arc<ImageCache>,
    reconciler: Reconciler,
    scheduler: SyncScheduler,
    tokens: Arc<dyn AccessTokenSource>,
    image_folder: PathBuf,
    remote_root: String,
}

impl ReconciliationService {
    pub fn new(config: GalleryConfig) -> Self {
        let cache = Arc::new(ImageCache::new(
            config.image_folder.clone(),
            config.allowed_extensions.clone(),
            config.cache_debounce,
            config.clock.clone(),
        ));

        let reconciler = Reconciler::new(
            config.remote_store.clone(),
            config.token_source.clone(),
            cache.clone(),
            config.image_folder.clone(),
            config.allowed_extensions.clone(),
            config.remote_root.clone(),
            config.clock.clone(),
        );

        let scheduler = SyncScheduler::new(
            config.sync_cooldown,
            config.failure_cooldown,
            config.clock.clone(),
        );

        Self {
            cache,
            reconciler,
            scheduler,
            tokens: config.token_source,
            image_folder: config.image_folder,
            remote_root: config.remote_root,
        }
    }

    /// Ordered image set, newest first.
    pub async fn get_images(&self, force: bool) -> Vec<ImageRecord> {
        self.cache.get_images(force).await
    }

    /// Ingest one uploaded file: dedup, store locally, push to the remote
    /// store, then trigger a (cooldown-gated) sync.
    ///
    /// A failed remote push is advisory: the file is already safe in the
    /// local folder, which is the gallery's source of truth.
    #[instrument(skip(self, data), fields(filename = %filename, bytes = data.len()))]
    pub async fn ingest_upload(&self, filename: &str, data: Bytes) -> UploadOutcome {
        if let Err(e) = validate_filename(filename) {
            return UploadOutcome::Failed {
                reason: e.to_string(),
            };
        }

        let candidate = self.image_folder.join(filename);
        let dest = match resolve_destination(&candidate, data.len() as u64).await {
            Ok(Some(dest)) => dest,
            Ok(None) => {
                info!("Upload is an exact duplicate, discarding");
                return UploadOutcome::Duplicate;
            }
            Err(e) => {
                warn!(error = %e, "Upload destination resolution failed");
                return UploadOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if let Err(e) = self.store_local(&dest, &data).await {
            warn!(error = %e, "Failed to store upload locally");
            return UploadOutcome::Failed {
                reason: e.to_string(),
            };
        }

        let final_name = dest
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(filename)
            .to_string();

        // New local content; make it visible before any remote round-trip.
        self.cache.get_images(true).await;

        if let Err(e) = self.reconciler.upload_to_remote(&dest, &final_name).await {
            warn!(file = %final_name, error = %e, "Remote push failed, keeping local copy");
        }

        let outcome = self.sync(false).await;
        info!(file = %final_name, sync = ?outcome, "Upload ingested");

        UploadOutcome::Stored {
            filename: final_name,
        }
    }

    async fn store_local(&self, dest: &std::path::Path, data: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.image_folder).await?;
        write_atomic(dest, data).await
    }

    /// Run (or skip, when cooling down) a pull reconciliation.
    pub async fn sync(&self, force: bool) -> SyncOutcome {
        self.scheduler
            .maybe_sync(force, &self.reconciler, &self.remote_root)
            .await
    }

    /// Advisory status for the sync-status surface. Never fails; a broken
    /// credential layer simply reports `connected: false`.
    pub async fn status(&self) -> GalleryStatus {
        let connected = self.tokens.access_token().await.is_ok();
        let local_count = self.cache.get_images(false).await.len();

        GalleryStatus {
            connected,
            local_count,
            seconds_since_last_sync: self.scheduler.seconds_since_last_sync().await,
            can_sync_now: self.scheduler.can_sync_now().await,
        }
    }
}

/// Reject names that would escape the flat gallery folder.
fn validate_filename(filename: &str) -> Result<(), GalleryError> {
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\\')
    {
        return Err(GalleryError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename() {
        assert!(validate_filename("a.jpg").is_ok());
        assert!(validate_filename("my photo (1).png").is_ok());
        assert!(validate_filename("").is_err());
        assert!(validate_filename("..").is_err());
        assert!(validate_filename("../escape.jpg").is_err());
        assert!(validate_filename("dir/a.jpg").is_err());
        assert!(validate_filename("dir\\a.jpg").is_err());
    }
}
