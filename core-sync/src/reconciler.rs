//! Remote Reconciler
//!
//! Diffs the remote folder listing against the live local directory and
//! copies missing items: downloads on the pull path, uploads on the push
//! path. Per-file failures are aggregated into a [`SyncReport`] instead of
//! aborting the pass; only listing or authentication failures fail a pull
//! outright.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{AccessTokenSource, Clock, RemoteEntry, RemoteStore};
use core_gallery::scanner::extension_suffix;
use core_gallery::ImageCache;

use crate::error::{Result, SyncError};

/// Summary of one pull pass; partial failure is a normal, inspectable
/// outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files newly downloaded into the local folder
    pub downloaded: usize,
    /// Remote files already present locally (or not eligible)
    pub skipped: usize,
    /// Eligible files whose download or write failed
    pub failed: usize,
}

impl SyncReport {
    /// Human-readable summary for advisory status surfaces.
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Downloaded {} new image{}",
            self.downloaded,
            if self.downloaded == 1 { "" } else { "s" }
        );
        if self.skipped > 0 {
            msg.push_str(&format!(" ({} already present)", self.skipped));
        }
        if self.failed > 0 {
            msg.push_str(&format!(", {} failed", self.failed));
        }
        msg
    }
}

/// Pulls missing remote images into the local folder and pushes new
/// uploads out to the remote store.
pub struct Reconciler {
    store: Arc<dyn RemoteStore>,
    tokens: Arc<dyn AccessTokenSource>,
    cache: Arc<ImageCache>,
    image_folder: PathBuf,
    allowed_exts: Vec<String>,
    remote_root: String,
    clock: Arc<dyn Clock>,
}

impl Reconciler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn RemoteStore>,
        tokens: Arc<dyn AccessTokenSource>,
        cache: Arc<ImageCache>,
        image_folder: PathBuf,
        allowed_exts: Vec<String>,
        remote_root: String,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            tokens,
            cache,
            image_folder,
            allowed_exts,
            remote_root,
            clock,
        }
    }

    /// Remote path for a file name under the configured root.
    fn remote_path(&self, filename: &str) -> String {
        let root = self.remote_root.trim_end_matches('/');
        if root.is_empty() {
            format!("/{}", filename)
        } else {
            format!("{}/{}", root, filename)
        }
    }

    /// Run a remote call, refreshing the credential and retrying exactly
    /// once when the store signals an expired token.
    async fn with_token_refresh<T, F, Fut>(&self, op: F) -> BridgeResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = BridgeResult<T>>,
    {
        match op().await {
            Err(e) if e.is_auth_expired() => {
                info!("Credential rejected, refreshing and retrying once");
                self.tokens.refresh().await?;
                op().await
            }
            other => other,
        }
    }

    /// Full remote listing for `folder`, following pagination to
    /// exhaustion.
    async fn list_all(&self, folder: &str) -> Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page_cursor = cursor.clone();
            let (page, next) = self
                .with_token_refresh(|| self.store.list(folder, page_cursor.clone()))
                .await?;
            entries.extend(page);
            match next {
                Some(next_cursor) => cursor = Some(next_cursor),
                None => break,
            }
        }

        Ok(entries)
    }

    /// Filenames currently present in the live directory.
    ///
    /// Deliberately re-reads the filesystem instead of consulting the
    /// cache, so a stale cache cannot cause a redundant download.
    async fn local_filenames(&self) -> HashSet<String> {
        let mut names = HashSet::new();
        let mut read_dir = match fs::read_dir(&self.image_folder).await {
            Ok(rd) => rd,
            Err(_) => return names,
        };
        while let Ok(Some(entry)) = read_dir.next_entry().await {
            if let Ok(name) = entry.file_name().into_string() {
                names.insert(name);
            }
        }
        names
    }

    fn is_allowed(&self, name: &str) -> bool {
        extension_suffix(name)
            .map(|ext| self.allowed_exts.iter().any(|a| *a == ext))
            .unwrap_or(false)
    }

    /// Pull missing remote images into the local folder.
    ///
    /// Lists `folder` (empty string = store root) to exhaustion, downloads
    /// every allowed file not already present locally, writes it atomically
    /// and stamps its mtime with "now" so arrival order sorts new images to
    /// the front. Per-file failures are skipped and counted. When anything
    /// was downloaded the cache is force-refreshed.
    ///
    /// # Errors
    ///
    /// Fails only when the remote listing itself fails (after one
    /// credential refresh for an expired token).
    #[instrument(skip(self), fields(folder = %folder))]
    pub async fn sync_from_remote(&self, folder: &str) -> Result<SyncReport> {
        let entries = self.list_all(folder).await?;
        let local = self.local_filenames().await;

        let mut report = SyncReport::default();
        let mut claimed: HashSet<String> = HashSet::new();

        for entry in entries {
            let (name, path) = match &entry {
                RemoteEntry::File { name, path, .. } => (name.clone(), path.clone()),
                _ => continue,
            };

            if !self.is_allowed(&name) {
                continue;
            }
            if local.contains(&name) || !claimed.insert(name.clone()) {
                report.skipped += 1;
                continue;
            }

            match self.download_one(&name, &path).await {
                Ok(()) => report.downloaded += 1,
                Err(e) => {
                    warn!(file = %name, error = %e, "Download failed, skipping");
                    report.failed += 1;
                }
            }
        }

        if report.downloaded > 0 {
            self.cache.get_images(true).await;
        }

        info!(
            downloaded = report.downloaded,
            skipped = report.skipped,
            failed = report.failed,
            "Pull reconciliation finished"
        );

        Ok(report)
    }

    async fn download_one(&self, name: &str, remote_path: &str) -> Result<()> {
        let data = self
            .with_token_refresh(|| self.store.download(remote_path))
            .await?;

        fs::create_dir_all(&self.image_folder).await?;
        let dest = self.image_folder.join(name);
        write_atomic(&dest, &data).await?;

        // Relative recency reflects discovery time, not the remote
        // object's original timestamp; new arrivals sort to the front.
        set_mtime_millis(&dest, self.clock.unix_timestamp_millis())?;

        debug!(file = %name, bytes = data.len(), "Downloaded remote image");
        Ok(())
    }

    /// Push a locally stored file to the remote store, overwriting any
    /// object with the same name.
    ///
    /// # Errors
    ///
    /// [`SyncError::AuthenticationFailed`] when the credential stays
    /// rejected after one refresh; [`SyncError::Provider`] otherwise.
    #[instrument(skip(self), fields(file = %filename))]
    pub async fn upload_to_remote(&self, local_path: &Path, filename: &str) -> Result<()> {
        let data = Bytes::from(fs::read(local_path).await?);
        let remote_path = self.remote_path(filename);

        self.with_token_refresh(|| self.store.upload(&remote_path, data.clone(), true))
            .await
            .map_err(SyncError::from)?;

        info!(remote_path = %remote_path, "Uploaded image to remote store");
        Ok(())
    }
}

/// Sequence for unique temp-file names; shared-name staging would let
/// concurrent writers clobber each other's bytes.
static WRITE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write `data` to `path` via a temp file and rename, so readers never
/// observe a partially written image.
///
/// The temp name appends to the full file name (`a.jpg` stages through
/// `a.jpg.<seq>.part`, never colliding with `a.png`), and the sequence
/// number keeps two writers racing on the same destination on separate
/// temp files.
pub(crate) async fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let seq = WRITE_SEQ.fetch_add(1, Ordering::Relaxed);
    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(format!(".{}.part", seq));
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

/// Stamp a file's modification time from a millis-since-epoch value.
pub(crate) fn set_mtime_millis(path: &Path, millis: i64) -> std::io::Result<()> {
    let mtime = std::time::UNIX_EPOCH + std::time::Duration::from_millis(millis.max(0) as u64);
    let file = std::fs::OpenOptions::new().write(true).open(path)?;
    file.set_modified(mtime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_message() {
        let report = SyncReport {
            downloaded: 1,
            skipped: 0,
            failed: 0,
        };
        assert_eq!(report.message(), "Downloaded 1 new image");

        let report = SyncReport {
            downloaded: 3,
            skipped: 2,
            failed: 1,
        };
        assert_eq!(
            report.message(),
            "Downloaded 3 new images (2 already present), 1 failed"
        );
    }

    fn part_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .filter(|name| name.ends_with(".part"))
            .collect()
    }

    #[tokio::test]
    async fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");

        write_atomic(&path, b"one").await.unwrap();
        write_atomic(&path, b"two").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"two");
        assert!(part_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_writers_with_shared_stem_stay_separate() {
        let dir = tempfile::tempdir().unwrap();
        let jpg = dir.path().join("a.jpg");
        let png = dir.path().join("a.png");

        // An upload and a sync download may stage files with the same stem
        // at the same time; each must land its own bytes.
        let (jpg_res, png_res) = tokio::join!(
            write_atomic(&jpg, b"JPG-BYTES"),
            write_atomic(&png, b"PNG-BYTES"),
        );
        jpg_res.unwrap();
        png_res.unwrap();

        assert_eq!(std::fs::read(&jpg).unwrap(), b"JPG-BYTES");
        assert_eq!(std::fs::read(&png).unwrap(), b"PNG-BYTES");
        assert!(part_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_racing_writers_on_same_destination_both_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");

        let (first, second) = tokio::join!(
            write_atomic(&path, b"first"),
            write_atomic(&path, b"second"),
        );
        first.unwrap();
        second.unwrap();

        let content = std::fs::read(&path).unwrap();
        assert!(content == b"first" || content == b"second");
        assert!(part_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_set_mtime_millis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jpg");
        write_atomic(&path, b"img").await.unwrap();

        set_mtime_millis(&path, 1_700_000_000_000).unwrap();

        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        let millis = modified
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;
        assert_eq!(millis, 1_700_000_000_000);
    }
}
