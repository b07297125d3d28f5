//! Directory Scanner
//!
//! Enumerates image files in the gallery folder and produces ordered
//! metadata. Scanning is read-only and never fails: a missing folder, a
//! permission error, or a file deleted mid-scan all degrade to a smaller
//! (possibly empty) result.

use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use crate::models::ImageRecord;

/// Lowercased extension suffix of `filename`, including the dot.
pub fn extension_suffix(filename: &str) -> Option<String> {
    filename
        .rfind('.')
        .map(|idx| filename[idx..].to_lowercase())
}

fn is_allowed(filename: &str, allowed_exts: &[String]) -> bool {
    extension_suffix(filename)
        .map(|ext| allowed_exts.iter().any(|a| *a == ext))
        .unwrap_or(false)
}

fn millis_since_epoch(time: std::time::SystemTime) -> i64 {
    time.duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Scan `folder` for files whose lowercased suffix is in `allowed_exts`.
///
/// Returns the records sorted by modification time descending (newest
/// first; ties keep directory order) together with the fingerprint: the
/// maximum mtime across all scanned files, `0` when the folder is empty or
/// missing.
pub async fn scan_folder(folder: &Path, allowed_exts: &[String]) -> (Vec<ImageRecord>, i64) {
    let mut read_dir = match fs::read_dir(folder).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(folder = %folder.display(), "Image folder does not exist");
            return (Vec::new(), 0);
        }
        Err(e) => {
            warn!(folder = %folder.display(), error = %e, "Failed to enumerate image folder");
            return (Vec::new(), 0);
        }
    };

    let mut items = Vec::new();

    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!(folder = %folder.display(), error = %e, "Directory enumeration aborted");
                break;
            }
        };

        let filename = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => {
                debug!("Skipping non-UTF-8 entry name");
                continue;
            }
        };

        if !is_allowed(&filename, allowed_exts) {
            continue;
        }

        // A file deleted between listing and stat is skipped, not an error.
        let metadata = match entry.metadata().await {
            Ok(md) => md,
            Err(e) => {
                debug!(file = %filename, error = %e, "Skipping entry with unreadable metadata");
                continue;
            }
        };

        if !metadata.is_file() {
            continue;
        }

        let mtime = metadata
            .modified()
            .map(millis_since_epoch)
            .unwrap_or(0);

        items.push(ImageRecord::new(filename, entry.path(), mtime));
    }

    let fingerprint = items.iter().map(|r| r.mtime).max().unwrap_or(0);

    // Stable sort: ties keep their enumeration order within one scan.
    items.sort_by(|a, b| b.mtime.cmp(&a.mtime));

    debug!(
        folder = %folder.display(),
        count = items.len(),
        fingerprint,
        "Scanned image folder"
    );

    (items, fingerprint)
}
