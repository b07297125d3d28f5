//! Metadata Cache
//!
//! Memoizes directory scan results behind a single lock. Staleness is
//! decided by a cheap fingerprint (max mtime of the last successful scan)
//! and a debounce window bounds scan frequency under request bursts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use bridge_traits::Clock;

use crate::models::ImageRecord;
use crate::scanner::scan_folder;

/// Cached scan state. Owned exclusively by [`ImageCache`]; mutated only
/// under its lock.
#[derive(Debug, Default)]
struct CacheState {
    /// Records sorted by mtime descending
    items: Vec<ImageRecord>,
    /// Millis timestamp of the last scan attempt, `None` before the first
    last_scan: Option<i64>,
    /// Max mtime of the last adopted scan (0 = empty/missing folder)
    fingerprint: i64,
}

/// Debounced, fingerprint-invalidated cache over the gallery folder.
///
/// Callers never observe a partial scan: replacement happens atomically
/// while the lock is held. Two concurrent stale reads may both scan, but
/// their writes serialize and converge.
pub struct ImageCache {
    folder: PathBuf,
    allowed_exts: Vec<String>,
    debounce: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState>,
}

impl ImageCache {
    pub fn new(
        folder: PathBuf,
        allowed_exts: Vec<String>,
        debounce: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            folder,
            allowed_exts,
            debounce,
            clock,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Current image set, newest first.
    ///
    /// Re-scans the folder unless a scan already ran inside the debounce
    /// window. With `force`, the debounce is bypassed and the scan result
    /// is adopted even when the fingerprint is unchanged.
    pub async fn get_images(&self, force: bool) -> Vec<ImageRecord> {
        let mut state = self.state.lock().await;
        let now = self.clock.unix_timestamp_millis();

        if !force {
            if let Some(last_scan) = state.last_scan {
                if now.saturating_sub(last_scan) < self.debounce.as_millis() as i64 {
                    return state.items.clone();
                }
            }
        }

        let (items, fingerprint) = scan_folder(&self.folder, &self.allowed_exts).await;

        // An unchanged fingerprint means the directory still holds the set
        // we already adopted; the previous items stay.
        if force || fingerprint != state.fingerprint {
            debug!(
                old_fingerprint = state.fingerprint,
                new_fingerprint = fingerprint,
                count = items.len(),
                "Adopting fresh scan"
            );
            state.items = items;
            state.fingerprint = fingerprint;
        }
        state.last_scan = Some(now);

        state.items.clone()
    }
}
