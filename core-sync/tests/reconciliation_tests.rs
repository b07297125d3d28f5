//! Integration tests for local/remote reconciliation
//!
//! These tests verify the complete reconciliation workflow including:
//! - Pull of remote-only images with arrival-time ordering
//! - Cooldown gating and the manual override
//! - Upload ingestion (dedup, suffixing, remote push)
//! - Per-file failure tolerance and credential refresh

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{AccessTokenSource, ManualClock, RemoteEntry, RemoteStore};
use bytes::Bytes;
use core_runtime::GalleryConfig;
use core_sync::{ReconciliationService, SyncOutcome, UploadOutcome};
use tempfile::tempdir;
use tokio::sync::Mutex as AsyncMutex;

// ============================================================================
// Mock Implementations
// ============================================================================

/// In-memory remote store with cursor pagination and failure injection.
struct MockRemoteStore {
    objects: AsyncMutex<BTreeMap<String, Bytes>>,
    uploads: AsyncMutex<Vec<String>>,
    fail_downloads: AsyncMutex<HashSet<String>>,
    list_calls: AtomicUsize,
    page_size: usize,
    auth_expired: Arc<AtomicBool>,
}

impl MockRemoteStore {
    fn new(page_size: usize) -> Self {
        Self {
            objects: AsyncMutex::new(BTreeMap::new()),
            uploads: AsyncMutex::new(Vec::new()),
            fail_downloads: AsyncMutex::new(HashSet::new()),
            list_calls: AtomicUsize::new(0),
            page_size,
            auth_expired: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn put(&self, name: &str, data: &[u8]) {
        self.objects
            .lock()
            .await
            .insert(name.to_string(), Bytes::copy_from_slice(data));
    }

    async fn fail_download_of(&self, name: &str) {
        self.fail_downloads.lock().await.insert(name.to_string());
    }

    fn listings(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn check_auth(&self) -> BridgeResult<()> {
        if self.auth_expired.load(Ordering::SeqCst) {
            Err(BridgeError::AuthExpired("token rejected".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn list(
        &self,
        _folder: &str,
        cursor: Option<String>,
    ) -> BridgeResult<(Vec<RemoteEntry>, Option<String>)> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_auth()?;

        let objects = self.objects.lock().await;
        let names: Vec<&String> = objects.keys().collect();
        let start: usize = cursor
            .as_deref()
            .map(|c| c.parse().expect("numeric cursor"))
            .unwrap_or(0);
        let end = (start + self.page_size).min(names.len());

        let mut entries: Vec<RemoteEntry> = names[start..end]
            .iter()
            .map(|name| RemoteEntry::File {
                name: (*name).clone(),
                path: format!("/{}", name),
                size: objects.get(*name).map(|b| b.len() as u64),
            })
            .collect();

        // First page also carries non-file noise the reconciler must skip.
        if start == 0 {
            entries.push(RemoteEntry::Folder {
                name: "albums".to_string(),
                path: "/albums".to_string(),
            });
            entries.push(RemoteEntry::Other);
        }

        let next = if end < names.len() {
            Some(end.to_string())
        } else {
            None
        };
        Ok((entries, next))
    }

    async fn download(&self, path: &str) -> BridgeResult<Bytes> {
        self.check_auth()?;
        let name = path.trim_start_matches('/');
        if self.fail_downloads.lock().await.contains(name) {
            return Err(BridgeError::OperationFailed(format!(
                "download of {} failed",
                name
            )));
        }
        self.objects
            .lock()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| BridgeError::OperationFailed(format!("no such object: {}", path)))
    }

    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> BridgeResult<()> {
        self.check_auth()?;
        assert!(overwrite, "gallery pushes always use overwrite semantics");
        let name = path.trim_start_matches('/').to_string();
        self.objects.lock().await.insert(name.clone(), data);
        self.uploads.lock().await.push(name);
        Ok(())
    }
}

/// Token source whose refresh un-expires the paired store.
struct MockTokens {
    auth_expired: Arc<AtomicBool>,
    refresh_calls: AtomicUsize,
    refresh_fixes: bool,
}

impl MockTokens {
    fn for_store(store: &MockRemoteStore, refresh_fixes: bool) -> Self {
        Self {
            auth_expired: store.auth_expired.clone(),
            refresh_calls: AtomicUsize::new(0),
            refresh_fixes,
        }
    }

    fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessTokenSource for MockTokens {
    async fn access_token(&self) -> BridgeResult<String> {
        Ok("token".to_string())
    }

    async fn refresh(&self) -> BridgeResult<String> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_fixes {
            self.auth_expired.store(false, Ordering::SeqCst);
        }
        Ok("fresh-token".to_string())
    }
}

// ============================================================================
// Harness
// ============================================================================

const NOW_MILLIS: i64 = 1_700_000_000_000;

struct Harness {
    service: ReconciliationService,
    store: Arc<MockRemoteStore>,
    tokens: Arc<MockTokens>,
    clock: Arc<ManualClock>,
    _dir: tempfile::TempDir,
    folder: std::path::PathBuf,
}

fn harness_with(store: MockRemoteStore, refresh_fixes: bool) -> Harness {
    let dir = tempdir().unwrap();
    let folder = dir.path().join("images");
    std::fs::create_dir_all(&folder).unwrap();

    let store = Arc::new(store);
    let tokens = Arc::new(MockTokens::for_store(&store, refresh_fixes));
    let clock = Arc::new(ManualClock::new(NOW_MILLIS));

    let config = GalleryConfig::builder()
        .image_folder(&folder)
        .sync_cooldown(Duration::from_secs(300))
        .failure_cooldown(Duration::from_secs(75))
        .cache_debounce(Duration::from_secs(1))
        .remote_store(store.clone())
        .token_source(tokens.clone())
        .clock(clock.clone())
        .build()
        .unwrap();

    Harness {
        service: ReconciliationService::new(config),
        store,
        tokens,
        clock,
        _dir: dir,
        folder,
    }
}

fn harness() -> Harness {
    harness_with(MockRemoteStore::new(100), false)
}

fn write_with_mtime(dir: &Path, name: &str, millis: u64) {
    let path = dir.join(name);
    let mut f = File::create(&path).unwrap();
    f.write_all(b"img").unwrap();
    f.set_modified(UNIX_EPOCH + Duration::from_millis(millis))
        .unwrap();
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn pull_downloads_missing_images_and_sorts_arrivals_first() {
    let h = harness();
    write_with_mtime(&h.folder, "a.jpg", 1_000);
    write_with_mtime(&h.folder, "b.png", 2_000);
    h.store.put("c.gif", b"remote bytes").await;
    h.store.put("b.png", b"already local").await;

    let before: Vec<String> = h
        .service
        .get_images(false)
        .await
        .iter()
        .map(|r| r.filename.clone())
        .collect();
    assert_eq!(before, vec!["b.png", "a.jpg"]);

    let outcome = h.service.sync(true).await;
    match outcome {
        SyncOutcome::Success { message } => {
            assert!(message.contains("Downloaded 1 new image"), "{}", message);
        }
        other => panic!("expected success, got {:?}", other),
    }

    let after: Vec<String> = h
        .service
        .get_images(true)
        .await
        .iter()
        .map(|r| r.filename.clone())
        .collect();
    assert_eq!(after, vec!["c.gif", "b.png", "a.jpg"]);

    // The pre-existing local copy was not re-downloaded.
    assert_eq!(std::fs::read(h.folder.join("b.png")).unwrap(), b"img");
}

#[tokio::test]
async fn pull_follows_pagination_to_exhaustion() {
    let h = harness_with(MockRemoteStore::new(1), false);
    h.store.put("one.jpg", b"1").await;
    h.store.put("two.png", b"22").await;
    h.store.put("three.gif", b"333").await;

    let outcome = h.service.sync(true).await;
    assert!(matches!(outcome, SyncOutcome::Success { .. }));

    // One listing call per page.
    assert_eq!(h.store.listings(), 3);

    let names: HashSet<String> = h
        .service
        .get_images(true)
        .await
        .iter()
        .map(|r| r.filename.clone())
        .collect();
    assert!(names.contains("one.jpg"));
    assert!(names.contains("two.png"));
    assert!(names.contains("three.gif"));
}

#[tokio::test]
async fn pull_skips_disallowed_and_failing_files() {
    let h = harness();
    h.store.put("good.jpg", b"ok").await;
    h.store.put("bad.webp", b"will fail").await;
    h.store.put("notes.txt", b"not an image").await;
    h.store.fail_download_of("bad.webp").await;

    let outcome = h.service.sync(true).await;
    match outcome {
        SyncOutcome::Success { message } => {
            assert!(message.contains("1 failed"), "{}", message);
        }
        other => panic!("expected success with failures, got {:?}", other),
    }

    assert!(h.folder.join("good.jpg").exists());
    assert!(!h.folder.join("bad.webp").exists());
    assert!(!h.folder.join("notes.txt").exists());
}

#[tokio::test]
async fn cooldown_allows_exactly_one_attempt() {
    let h = harness();

    assert!(matches!(
        h.service.sync(false).await,
        SyncOutcome::Success { .. }
    ));
    let after_first = h.store.listings();

    h.clock.advance(Duration::from_secs(10));
    match h.service.sync(false).await {
        SyncOutcome::Cooldown { remaining } => {
            assert!(remaining <= Duration::from_secs(290));
            assert!(remaining > Duration::from_secs(280));
        }
        other => panic!("expected cooldown, got {:?}", other),
    }
    assert_eq!(h.store.listings(), after_first);

    // Manual override ignores the window.
    assert!(matches!(
        h.service.sync(true).await,
        SyncOutcome::Success { .. }
    ));
    assert!(h.store.listings() > after_first);
}

#[tokio::test]
async fn cooldown_reopens_after_window() {
    let h = harness();

    h.service.sync(false).await;
    h.clock.advance(Duration::from_secs(301));

    assert!(matches!(
        h.service.sync(false).await,
        SyncOutcome::Success { .. }
    ));
}

#[tokio::test]
async fn expired_credential_is_refreshed_once_and_retried() {
    let store = MockRemoteStore::new(100);
    store.auth_expired.store(true, Ordering::SeqCst);
    let h = harness_with(store, true);
    h.store.put("pic.jpg", b"bytes").await;

    let outcome = h.service.sync(true).await;
    assert!(matches!(outcome, SyncOutcome::Success { .. }));
    assert_eq!(h.tokens.refreshes(), 1);
    assert!(h.folder.join("pic.jpg").exists());
}

#[tokio::test]
async fn persistent_auth_failure_reports_without_retry_storm() {
    let store = MockRemoteStore::new(100);
    store.auth_expired.store(true, Ordering::SeqCst);
    let h = harness_with(store, false);

    let outcome = h.service.sync(true).await;
    match outcome {
        SyncOutcome::Failure { reason } => {
            assert!(reason.contains("Authentication failed"), "{}", reason)
        }
        other => panic!("expected failure, got {:?}", other),
    }

    // One refresh, one retry, then give up: two listing calls total.
    assert_eq!(h.tokens.refreshes(), 1);
    assert_eq!(h.store.listings(), 2);

    // A failed attempt still arms the (shorter) cooldown.
    let status = h.service.status().await;
    assert_eq!(status.seconds_since_last_sync, Some(0));
    assert!(!status.can_sync_now);
}

#[tokio::test]
async fn duplicate_upload_is_discarded() {
    let h = harness();

    let first = h
        .service
        .ingest_upload("photo.jpg", Bytes::from_static(b"same bytes"))
        .await;
    assert_eq!(
        first,
        UploadOutcome::Stored {
            filename: "photo.jpg".to_string()
        }
    );

    let second = h
        .service
        .ingest_upload("photo.jpg", Bytes::from_static(b"same bytes"))
        .await;
    assert_eq!(second, UploadOutcome::Duplicate);

    let stored: Vec<_> = std::fs::read_dir(&h.folder)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    assert_eq!(stored, vec!["photo.jpg"]);

    // Exactly one remote push happened.
    assert_eq!(*h.store.uploads.lock().await, vec!["photo.jpg".to_string()]);
}

#[tokio::test]
async fn different_bytes_same_name_gets_suffixed() {
    let h = harness();

    h.service
        .ingest_upload("photo.jpg", Bytes::from_static(b"original"))
        .await;
    let second = h
        .service
        .ingest_upload("photo.jpg", Bytes::from_static(b"different length"))
        .await;

    assert_eq!(
        second,
        UploadOutcome::Stored {
            filename: "photo (1).jpg".to_string()
        }
    );
    assert!(h.folder.join("photo.jpg").exists());
    assert!(h.folder.join("photo (1).jpg").exists());

    // The suffixed copy was pushed under its final name.
    let uploads = h.store.uploads.lock().await;
    assert!(uploads.contains(&"photo (1).jpg".to_string()));
}

#[tokio::test]
async fn traversal_filenames_are_rejected() {
    let h = harness();

    let outcome = h
        .service
        .ingest_upload("../escape.jpg", Bytes::from_static(b"x"))
        .await;
    assert!(matches!(outcome, UploadOutcome::Failed { .. }));
    assert!(std::fs::read_dir(&h.folder).unwrap().next().is_none());
}

#[tokio::test]
async fn status_reflects_gallery_and_scheduler() {
    let h = harness();
    write_with_mtime(&h.folder, "a.jpg", 1_000);

    let status = h.service.status().await;
    assert!(status.connected);
    assert_eq!(status.local_count, 1);
    assert_eq!(status.seconds_since_last_sync, None);
    assert!(status.can_sync_now);

    h.service.sync(true).await;
    h.clock.advance(Duration::from_secs(42));

    let status = h.service.status().await;
    assert_eq!(status.seconds_since_last_sync, Some(42));
    assert!(!status.can_sync_now);
}
