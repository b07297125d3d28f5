//! Upload Deduplicator
//!
//! Decides whether incoming bytes are an exact duplicate of an existing
//! file, a new version that needs a suffixed name, or a fresh upload.
//! Size equality at the same name is the duplicate criterion; it keeps
//! repeated uploads of the same photo from accumulating copies while still
//! admitting genuinely different files that share a name.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::{GalleryError, Result};

/// Upper bound on suffix probing before the upload is rejected outright.
pub const MAX_SUFFIX_ATTEMPTS: usize = 100;

/// Candidate path with a `" (n)"` suffix inserted before the extension.
fn suffixed(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{} ({}).{}", stem, n, ext),
        None => format!("{} ({})", stem, n),
    };
    path.with_file_name(name)
}

/// Existence/size probe outcome for one candidate path.
enum Probe {
    Free,
    SameSize,
    DifferentSize,
}

async fn probe(path: &Path, incoming_size: u64) -> Result<Probe> {
    match fs::metadata(path).await {
        Ok(md) if md.len() == incoming_size => Ok(Probe::SameSize),
        Ok(_) => Ok(Probe::DifferentSize),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Probe::Free),
        Err(e) => Err(GalleryError::Io(e)),
    }
}

/// Resolve the final on-disk destination for an incoming upload.
///
/// Returns `Ok(None)` when the incoming bytes are an exact duplicate
/// (same name, same size, at the original name or at any probed suffix)
/// and the caller must discard them. Returns the first free path
/// otherwise: the candidate itself, or `"name (1).ext"`, `"name (2).ext"`,
/// ... up to [`MAX_SUFFIX_ATTEMPTS`].
///
/// # Errors
///
/// [`GalleryError::DedupExhausted`] when every probed name is taken by a
/// different-sized file; this is an explicit failure, not a silent drop.
pub async fn resolve_destination(
    candidate: &Path,
    incoming_size: u64,
) -> Result<Option<PathBuf>> {
    match probe(candidate, incoming_size).await? {
        Probe::Free => return Ok(Some(candidate.to_path_buf())),
        Probe::SameSize => {
            debug!(path = %candidate.display(), "Exact duplicate, discarding");
            return Ok(None);
        }
        Probe::DifferentSize => {}
    }

    for n in 1..=MAX_SUFFIX_ATTEMPTS {
        let variant = suffixed(candidate, n);
        match probe(&variant, incoming_size).await? {
            Probe::Free => return Ok(Some(variant)),
            Probe::SameSize => {
                debug!(path = %variant.display(), "Duplicate at suffixed name, discarding");
                return Ok(None);
            }
            Probe::DifferentSize => continue,
        }
    }

    Err(GalleryError::DedupExhausted {
        filename: candidate
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unknown>")
            .to_string(),
        attempts: MAX_SUFFIX_ATTEMPTS,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_bytes(path: &Path, len: usize) {
        let mut f = File::create(path).unwrap();
        f.write_all(&vec![0u8; len]).unwrap();
    }

    #[tokio::test]
    async fn test_accepts_nonexistent_path_as_is() {
        let dir = tempdir().unwrap();
        let candidate = dir.path().join("new.jpg");

        let dest = resolve_destination(&candidate, 10).await.unwrap();
        assert_eq!(dest, Some(candidate));
    }

    #[tokio::test]
    async fn test_same_size_is_duplicate() {
        let dir = tempdir().unwrap();
        let candidate = dir.path().join("photo.jpg");
        write_bytes(&candidate, 10);

        let dest = resolve_destination(&candidate, 10).await.unwrap();
        assert_eq!(dest, None);
    }

    #[tokio::test]
    async fn test_different_size_gets_first_suffix() {
        let dir = tempdir().unwrap();
        let candidate = dir.path().join("photo.jpg");
        write_bytes(&candidate, 10);

        let dest = resolve_destination(&candidate, 20).await.unwrap();
        assert_eq!(dest, Some(dir.path().join("photo (1).jpg")));
    }

    #[tokio::test]
    async fn test_same_size_at_suffix_is_duplicate() {
        let dir = tempdir().unwrap();
        write_bytes(&dir.path().join("photo.jpg"), 10);
        write_bytes(&dir.path().join("photo (1).jpg"), 20);

        // Size 20 matches the first suffixed variant: duplicate.
        let dest = resolve_destination(&dir.path().join("photo.jpg"), 20)
            .await
            .unwrap();
        assert_eq!(dest, None);
    }

    #[tokio::test]
    async fn test_skips_occupied_suffixes() {
        let dir = tempdir().unwrap();
        write_bytes(&dir.path().join("photo.jpg"), 10);
        write_bytes(&dir.path().join("photo (1).jpg"), 11);
        write_bytes(&dir.path().join("photo (2).jpg"), 12);

        let dest = resolve_destination(&dir.path().join("photo.jpg"), 20)
            .await
            .unwrap();
        assert_eq!(dest, Some(dir.path().join("photo (3).jpg")));
    }

    #[tokio::test]
    async fn test_idempotent_without_writes() {
        let dir = tempdir().unwrap();
        write_bytes(&dir.path().join("photo.jpg"), 10);

        let first = resolve_destination(&dir.path().join("photo.jpg"), 20)
            .await
            .unwrap();
        let second = resolve_destination(&dir.path().join("photo.jpg"), 20)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_exhaustion_is_an_error() {
        let dir = tempdir().unwrap();
        write_bytes(&dir.path().join("p.jpg"), 1);
        for n in 1..=MAX_SUFFIX_ATTEMPTS {
            write_bytes(&dir.path().join(format!("p ({}).jpg", n)), 1 + n);
        }

        let result = resolve_destination(&dir.path().join("p.jpg"), 500).await;
        assert!(matches!(
            result,
            Err(GalleryError::DedupExhausted { attempts, .. }) if attempts == MAX_SUFFIX_ATTEMPTS
        ));
    }

    #[test]
    fn test_suffix_without_extension() {
        assert_eq!(
            suffixed(Path::new("/g/raw"), 2),
            PathBuf::from("/g/raw (2)")
        );
        assert_eq!(
            suffixed(Path::new("/g/a.jpg"), 1),
            PathBuf::from("/g/a (1).jpg")
        );
    }
}
