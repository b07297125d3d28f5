//! Gallery data model

use serde::Serialize;
use std::path::PathBuf;

/// Immutable snapshot of one image file at scan time.
///
/// Uniquely identified by `filename` within the gallery folder. Records are
/// recreated on every scan and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    /// Base file name, e.g. `sunset.jpg`
    pub filename: String,

    /// URL the web layer serves this image under
    pub url: String,

    /// Absolute path on the local filesystem
    #[serde(skip)]
    pub path: PathBuf,

    /// Modification time in milliseconds since the Unix epoch
    pub mtime: i64,
}

impl ImageRecord {
    pub fn new(filename: impl Into<String>, path: PathBuf, mtime: i64) -> Self {
        let filename = filename.into();
        let url = format!("/images/{}", filename);
        Self {
            filename,
            url,
            path,
            mtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_derivation() {
        let record = ImageRecord::new("a.jpg", PathBuf::from("/data/a.jpg"), 42);
        assert_eq!(record.url, "/images/a.jpg");
        assert_eq!(record.filename, "a.jpg");
        assert_eq!(record.mtime, 42);
    }
}
