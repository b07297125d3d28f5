use thiserror::Error;

#[derive(Error, Debug)]
pub enum GalleryError {
    /// The dedup suffix probe ran out of candidate names. Distinct from a
    /// silent duplicate: the caller must surface this to the uploader.
    #[error("No free destination for {filename} after {attempts} attempts")]
    DedupExhausted { filename: String, attempts: usize },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GalleryError>;
