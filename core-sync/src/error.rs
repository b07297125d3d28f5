use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Gallery error: {0}")]
    Gallery(#[from] core_gallery::GalleryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BridgeError> for SyncError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::AuthExpired(msg) => SyncError::AuthenticationFailed(msg),
            other => SyncError::Provider(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
