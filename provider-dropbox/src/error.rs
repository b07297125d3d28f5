//! Error types for the Dropbox provider

use thiserror::Error;

/// Dropbox provider errors
#[derive(Error, Debug)]
pub enum DropboxError {
    /// The access token was rejected (HTTP 401)
    #[error("Access token rejected: {0}")]
    AuthExpired(String),

    /// API request returned an error
    #[error("Dropbox API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Failed to parse an API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Bridge error
    #[error(transparent)]
    BridgeError(#[from] bridge_traits::error::BridgeError),
}

/// Result type for Dropbox operations
pub type Result<T> = std::result::Result<T, DropboxError>;

impl From<DropboxError> for bridge_traits::error::BridgeError {
    fn from(error: DropboxError) -> Self {
        match error {
            DropboxError::AuthExpired(msg) => {
                bridge_traits::error::BridgeError::AuthExpired(msg)
            }
            DropboxError::ApiError {
                status_code,
                message,
            } => bridge_traits::error::BridgeError::OperationFailed(format!(
                "API error (status {}): {}",
                status_code, message
            )),
            DropboxError::ParseError(msg) => {
                bridge_traits::error::BridgeError::OperationFailed(format!(
                    "Parse error: {}",
                    msg
                ))
            }
            DropboxError::BridgeError(e) => e,
        }
    }
}
