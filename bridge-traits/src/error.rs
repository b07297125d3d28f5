use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The remote store rejected the current credential. Callers may
    /// refresh through `AccessTokenSource` and retry once.
    #[error("Access credential expired or rejected: {0}")]
    AuthExpired(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the error indicates an expired credential that a single
    /// refresh-and-retry may resolve.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, BridgeError::AuthExpired(_))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
