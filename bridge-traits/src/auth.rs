//! Credential Capability
//!
//! The core treats authentication as an opaque capability: something that
//! either yields a working access token or fails. OAuth flows, refresh
//! tokens, and secure persistence live entirely behind this trait.

use async_trait::async_trait;

use crate::error::Result;

/// Source of access tokens for the remote store.
///
/// Implementations own the refresh protocol. The core calls
/// [`refresh`](AccessTokenSource::refresh) at most once per operation, after
/// the store signals an expired credential; it never loops on refresh.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::auth::AccessTokenSource;
///
/// async fn authorize(tokens: &dyn AccessTokenSource) -> Result<String> {
///     tokens.access_token().await
/// }
/// ```
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    /// Get a token believed to be currently valid.
    async fn access_token(&self) -> Result<String>;

    /// Force a refresh and return the new token.
    ///
    /// Called after the remote store rejects the previous token; returning
    /// an error means the sync attempt fails with an auth outcome.
    async fn refresh(&self) -> Result<String>;
}

/// Fixed-token source for tests and short-lived tooling.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    async fn refresh(&self) -> Result<String> {
        // A static token cannot be refreshed; hand back the same value and
        // let the remote store reject it again if it is truly dead.
        Ok(self.token.clone())
    }
}
