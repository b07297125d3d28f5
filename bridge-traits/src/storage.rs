//! Remote Object-Store Abstraction
//!
//! Defines the contract the reconciliation core consumes from a cloud
//! storage backend: paginated folder listing, whole-object download, and
//! overwrite-capable upload. Credentials, paging tokens, and wire formats
//! are owned by the provider implementation.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// One entry from a remote folder listing.
///
/// The kind is decided once, at listing time; consumers never re-inspect
/// provider-specific tags. Entries are transient and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    /// A regular file object
    File {
        /// Base name, e.g. `sunset.jpg`
        name: String,
        /// Provider path usable with [`RemoteStore::download`]
        path: String,
        /// Object size in bytes, when the provider reports one
        size: Option<u64>,
    },
    /// A sub-folder
    Folder { name: String, path: String },
    /// Anything else the provider lists (deleted markers, shortcuts, ...)
    Other,
}

impl RemoteEntry {
    /// File name if this entry is a file.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            RemoteEntry::File { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, RemoteEntry::File { .. })
    }
}

/// Remote object-store operations consumed by the reconciliation core.
///
/// All operations are opaque, possibly-failing remote calls. Implementations
/// are responsible for authentication (signalling an expired credential via
/// [`BridgeError::AuthExpired`](crate::error::BridgeError::AuthExpired)),
/// request timeouts, and transient-error retry.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::RemoteStore;
///
/// async fn count_remote(store: &dyn RemoteStore) -> Result<usize> {
///     let mut total = 0;
///     let mut cursor = None;
///     loop {
///         let (entries, next) = store.list("", cursor).await?;
///         total += entries.len();
///         match next {
///             Some(c) => cursor = Some(c),
///             None => break,
///         }
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List one page of entries under `folder` (empty string = store root).
    ///
    /// Pass the returned cursor back in to fetch the next page; a `None`
    /// cursor in the result means the listing is exhausted.
    async fn list(
        &self,
        folder: &str,
        cursor: Option<String>,
    ) -> Result<(Vec<RemoteEntry>, Option<String>)>;

    /// Download an object's full contents.
    async fn download(&self, path: &str) -> Result<Bytes>;

    /// Upload bytes to `path`, replacing any existing object when
    /// `overwrite` is set.
    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> Result<()>;
}
