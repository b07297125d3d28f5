//! Dropbox API connector implementation
//!
//! Implements the `RemoteStore` trait for the Dropbox API v2.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use bridge_traits::storage::{RemoteEntry, RemoteStore};
use bridge_traits::AccessTokenSource;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::DropboxError;
use crate::types::{
    DownloadArgs, EntryMetadata, ListFolderArgs, ListFolderContinueArgs, ListFolderResponse,
    UploadArgs,
};

/// Dropbox RPC endpoint base URL
const API_BASE: &str = "https://api.dropboxapi.com/2";

/// Dropbox content endpoint base URL (download/upload)
const CONTENT_BASE: &str = "https://content.dropboxapi.com/2";

/// Maximum results per listing page (Dropbox API limit)
const MAX_PAGE_SIZE: u32 = 2000;

/// Timeout for RPC calls
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for content transfers
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(60);

/// Dropbox API connector
///
/// Implements [`RemoteStore`] for the Dropbox API v2.
///
/// # Features
///
/// - Cursor-paginated folder listing (`files/list_folder` + `/continue`)
/// - Whole-object download and overwrite-capable upload via the
///   `Dropbox-API-Arg` header protocol
/// - Exponential backoff on rate limiting and server errors
/// - Expired credentials surfaced as `BridgeError::AuthExpired` so the
///   caller can refresh and retry once
///
/// # Example
///
/// ```ignore
/// use provider_dropbox::DropboxConnector;
/// use bridge_traits::storage::RemoteStore;
///
/// let connector = DropboxConnector::new(http_client, token_source);
/// let (entries, next_cursor) = connector.list("", None).await?;
/// ```
pub struct DropboxConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Credential capability; consulted per request so a refreshed token
    /// takes effect on the caller's retry
    tokens: Arc<dyn AccessTokenSource>,
}

impl DropboxConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, tokens: Arc<dyn AccessTokenSource>) -> Self {
        Self {
            http_client,
            tokens,
        }
    }

    /// Dropbox wants "" for the app-folder root and a leading slash
    /// everywhere else.
    fn normalize_folder(folder: &str) -> String {
        let trimmed = folder.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{}", trimmed)
        }
    }

    /// Convert a listing entry to the provider-neutral representation.
    fn convert_entry(entry: EntryMetadata) -> RemoteEntry {
        match entry {
            EntryMetadata::File(file) => {
                let path = file
                    .path_lower
                    .or(file.path_display)
                    .unwrap_or_else(|| format!("/{}", file.name));
                RemoteEntry::File {
                    name: file.name,
                    path,
                    size: file.size,
                }
            }
            EntryMetadata::Folder(folder) => {
                let path = folder
                    .path_lower
                    .or(folder.path_display)
                    .unwrap_or_else(|| format!("/{}", folder.name));
                RemoteEntry::Folder {
                    name: folder.name,
                    path,
                }
            }
            EntryMetadata::Other => RemoteEntry::Other,
        }
    }

    /// Execute an API request with backoff on 429/5xx.
    ///
    /// The bearer token is fetched per attempt so a refresh performed by
    /// the caller is picked up immediately. A 401 is never retried here;
    /// it is surfaced as [`DropboxError::AuthExpired`] for the caller's
    /// single refresh-and-retry.
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn execute_with_retry(
        &self,
        request: HttpRequest,
        max_retries: u32,
    ) -> std::result::Result<HttpResponse, DropboxError> {
        let mut attempt = 0;

        loop {
            let token = self.tokens.access_token().await?;
            let attempt_request = request.clone().bearer_token(token);

            match self.http_client.execute(attempt_request).await {
                Ok(response) => {
                    let status = response.status;

                    if response.is_success() {
                        debug!(status, "API request succeeded");
                        return Ok(response);
                    } else if status == 401 {
                        warn!("API request rejected: token expired");
                        return Err(DropboxError::AuthExpired(
                            String::from_utf8_lossy(&response.body).to_string(),
                        ));
                    } else if status == 429 || response.is_server_error() {
                        attempt += 1;
                        if attempt >= max_retries {
                            warn!(status, "API request failed after {} attempts", max_retries);
                            return Err(DropboxError::ApiError {
                                status_code: status,
                                message: format!("Request failed after {} retries", max_retries),
                            });
                        }

                        let backoff_ms = 100u64 * 2u64.pow(attempt);
                        warn!(
                            status,
                            attempt, max_retries, backoff_ms, "Retryable API failure"
                        );
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    } else {
                        warn!(status, "API request failed");
                        return Err(DropboxError::ApiError {
                            status_code: status,
                            message: String::from_utf8_lossy(&response.body).to_string(),
                        });
                    }
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        warn!(error = %e, "API request failed after {} attempts", max_retries);
                        return Err(e.into());
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(error = %e, attempt, max_retries, backoff_ms, "Transport failure, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl RemoteStore for DropboxConnector {
    #[instrument(skip(self), fields(folder = %folder, continuing = cursor.is_some()))]
    async fn list(
        &self,
        folder: &str,
        cursor: Option<String>,
    ) -> Result<(Vec<RemoteEntry>, Option<String>)> {
        let request = match cursor {
            Some(cursor) => HttpRequest::new(
                HttpMethod::Post,
                format!("{}/files/list_folder/continue", API_BASE),
            )
            .json(&ListFolderContinueArgs { cursor })?,
            None => HttpRequest::new(HttpMethod::Post, format!("{}/files/list_folder", API_BASE))
                .json(&ListFolderArgs {
                    path: Self::normalize_folder(folder),
                    recursive: false,
                    limit: MAX_PAGE_SIZE,
                })?,
        }
        .timeout(API_TIMEOUT);

        let response = self.execute_with_retry(request, 3).await?;

        let list: ListFolderResponse = serde_json::from_slice(&response.body).map_err(|e| {
            DropboxError::ParseError(format!("Failed to parse list_folder response: {}", e))
        })?;

        let entries: Vec<RemoteEntry> = list
            .entries
            .into_iter()
            .map(Self::convert_entry)
            .collect();

        info!(count = entries.len(), has_more = list.has_more, "Listed folder page");

        let next = if list.has_more {
            Some(list.cursor)
        } else {
            None
        };
        Ok((entries, next))
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn download(&self, path: &str) -> Result<Bytes> {
        let arg = serde_json::to_string(&DownloadArgs {
            path: path.to_string(),
        })
        .map_err(|e| DropboxError::ParseError(e.to_string()))?;

        let request = HttpRequest::new(
            HttpMethod::Post,
            format!("{}/files/download", CONTENT_BASE),
        )
        .header("Dropbox-API-Arg", arg)
        .timeout(TRANSFER_TIMEOUT);

        let response = self.execute_with_retry(request, 3).await?;
        info!(bytes = response.body.len(), "Downloaded object");
        Ok(response.body)
    }

    #[instrument(skip(self, data), fields(path = %path, bytes = data.len()))]
    async fn upload(&self, path: &str, data: Bytes, overwrite: bool) -> Result<()> {
        let arg = serde_json::to_string(&UploadArgs {
            path: path.to_string(),
            mode: if overwrite { "overwrite" } else { "add" }.to_string(),
            autorename: false,
            mute: true,
        })
        .map_err(|e| DropboxError::ParseError(e.to_string()))?;

        let request = HttpRequest::new(HttpMethod::Post, format!("{}/files/upload", CONTENT_BASE))
            .header("Dropbox-API-Arg", arg)
            .header("Content-Type", "application/octet-stream")
            .body(data)
            .timeout(TRANSFER_TIMEOUT);

        self.execute_with_retry(request, 3).await?;
        info!("Uploaded object");
        Ok(())
    }
}
