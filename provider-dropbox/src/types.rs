//! Dropbox API response types
//!
//! Data structures for the Dropbox API v2 request and response payloads.

use serde::{Deserialize, Serialize};

/// `files/list_folder` request body
///
/// See: https://www.dropbox.com/developers/documentation/http/documentation#files-list_folder
#[derive(Debug, Clone, Serialize)]
pub struct ListFolderArgs {
    /// Folder path ("" = app-folder root)
    pub path: String,

    /// Whether to list sub-folders recursively
    pub recursive: bool,

    /// Maximum entries per page
    pub limit: u32,
}

/// `files/list_folder/continue` request body
#[derive(Debug, Clone, Serialize)]
pub struct ListFolderContinueArgs {
    pub cursor: String,
}

/// One entry in a folder listing, discriminated by the `.tag` field
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = ".tag")]
pub enum EntryMetadata {
    /// A regular file
    #[serde(rename = "file")]
    File(FileMetadata),

    /// A sub-folder
    #[serde(rename = "folder")]
    Folder(FolderMetadata),

    /// Deleted markers and anything future API versions add
    #[serde(other)]
    Other,
}

/// File metadata resource
///
/// See: https://www.dropbox.com/developers/documentation/http/documentation#FileMetadata
#[derive(Debug, Clone, Deserialize)]
pub struct FileMetadata {
    /// Base file name
    pub name: String,

    /// Lowercased full path; absent for unmounted entries
    pub path_lower: Option<String>,

    /// Display-cased full path
    pub path_display: Option<String>,

    /// Size in bytes
    pub size: Option<u64>,

    /// Server modification time (ISO 8601)
    pub server_modified: Option<String>,

    /// Dropbox content hash
    pub content_hash: Option<String>,
}

/// Folder metadata resource
#[derive(Debug, Clone, Deserialize)]
pub struct FolderMetadata {
    pub name: String,
    pub path_lower: Option<String>,
    pub path_display: Option<String>,
}

/// `files/list_folder` response body
#[derive(Debug, Deserialize)]
pub struct ListFolderResponse {
    /// Entries on this page
    pub entries: Vec<EntryMetadata>,

    /// Cursor for `files/list_folder/continue`
    pub cursor: String,

    /// Whether another page is available
    pub has_more: bool,
}

/// `Dropbox-API-Arg` header payload for `files/download`
#[derive(Debug, Clone, Serialize)]
pub struct DownloadArgs {
    pub path: String,
}

/// `Dropbox-API-Arg` header payload for `files/upload`
///
/// See: https://www.dropbox.com/developers/documentation/http/documentation#files-upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadArgs {
    pub path: String,

    /// `"add"` or `"overwrite"`
    pub mode: String,

    /// Server-side rename on conflict; the core does its own dedup
    pub autorename: bool,

    /// Suppress user notifications for sync traffic
    pub mute: bool,
}
