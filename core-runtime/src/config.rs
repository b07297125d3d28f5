//! # Gallery Configuration Module
//!
//! Provides configuration management for the photo gallery core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `GalleryConfig` instance that holds all dependencies and settings for the
//! reconciliation core. It enforces fail-fast validation so a misassembled
//! deployment surfaces at startup, not on the first sync.
//!
//! ## Required Dependencies
//!
//! - `RemoteStore` - Remote object-store backend
//! - `AccessTokenSource` - Credential capability for the remote store
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Time source (default: `SystemClock`)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::GalleryConfig;
//! use std::sync::Arc;
//!
//! let config = GalleryConfig::builder()
//!     .image_folder("/var/lib/gallery/images")
//!     .remote_root("/photos")
//!     .sync_cooldown(std::time::Duration::from_secs(300))
//!     .remote_store(Arc::new(my_store))
//!     .token_source(Arc::new(my_tokens))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{AccessTokenSource, Clock, RemoteStore, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// File-extension suffixes served by the gallery, lowercased with dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp"];

/// Default minimum elapsed time between two reconciliation attempts.
pub const DEFAULT_SYNC_COOLDOWN: Duration = Duration::from_secs(300);

/// Default minimum elapsed time before the cache re-scans the directory.
pub const DEFAULT_CACHE_DEBOUNCE: Duration = Duration::from_secs(1);

/// Configuration for the photo gallery core.
///
/// Holds all dependencies and settings required to construct the
/// reconciliation service. Use [`GalleryConfigBuilder`] to build instances.
#[derive(Clone)]
pub struct GalleryConfig {
    /// Flat directory holding the locally stored images
    pub image_folder: PathBuf,

    /// Allowed file-extension suffixes, lowercased with leading dot
    pub allowed_extensions: Vec<String>,

    /// Remote sub-folder to reconcile against (empty = store root)
    pub remote_root: String,

    /// Minimum elapsed time between reconciliation attempts
    pub sync_cooldown: Duration,

    /// Cooldown applied after a failed reconciliation attempt
    pub failure_cooldown: Duration,

    /// Minimum elapsed time before the cache will re-scan the directory
    pub cache_debounce: Duration,

    /// Remote object-store backend (required)
    pub remote_store: Arc<dyn RemoteStore>,

    /// Credential capability for the remote store (required)
    pub token_source: Arc<dyn AccessTokenSource>,

    /// Time source (default: system clock)
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for GalleryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryConfig")
            .field("image_folder", &self.image_folder)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("remote_root", &self.remote_root)
            .field("sync_cooldown", &self.sync_cooldown)
            .field("failure_cooldown", &self.failure_cooldown)
            .field("cache_debounce", &self.cache_debounce)
            .field("remote_store", &"RemoteStore { ... }")
            .field("token_source", &"AccessTokenSource { ... }")
            .finish()
    }
}

impl GalleryConfig {
    /// Create a new builder.
    pub fn builder() -> GalleryConfigBuilder {
        GalleryConfigBuilder::default()
    }
}

/// Builder for [`GalleryConfig`] with fail-fast validation.
#[derive(Default)]
pub struct GalleryConfigBuilder {
    image_folder: Option<PathBuf>,
    allowed_extensions: Option<Vec<String>>,
    remote_root: Option<String>,
    sync_cooldown: Option<Duration>,
    failure_cooldown: Option<Duration>,
    cache_debounce: Option<Duration>,
    remote_store: Option<Arc<dyn RemoteStore>>,
    token_source: Option<Arc<dyn AccessTokenSource>>,
    clock: Option<Arc<dyn Clock>>,
}

impl GalleryConfigBuilder {
    /// Set the local image folder (required).
    pub fn image_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_folder = Some(path.into());
        self
    }

    /// Override the allowed extension suffixes.
    ///
    /// Suffixes are normalized to lowercase; a missing leading dot is added.
    pub fn allowed_extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let normalized = exts
            .into_iter()
            .map(|e| {
                let e = e.into().to_lowercase();
                if e.starts_with('.') {
                    e
                } else {
                    format!(".{}", e)
                }
            })
            .collect();
        self.allowed_extensions = Some(normalized);
        self
    }

    /// Set the remote sub-folder to reconcile against (empty = root).
    pub fn remote_root(mut self, root: impl Into<String>) -> Self {
        self.remote_root = Some(root.into());
        self
    }

    /// Set the minimum elapsed time between reconciliation attempts.
    pub fn sync_cooldown(mut self, cooldown: Duration) -> Self {
        self.sync_cooldown = Some(cooldown);
        self
    }

    /// Set the cooldown applied after a failed reconciliation attempt.
    ///
    /// Defaults to a quarter of the sync cooldown so real outages retry on
    /// a shorter leash than the success cadence.
    pub fn failure_cooldown(mut self, cooldown: Duration) -> Self {
        self.failure_cooldown = Some(cooldown);
        self
    }

    /// Set the cache re-scan debounce window.
    pub fn cache_debounce(mut self, debounce: Duration) -> Self {
        self.cache_debounce = Some(debounce);
        self
    }

    /// Inject the remote object-store backend (required).
    pub fn remote_store(mut self, store: Arc<dyn RemoteStore>) -> Self {
        self.remote_store = Some(store);
        self
    }

    /// Inject the credential capability (required).
    pub fn token_source(mut self, tokens: Arc<dyn AccessTokenSource>) -> Self {
        self.token_source = Some(tokens);
        self
    }

    /// Inject a custom time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the configuration, validating required capabilities.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the image folder is missing and
    /// `Error::CapabilityMissing` when a required bridge was not injected.
    pub fn build(self) -> Result<GalleryConfig> {
        let image_folder = self
            .image_folder
            .ok_or_else(|| Error::Config("image_folder is required".to_string()))?;

        let remote_store = self.remote_store.ok_or_else(|| Error::CapabilityMissing {
            capability: "RemoteStore".to_string(),
            message: "No remote store implementation provided. \
                      Inject a provider connector (e.g. provider-dropbox)."
                .to_string(),
        })?;

        let token_source = self.token_source.ok_or_else(|| Error::CapabilityMissing {
            capability: "AccessTokenSource".to_string(),
            message: "No credential source provided. \
                      Inject the deployment's token layer."
                .to_string(),
        })?;

        let sync_cooldown = self.sync_cooldown.unwrap_or(DEFAULT_SYNC_COOLDOWN);
        let failure_cooldown = self.failure_cooldown.unwrap_or(sync_cooldown / 4);

        let allowed_extensions = self.allowed_extensions.unwrap_or_else(|| {
            ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect()
        });

        if allowed_extensions.is_empty() {
            return Err(Error::Config(
                "allowed_extensions must not be empty".to_string(),
            ));
        }

        Ok(GalleryConfig {
            image_folder,
            allowed_extensions,
            remote_root: self.remote_root.unwrap_or_default(),
            sync_cooldown,
            failure_cooldown,
            cache_debounce: self.cache_debounce.unwrap_or(DEFAULT_CACHE_DEBOUNCE),
            remote_store,
            token_source,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}
