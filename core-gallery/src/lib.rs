//! # Gallery Module
//!
//! The local half of the image-set reconciliation core.
//!
//! ## Overview
//!
//! This crate owns everything that touches the gallery folder directly:
//! - **Scanner** (`scanner`): read-only enumeration of image files into
//!   ordered [`ImageRecord`] metadata
//! - **Cache** (`cache`): debounced, fingerprint-invalidated memoization of
//!   scan results behind a single lock
//! - **Deduplicator** (`dedup`): destination resolution for incoming
//!   uploads (duplicate / suffixed rename / accept)
//!
//! Remote reconciliation lives in `core-sync`; this crate never performs
//! network I/O.

pub mod cache;
pub mod dedup;
pub mod error;
pub mod models;
pub mod scanner;

pub use cache::ImageCache;
pub use dedup::{resolve_destination, MAX_SUFFIX_ATTEMPTS};
pub use error::{GalleryError, Result};
pub use models::ImageRecord;
pub use scanner::scan_folder;
