//! # Dropbox Provider
//!
//! Implements the `RemoteStore` trait for the Dropbox API v2.
//!
//! ## Overview
//!
//! This module provides:
//! - Cursor-paginated folder listing (`files/list_folder` + `/continue`)
//! - Whole-object download and overwrite-capable upload
//! - Rate limiting and exponential backoff
//! - Expired-token detection for single refresh-and-retry by the caller
//! - A reqwest-backed `HttpClient` for production wiring

pub mod connector;
pub mod error;
pub mod http;
pub mod types;

pub use connector::DropboxConnector;
pub use error::{DropboxError, Result};
pub use http::ReqwestHttpClient;
