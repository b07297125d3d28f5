//! # Bridge Traits
//!
//! Capability traits the gallery core consumes but does not own.
//!
//! ## Overview
//!
//! This crate defines the contract between the reconciliation core and its
//! external collaborators. Each trait represents a capability the core
//! requires but that is implemented elsewhere: remote object storage,
//! HTTP transport, credential management, and time.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with retry and TLS
//! - [`RemoteStore`](storage::RemoteStore) - Paginated listing, download, and
//!   overwrite upload against a cloud folder
//! - [`AccessTokenSource`](auth::AccessTokenSource) - Opaque credential
//!   capability with single-shot refresh
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert backend-specific errors into it and signal rejected
//! credentials with `BridgeError::AuthExpired` so the core can perform its
//! one permitted refresh-and-retry.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod auth;
pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use auth::{AccessTokenSource, StaticTokenSource};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{RemoteEntry, RemoteStore};
pub use time::{Clock, ManualClock, SystemClock};
