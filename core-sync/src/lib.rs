//! # Sync Module
//!
//! Orchestrates reconciliation between the local gallery folder and the
//! remote object store.
//!
//! ## Overview
//!
//! - **Reconciler** (`reconciler`): diffs the remote listing against the
//!   live local directory; downloads missing images on pull, uploads new
//!   files on push, aggregating per-file failures into a summary
//! - **Scheduler** (`scheduler`): cooldown gate in front of the pull path,
//!   with a manual override and a shorter cooldown after failures
//! - **Service** (`service`): the owning `ReconciliationService` facade
//!   consumed by the (out-of-scope) web layer

pub mod error;
pub mod reconciler;
pub mod scheduler;
pub mod service;

pub use error::{Result, SyncError};
pub use reconciler::{Reconciler, SyncReport};
pub use scheduler::{SyncOutcome, SyncScheduler};
pub use service::{GalleryStatus, ReconciliationService, UploadOutcome};
