//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the photo gallery core:
//! - Configuration management with fail-fast capability validation
//! - Logging and tracing bootstrap
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the domain crates depend on.
//! It establishes the logging conventions and the configuration surface the
//! embedding application assembles at startup.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{GalleryConfig, GalleryConfigBuilder, ALLOWED_EXTENSIONS};
pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
