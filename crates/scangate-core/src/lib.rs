//! Scangate Core - Foundation crate for the scangate image-scan gate.
//!
//! This crate provides the shared types, error handling, and configuration
//! management that the registry client, collector, and CLI depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared domain types (`ScanTarget`, `ScanStatus`, `Severity`,
//!   `SeverityHistogram`, `PageToken`, `Finding`)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{GateConfig, GeneralSettings, RegistrySettings, ResolvedRegistry};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use types::{Finding, PageToken, ScanStatus, ScanTarget, Severity, SeverityHistogram};
