//! Scangate Registry - Client for the remote image-scanning service.
//!
//! This crate defines the abstract contract the collector consumes
//! ([`ScanApi`]) and the HTTP implementation that speaks the ECR-style JSON
//! operations `StartImageScan` and `DescribeImageScanFindings`.
//!
//! The trait seam exists so the collector can be exercised against scripted
//! in-memory services in tests without a network.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod api;
pub mod client;
pub mod error;

// Re-export commonly used types
pub use api::{FindingsPage, ScanApi};
pub use client::HttpScanClient;
pub use error::{RegistryError, Result};
