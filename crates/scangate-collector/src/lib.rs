//! Scangate Collector - Scan result collection and gating.
//!
//! This crate owns the whole gate behavior: optionally trigger a scan, poll
//! its status until it leaves the in-progress state, paginate through the
//! findings result set, aggregate a severity histogram, and turn the
//! histogram into a pass/fail verdict.
//!
//! # Example
//!
//! ```rust,ignore
//! use scangate_collector::ScanResultCollector;
//! use scangate_core::ScanTarget;
//! use std::sync::Arc;
//!
//! let collector = ScanResultCollector::new(Arc::new(client))
//!     .with_poll_interval(std::time::Duration::from_secs(10));
//!
//! let target = ScanTarget::new("team/service", "v1.4.2")?;
//! let acceptable = collector.run_report(&target).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod collector;
pub mod error;

// Re-export commonly used types
pub use collector::ScanResultCollector;
pub use error::{Result, ScanError};
