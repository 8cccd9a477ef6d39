//! Error types for scan result collection.

use scangate_registry::RegistryError;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while collecting and gating scan results.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Could not assemble a usable scan client (config or construction)
    #[error("failed to initialize scan client: {0}")]
    ClientInit(String),

    /// A remote call failed
    #[error("scan request failed: {0}")]
    Request(#[from] RegistryError),

    /// The service reported the scan itself as failed
    #[error("remote scan failed for {target}")]
    ScanFailed {
        /// Image the scan applied to
        target: String,
    },

    /// The service reported a status label we do not recognize
    #[error("unexpected scan status '{status}'")]
    UnexpectedStatus {
        /// Raw status label from the service
        status: String,
    },

    /// The optional polling deadline elapsed before the scan finished
    #[error("scan did not complete within the deadline (waited {waited:?})")]
    DeadlineExceeded {
        /// How long we polled before giving up
        waited: Duration,
    },
}

/// Result type alias for collector operations.
pub type Result<T> = std::result::Result<T, ScanError>;
