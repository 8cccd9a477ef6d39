//! Error types for the registry client.

use thiserror::Error;

/// Errors that can occur talking to the image-scanning service.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Failed to construct the HTTP client
    #[error("failed to initialize scan client: {0}")]
    ClientInit(String),

    /// Service rejected the request with a non-success status
    #[error("scan API error: status {status}, {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the response body
        message: String,
    },

    /// Network error (connect, DNS, timeout)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("failed to parse scan API response: {0}")]
    Parse(String),
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
