//! Core error types for scangate.
//!
//! Each subsystem carries its own error enum; this module holds the errors
//! shared across crate boundaries (validation and configuration).

use thiserror::Error;

/// Central error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration errors (file loading, parsing, profile resolution)
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors (malformed repository names, tags, tokens)
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Named credential profile is not present in the config file
    #[error("unknown credential profile '{name}'")]
    UnknownProfile {
        /// Profile name requested on the command line
        name: String,
    },

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::Validation("bad tag".to_string());
        assert_eq!(err.to_string(), "validation error: bad tag");

        let err = ConfigError::UnknownProfile {
            name: "staging".to_string(),
        };
        assert_eq!(err.to_string(), "unknown credential profile 'staging'");
    }

    #[test]
    fn test_error_from_config() {
        let config_err = ConfigError::NoConfigDir;
        let core_err: CoreError = config_err.into();
        assert!(matches!(core_err, CoreError::Config(_)));
    }
}
