//! Configuration management for scangate.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides. Credential material is limited to a
//! pre-issued registry token; resolving a full cloud credential chain is
//! out of scope and left to whatever issued the token.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Region assumed when neither flag, env, nor config supplies one.
const DEFAULT_REGION: &str = "us-east-1";

/// Main application configuration.
///
/// Loaded from `~/.config/scangate/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Polling cadence and deadline settings
    pub general: GeneralSettings,
    /// Default registry connection settings
    pub registry: RegistrySettings,
    /// Named credential profiles, selected with `--profile`
    pub profiles: BTreeMap<String, RegistrySettings>,
}

/// Polling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Seconds to sleep between status polls
    pub poll_interval_secs: u64,
    /// Optional cap on total polling time; absent means poll indefinitely
    pub deadline_secs: Option<u64>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: 15,
            deadline_secs: None,
        }
    }
}

/// Connection settings for one registry endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Explicit API endpoint; overrides region-derived endpoints
    pub endpoint: Option<String>,
    /// Region used to derive the endpoint when none is set
    pub region: Option<String>,
    /// Pre-issued bearer token for the scan API
    pub auth_token: Option<String>,
}

/// A fully resolved registry connection, ready to build a client from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegistry {
    /// API endpoint base URL
    pub endpoint: String,
    /// Bearer token, when one was configured
    pub auth_token: Option<String>,
}

impl GateConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            Self::from_toml_str(&contents)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SCANGATE_ENDPOINT`: Override the default registry endpoint
    /// - `SCANGATE_REGION`: Override the default registry region
    /// - `SCANGATE_TOKEN`: Override the default auth token
    /// - `SCANGATE_POLL_INTERVAL_SECS`: Override the poll interval
    /// - `SCANGATE_DEADLINE_SECS`: Override the polling deadline
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("SCANGATE_ENDPOINT") {
            config.registry.endpoint = Some(val);
        }

        if let Ok(val) = std::env::var("SCANGATE_REGION") {
            config.registry.region = Some(val);
        }

        if let Ok(val) = std::env::var("SCANGATE_TOKEN") {
            config.registry.auth_token = Some(val);
        }

        if let Ok(val) = std::env::var("SCANGATE_POLL_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                config.general.poll_interval_secs = secs;
                tracing::debug!("Override poll_interval_secs from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("SCANGATE_DEADLINE_SECS") {
            if let Ok(secs) = val.parse() {
                config.general.deadline_secs = Some(secs);
                tracing::debug!("Override deadline_secs from env: {}", secs);
            }
        }

        Ok(config)
    }

    /// Resolve a usable registry connection.
    ///
    /// `profile` selects a named `[profiles.<name>]` section; fields left
    /// unset there fall through to the `[registry]` defaults. `region`
    /// overrides both. The endpoint is taken verbatim when configured,
    /// otherwise derived from the region.
    ///
    /// # Errors
    /// Returns [`ConfigError::UnknownProfile`] if the requested profile does
    /// not exist, or [`ConfigError::InvalidValue`] if a configured endpoint
    /// is blank.
    pub fn resolve(
        &self,
        profile: Option<&str>,
        region: Option<&str>,
    ) -> ConfigResult<ResolvedRegistry> {
        let selected = match profile {
            Some(name) => Some(self.profiles.get(name).ok_or_else(|| {
                ConfigError::UnknownProfile {
                    name: name.to_string(),
                }
            })?),
            None => None,
        };

        let endpoint = selected
            .and_then(|s| s.endpoint.clone())
            .or_else(|| self.registry.endpoint.clone());

        let auth_token = selected
            .and_then(|s| s.auth_token.clone())
            .or_else(|| self.registry.auth_token.clone());

        let endpoint = match endpoint {
            Some(endpoint) => {
                if endpoint.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "endpoint".to_string(),
                        reason: "must not be blank".to_string(),
                    });
                }
                endpoint.trim_end_matches('/').to_string()
            }
            None => {
                let region = region
                    .map(str::to_string)
                    .or_else(|| selected.and_then(|s| s.region.clone()))
                    .or_else(|| self.registry.region.clone())
                    .unwrap_or_else(|| DEFAULT_REGION.to_string());
                format!("https://api.ecr.{region}.amazonaws.com")
            }
        };

        Ok(ResolvedRegistry {
            endpoint,
            auth_token,
        })
    }

    /// Path to the config file.
    fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("io", "scangate", "scangate").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert_eq!(config.general.poll_interval_secs, 15);
        assert!(config.general.deadline_secs.is_none());
        assert!(config.registry.endpoint.is_none());
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = GateConfig::from_toml_str(
            r#"
            [general]
            poll_interval_secs = 5
            deadline_secs = 600

            [registry]
            region = "eu-west-1"
            auth_token = "default-token"

            [profiles.staging]
            endpoint = "https://scan.staging.internal/"
            auth_token = "staging-token"
            "#,
        )
        .expect("parse config");

        assert_eq!(config.general.poll_interval_secs, 5);
        assert_eq!(config.general.deadline_secs, Some(600));
        assert_eq!(config.registry.region.as_deref(), Some("eu-west-1"));
        assert!(config.profiles.contains_key("staging"));
    }

    #[test]
    fn test_resolve_region_derived_endpoint() {
        let config = GateConfig::default();
        let resolved = config.resolve(None, None).expect("resolve defaults");
        assert_eq!(resolved.endpoint, "https://api.ecr.us-east-1.amazonaws.com");
        assert!(resolved.auth_token.is_none());

        let resolved = config.resolve(None, Some("ap-southeast-2")).expect("resolve");
        assert_eq!(
            resolved.endpoint,
            "https://api.ecr.ap-southeast-2.amazonaws.com"
        );
    }

    #[test]
    fn test_resolve_profile_overrides_defaults() {
        let config = GateConfig::from_toml_str(
            r#"
            [registry]
            auth_token = "default-token"

            [profiles.staging]
            endpoint = "https://scan.staging.internal/"
            "#,
        )
        .expect("parse config");

        let resolved = config.resolve(Some("staging"), None).expect("resolve");
        // Trailing slash stripped, token fell through from [registry]
        assert_eq!(resolved.endpoint, "https://scan.staging.internal");
        assert_eq!(resolved.auth_token.as_deref(), Some("default-token"));
    }

    #[test]
    fn test_resolve_unknown_profile() {
        let config = GateConfig::default();
        let err = config.resolve(Some("nope"), None).expect_err("unknown profile");
        assert!(matches!(err, ConfigError::UnknownProfile { .. }));
    }

    #[test]
    fn test_resolve_blank_endpoint_rejected() {
        let config = GateConfig::from_toml_str(
            r#"
            [registry]
            endpoint = "  "
            "#,
        )
        .expect("parse config");

        let err = config.resolve(None, None).expect_err("blank endpoint");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
