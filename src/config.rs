//! Configuration loading via `ortho-config`.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::context::TenantContext;

/// OpenStack endpoints and credentials derived from environment variables,
/// configuration files, and CLI flags.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "OS",
    discovery(
        app_name = "occi-storage",
        env_var = "OCCI_STORAGE_CONFIG_PATH",
        config_file_name = "occi-storage.toml",
        dotfile_name = ".occi-storage.toml",
        project_file_name = "occi-storage.toml"
    )
)]
pub struct OpenStackConfig {
    /// Keystone token sent with every request. This value is required.
    pub auth_token: String,
    /// Project (tenant) the token is scoped to. Block Storage paths are
    /// built under it.
    pub project_id: String,
    /// Block Storage v3 endpoint without the project path segment (for
    /// example `https://cloud.example:8776/v3`).
    pub volume_endpoint: String,
    /// Compute v2.1 endpoint (for example `https://cloud.example:8774/v2.1`).
    pub compute_endpoint: String,
    /// Timeout applied to each HTTP request, in seconds.
    #[ortho_config(default = 30)]
    pub request_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl OpenStackConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to occi-storage.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("occi-storage")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Builds the tenant context used to authorise platform calls.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when validation fails.
    pub fn tenant(&self) -> Result<TenantContext, ConfigError> {
        self.validate()?;
        Ok(TenantContext::new(&self.project_id, &self.auth_token))
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Performs semantic validation on required fields. Error messages name
    /// the environment variable and TOML key that supply each value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// and [`ConfigError::InvalidTimeout`] when the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.auth_token,
            &FieldMetadata::new("OpenStack auth token", "OS_AUTH_TOKEN", "auth_token"),
        )?;
        Self::require_field(
            &self.project_id,
            &FieldMetadata::new("OpenStack project ID", "OS_PROJECT_ID", "project_id"),
        )?;
        Self::require_field(
            &self.volume_endpoint,
            &FieldMetadata::new(
                "Block Storage endpoint",
                "OS_VOLUME_ENDPOINT",
                "volume_endpoint",
            ),
        )?;
        Self::require_field(
            &self.compute_endpoint,
            &FieldMetadata::new(
                "Compute endpoint",
                "OS_COMPUTE_ENDPOINT",
                "compute_endpoint",
            ),
        )?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Raised when the request timeout is zero.
    #[error("request_timeout_secs must be greater than zero")]
    InvalidTimeout,
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
