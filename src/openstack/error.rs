//! Error types for the OpenStack platform.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by the OpenStack platform.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OpenStackError {
    /// Raised when the configuration is incomplete or the HTTP client cannot
    /// be built from it.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a request cannot be sent or its body cannot be read.
    #[error("transport error: {message}")]
    Transport {
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when the API answers with a non-success status.
    #[error("OpenStack API returned {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },
    /// Raised when the volume does not exist or is not visible to the tenant.
    #[error("volume {volume_id} not found")]
    VolumeNotFound {
        /// Volume identifier that was looked up.
        volume_id: String,
    },
    /// Raised when a response body does not match the expected shape.
    #[error("unexpected response body: {message}")]
    Decode {
        /// Description of the mismatch.
        message: String,
    },
}

impl From<ConfigError> for OpenStackError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<reqwest::Error> for OpenStackError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport {
            message: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for OpenStackError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode {
            message: value.to_string(),
        }
    }
}
