//! Errors raised by the storage and storage link handlers.

use thiserror::Error;

use crate::occi::{AttributeError, StorageAction};
use crate::registry::RegistryError;

/// Errors raised by the handlers, generic over the platform error.
#[derive(Debug, Error)]
pub enum AdapterError<PlatformError>
where
    PlatformError: std::error::Error + 'static,
{
    /// Raised when attributes are missing, malformed, or unknown.
    #[error(transparent)]
    Attribute(#[from] AttributeError),
    /// Raised when the requested action is not currently applicable.
    #[error("action {action} is currently not applicable")]
    ActionNotAllowed {
        /// Requested action.
        action: StorageAction,
    },
    /// Raised when the platform reports an error state for a new volume.
    #[error("there was an error creating volume {volume_id}")]
    VolumeCreationFailed {
        /// Identifier the platform assigned before failing.
        volume_id: String,
    },
    /// Raised when a registry lookup fails for a reason other than absence.
    #[error(transparent)]
    Registry(RegistryError),
    /// Raised when the platform call fails.
    #[error(transparent)]
    Platform(PlatformError),
}

impl<PlatformError> AdapterError<PlatformError>
where
    PlatformError: std::error::Error + 'static,
{
    /// Whether the failure was caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Attribute(_) | Self::ActionNotAllowed { .. })
    }

    /// HTTP status the runtime should answer with.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        if self.is_client_error() { 400 } else { 500 }
    }
}
