//! Platform abstraction for volume and attachment management.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

use crate::context::TenantContext;

/// Parameters required to create a volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeSpec {
    /// Size in GiB.
    pub size_gib: u32,
    /// Display name for the volume.
    pub name: String,
}

/// Parameters required to snapshot a volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SnapshotRequest {
    /// Volume to snapshot.
    pub volume_id: String,
    /// Snapshot name.
    pub name: String,
    /// Free-text description.
    pub description: String,
}

/// Parameters required to attach a volume to an instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AttachRequest {
    /// Compute instance receiving the volume.
    pub instance_id: String,
    /// Volume being attached.
    pub volume_id: String,
    /// Requested device name; the platform picks one when absent.
    pub device: Option<String>,
}

/// Status reported by the platform for a volume.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "String")]
pub enum VolumeStatus {
    /// Ready and unattached.
    Available,
    /// Being provisioned.
    Creating,
    /// Being removed.
    Deleting,
    /// Attached to an instance.
    InUse,
    /// Attachment in progress.
    Attaching,
    /// Detachment in progress.
    Detaching,
    /// Provisioning failed.
    Error,
    /// Removal failed.
    ErrorDeleting,
    /// Any status this crate does not know about.
    Other(String),
}

impl VolumeStatus {
    /// Returns the platform's spelling of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Available => "available",
            Self::Creating => "creating",
            Self::Deleting => "deleting",
            Self::InUse => "in-use",
            Self::Attaching => "attaching",
            Self::Detaching => "detaching",
            Self::Error => "error",
            Self::ErrorDeleting => "error_deleting",
            Self::Other(status) => status.as_str(),
        }
    }

    /// Whether the volume can serve I/O.
    #[must_use]
    pub const fn is_online(&self) -> bool {
        matches!(self, Self::Available | Self::InUse)
    }
}

impl From<String> for VolumeStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "available" => Self::Available,
            "creating" => Self::Creating,
            "deleting" => Self::Deleting,
            "in-use" => Self::InUse,
            "attaching" => Self::Attaching,
            "detaching" => Self::Detaching,
            "error" => Self::Error,
            "error_deleting" => Self::ErrorDeleting,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for VolumeStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl fmt::Display for VolumeStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Volume as reported by the platform.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeRecord {
    /// Platform-assigned identifier.
    pub id: String,
    /// Display name, when the platform has one.
    pub display_name: Option<String>,
    /// Size in GiB.
    pub size_gib: u32,
    /// Current status.
    pub status: VolumeStatus,
}

/// Future returned by platform operations.
pub type PlatformFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Volume and attachment operations consumed by the handlers.
pub trait VolumePlatform: Send + Sync {
    /// Platform specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a volume. The returned record may be incomplete.
    fn create_volume<'a>(
        &'a self,
        spec: &'a VolumeSpec,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, VolumeRecord, Self::Error>;

    /// Fetches the current state of a volume.
    fn get_volume<'a>(
        &'a self,
        volume_id: &'a str,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, VolumeRecord, Self::Error>;

    /// Requests deletion of a volume without waiting for completion.
    fn delete_volume<'a>(
        &'a self,
        volume_id: &'a str,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error>;

    /// Requests a snapshot of a volume.
    fn snapshot_volume<'a>(
        &'a self,
        request: &'a SnapshotRequest,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error>;

    /// Attaches a volume and returns the device name the platform assigned.
    fn attach_volume<'a>(
        &'a self,
        request: &'a AttachRequest,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, String, Self::Error>;

    /// Detaches a volume from an instance.
    fn detach_volume<'a>(
        &'a self,
        instance_id: &'a str,
        volume: &'a VolumeRecord,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error>;
}
