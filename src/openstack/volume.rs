//! Block Storage v3 volume and snapshot calls.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::context::TenantContext;
use crate::platform::{SnapshotRequest, VolumeRecord, VolumeSpec, VolumeStatus};

use super::{OpenStackError, OpenStackPlatform, decode, send};

#[derive(Serialize)]
struct CreateVolumeBody<'a> {
    volume: CreateVolume<'a>,
}

#[derive(Serialize)]
struct CreateVolume<'a> {
    size: u32,
    name: &'a str,
}

#[derive(Serialize)]
struct CreateSnapshotBody<'a> {
    snapshot: CreateSnapshot<'a>,
}

#[derive(Serialize)]
struct CreateSnapshot<'a> {
    volume_id: &'a str,
    name: &'a str,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
struct VolumeEnvelope {
    volume: CinderVolume,
}

#[derive(Debug, Deserialize)]
struct CinderVolume {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    size: u32,
    status: VolumeStatus,
}

impl From<CinderVolume> for VolumeRecord {
    fn from(value: CinderVolume) -> Self {
        Self {
            id: value.id,
            display_name: value.name,
            size_gib: value.size,
            status: value.status,
        }
    }
}

impl OpenStackPlatform {
    /// `POST /volumes`
    pub(super) async fn post_volume(
        &self,
        spec: &VolumeSpec,
        tenant: &TenantContext,
    ) -> Result<VolumeRecord, OpenStackError> {
        let body = CreateVolumeBody {
            volume: CreateVolume {
                size: spec.size_gib,
                name: &spec.name,
            },
        };
        let request = self
            .client
            .post(self.volume_url(tenant, "volumes"))
            .json(&body);
        let response = send(request, tenant).await?.into_result()?;
        let envelope: VolumeEnvelope = decode(&response)?;
        Ok(envelope.volume.into())
    }

    /// `GET /volumes/{id}`
    pub(super) async fn fetch_volume(
        &self,
        volume_id: &str,
        tenant: &TenantContext,
    ) -> Result<VolumeRecord, OpenStackError> {
        let request = self
            .client
            .get(self.volume_url(tenant, &format!("volumes/{volume_id}")));
        let response = send(request, tenant).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(OpenStackError::VolumeNotFound {
                volume_id: volume_id.to_owned(),
            });
        }
        let envelope: VolumeEnvelope = decode(&response.into_result()?)?;
        Ok(envelope.volume.into())
    }

    /// `DELETE /volumes/{id}`
    pub(super) async fn remove_volume(
        &self,
        volume_id: &str,
        tenant: &TenantContext,
    ) -> Result<(), OpenStackError> {
        let request = self
            .client
            .delete(self.volume_url(tenant, &format!("volumes/{volume_id}")));
        let response = send(request, tenant).await?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(OpenStackError::VolumeNotFound {
                volume_id: volume_id.to_owned(),
            });
        }
        response.into_result().map(drop)
    }

    /// `POST /snapshots`
    pub(super) async fn post_snapshot(
        &self,
        snapshot: &SnapshotRequest,
        tenant: &TenantContext,
    ) -> Result<(), OpenStackError> {
        let body = CreateSnapshotBody {
            snapshot: CreateSnapshot {
                volume_id: &snapshot.volume_id,
                name: &snapshot.name,
                description: &snapshot.description,
            },
        };
        let request = self
            .client
            .post(self.volume_url(tenant, "snapshots"))
            .json(&body);
        send(request, tenant).await?.into_result().map(drop)
    }
}
