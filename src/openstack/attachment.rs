//! Compute API volume attachment calls.

use serde::{Deserialize, Serialize};

use crate::context::TenantContext;
use crate::platform::AttachRequest;

use super::{OpenStackError, OpenStackPlatform, decode, send};

#[derive(Serialize)]
struct AttachBody<'a> {
    #[serde(rename = "volumeAttachment")]
    volume_attachment: AttachVolume<'a>,
}

#[derive(Serialize)]
struct AttachVolume<'a> {
    #[serde(rename = "volumeId")]
    volume_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a str>,
}

#[derive(Deserialize)]
struct AttachmentEnvelope {
    #[serde(rename = "volumeAttachment")]
    volume_attachment: Attachment,
}

#[derive(Deserialize)]
struct Attachment {
    #[serde(default)]
    device: Option<String>,
}

impl OpenStackPlatform {
    /// `POST /servers/{id}/os-volume_attachments`
    ///
    /// Newer microversions may omit the device; the requested one is
    /// reported in that case.
    pub(super) async fn post_attachment(
        &self,
        attach: &AttachRequest,
        tenant: &TenantContext,
    ) -> Result<String, OpenStackError> {
        let body = AttachBody {
            volume_attachment: AttachVolume {
                volume_id: &attach.volume_id,
                device: attach.device.as_deref(),
            },
        };
        let url = self.compute_url(&format!(
            "servers/{}/os-volume_attachments",
            attach.instance_id
        ));
        let request = self.client.post(url).json(&body);
        let response = send(request, tenant).await?.into_result()?;
        let envelope: AttachmentEnvelope = decode(&response)?;
        envelope
            .volume_attachment
            .device
            .or_else(|| attach.device.clone())
            .ok_or_else(|| OpenStackError::Decode {
                message: String::from("attachment response carries no device"),
            })
    }

    /// `DELETE /servers/{id}/os-volume_attachments/{volume_id}`
    pub(super) async fn remove_attachment(
        &self,
        instance_id: &str,
        volume_id: &str,
        tenant: &TenantContext,
    ) -> Result<(), OpenStackError> {
        let url = self.compute_url(&format!(
            "servers/{instance_id}/os-volume_attachments/{volume_id}"
        ));
        send(self.client.delete(url), tenant)
            .await?
            .into_result()
            .map(drop)
    }
}
