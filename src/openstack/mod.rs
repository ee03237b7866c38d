//! OpenStack implementation of the volume platform.
//!
//! Volumes are managed through the Block Storage v3 API and attachments
//! through the Compute API's `os-volume_attachments` resource. Every call
//! authenticates with the tenant's token; Block Storage paths also carry the
//! tenant's project.

mod attachment;
mod error;
mod registry;
mod volume;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::OpenStackConfig;
use crate::context::TenantContext;
use crate::platform::{
    AttachRequest, PlatformFuture, SnapshotRequest, VolumePlatform, VolumeRecord, VolumeSpec,
};

pub use error::OpenStackError;
pub use registry::ComputeRegistry;

const AUTH_HEADER: &str = "X-Auth-Token";

/// Platform that manages volumes through the OpenStack REST APIs.
#[derive(Clone, Debug)]
pub struct OpenStackPlatform {
    client: reqwest::Client,
    volume_endpoint: String,
    compute_endpoint: String,
}

impl OpenStackPlatform {
    /// Constructs a platform from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OpenStackError::Config`] when the configuration fails
    /// validation or the HTTP client cannot be built.
    pub fn new(config: &OpenStackConfig) -> Result<Self, OpenStackError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|err| OpenStackError::Config(err.to_string()))?;
        Ok(Self {
            client,
            volume_endpoint: config.volume_endpoint.trim_end_matches('/').to_owned(),
            compute_endpoint: config.compute_endpoint.trim_end_matches('/').to_owned(),
        })
    }

    /// Returns a registry that resolves `/compute/<id>` against the Compute
    /// API with the same HTTP client.
    #[must_use]
    pub fn compute_registry(&self) -> ComputeRegistry {
        ComputeRegistry::new(self.client.clone(), self.compute_endpoint.clone())
    }

    /// Block Storage paths are scoped by the tenant's project.
    fn volume_url(&self, tenant: &TenantContext, path: &str) -> String {
        format!("{}/{}/{path}", self.volume_endpoint, tenant.project_id)
    }

    fn compute_url(&self, path: &str) -> String {
        format!("{}/{path}", self.compute_endpoint)
    }
}

/// Response reduced to what the platform needs: status and raw body.
struct RawResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl RawResponse {
    fn into_result(self) -> Result<Vec<u8>, OpenStackError> {
        if self.status.is_success() {
            return Ok(self.body);
        }
        Err(OpenStackError::Api {
            status: self.status.as_u16(),
            message: String::from_utf8_lossy(&self.body).into_owned(),
        })
    }
}

async fn send(
    request: RequestBuilder,
    tenant: &TenantContext,
) -> Result<RawResponse, OpenStackError> {
    let response = request
        .header(AUTH_HEADER, &tenant.auth_token)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;
    let status = response.status();
    let body = response.bytes().await?.to_vec();
    Ok(RawResponse { status, body })
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, OpenStackError> {
    Ok(serde_json::from_slice(body)?)
}

impl VolumePlatform for OpenStackPlatform {
    type Error = OpenStackError;

    fn create_volume<'a>(
        &'a self,
        spec: &'a VolumeSpec,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, VolumeRecord, Self::Error> {
        Box::pin(async move { self.post_volume(spec, tenant).await })
    }

    fn get_volume<'a>(
        &'a self,
        volume_id: &'a str,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, VolumeRecord, Self::Error> {
        Box::pin(async move { self.fetch_volume(volume_id, tenant).await })
    }

    fn delete_volume<'a>(
        &'a self,
        volume_id: &'a str,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error> {
        Box::pin(async move { self.remove_volume(volume_id, tenant).await })
    }

    fn snapshot_volume<'a>(
        &'a self,
        request: &'a SnapshotRequest,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error> {
        Box::pin(async move { self.post_snapshot(request, tenant).await })
    }

    fn attach_volume<'a>(
        &'a self,
        request: &'a AttachRequest,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, String, Self::Error> {
        Box::pin(async move { self.post_attachment(request, tenant).await })
    }

    fn detach_volume<'a>(
        &'a self,
        instance_id: &'a str,
        volume: &'a VolumeRecord,
        tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error> {
        Box::pin(async move { self.remove_attachment(instance_id, &volume.id, tenant).await })
    }
}
