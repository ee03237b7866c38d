//! Registry backed by the Compute API.

use reqwest::StatusCode;

use crate::context::TenantContext;
use crate::registry::{COMPUTE_LOCATION, Registry, RegistryError, RegistryFuture, ResourceEntry};

use super::send;

/// Resolves `/compute/<id>` paths by asking the Compute API whether the
/// server exists.
#[derive(Clone, Debug)]
pub struct ComputeRegistry {
    client: reqwest::Client,
    compute_endpoint: String,
}

impl ComputeRegistry {
    pub(super) const fn new(client: reqwest::Client, compute_endpoint: String) -> Self {
        Self {
            client,
            compute_endpoint,
        }
    }

    async fn lookup(
        &self,
        path: &str,
        tenant: &TenantContext,
    ) -> Result<ResourceEntry, RegistryError> {
        let not_found = || RegistryError::NotFound {
            path: path.to_owned(),
        };
        let instance_id = path
            .strip_prefix(COMPUTE_LOCATION)
            .filter(|id| !id.is_empty() && !id.contains('/'))
            .ok_or_else(not_found)?;

        let url = format!("{}/servers/{instance_id}", self.compute_endpoint);
        let response = send(self.client.get(url), tenant)
            .await
            .map_err(|err| RegistryError::Lookup {
                path: path.to_owned(),
                message: err.to_string(),
            })?;
        if response.status == StatusCode::NOT_FOUND {
            return Err(not_found());
        }
        response
            .into_result()
            .map_err(|err| RegistryError::Lookup {
                path: path.to_owned(),
                message: err.to_string(),
            })?;
        Ok(ResourceEntry {
            path: path.to_owned(),
        })
    }
}

impl Registry for ComputeRegistry {
    fn get_resource<'a>(&'a self, path: &'a str, tenant: &'a TenantContext) -> RegistryFuture<'a> {
        Box::pin(async move { self.lookup(path, tenant).await })
    }
}
