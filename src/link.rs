//! Lifecycle handling for OCCI storage links (volume attachments).

use std::fmt;

use serde::Serialize;

use crate::context::RequestContext;
use crate::error::AdapterError;
use crate::occi::{
    AttributeError, AttributeMap, CORE_ID, STORAGELINK_DEVICE_ID, STORAGELINK_LOCATION,
    STORAGELINK_STATE,
};
use crate::platform::{AttachRequest, VolumePlatform};
use crate::registry::{RegistryError, compute_path};

/// Name reported when the link source (compute) carries no `occi.core.id`.
pub const SOURCE_ID: &str = "source occi.core.id";
/// Name reported when the link target (storage) carries no `occi.core.id`.
pub const TARGET_ID: &str = "target occi.core.id";

/// State of a storage link.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkState {
    /// The link exists.
    Active,
}

impl LinkState {
    /// Returns the OCCI spelling of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Endpoints and options of a storage link.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StorageLinkRequest {
    /// `occi.core.id` of the source compute resource.
    pub instance_id: Option<String>,
    /// `occi.core.id` of the target storage resource.
    pub volume_id: Option<String>,
    /// Requested `occi.storagelink.deviceid`.
    pub device_id: Option<String>,
}

impl StorageLinkRequest {
    /// Creates a request between two known endpoints.
    #[must_use]
    pub fn new(instance_id: impl Into<String>, volume_id: impl Into<String>) -> Self {
        Self {
            instance_id: Some(instance_id.into()),
            volume_id: Some(volume_id.into()),
            device_id: None,
        }
    }

    /// Sets the requested device.
    #[must_use]
    pub fn device_id(mut self, device_id: Option<String>) -> Self {
        self.device_id = device_id;
        self
    }

    /// Builds a request from the attribute maps of the source, the target,
    /// and the link itself.
    ///
    /// Only `occi.core.id` is read from the endpoints. The link's own map
    /// must stay within the storage link schema.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Unknown`] when the link map carries an
    /// attribute outside the schema.
    pub fn from_maps(
        source: &AttributeMap,
        target: &AttributeMap,
        link: &AttributeMap,
    ) -> Result<Self, AttributeError> {
        let mut device_id = None;
        for (name, value) in link {
            match name.as_str() {
                STORAGELINK_DEVICE_ID => device_id = Some(value.clone()),
                CORE_ID | STORAGELINK_STATE => {}
                other => return Err(AttributeError::Unknown(other.to_owned())),
            }
        }
        Ok(Self {
            instance_id: source.get(CORE_ID).cloned(),
            volume_id: target.get(CORE_ID).cloned(),
            device_id,
        })
    }
}

/// Storage link as returned to the runtime.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StorageLink {
    /// Location of the link (`/storage/link/<id>`).
    pub location: String,
    /// Link identifier, `<instance>_<volume>`.
    pub id: String,
    /// Source compute instance.
    pub instance_id: String,
    /// Target volume.
    pub volume_id: String,
    /// Device the volume is (or is requested to be) exposed as.
    pub device_id: Option<String>,
    /// Link state.
    pub state: LinkState,
    /// Whether the platform attach call was made.
    pub attached: bool,
}

impl StorageLink {
    /// Renders the link attributes.
    #[must_use]
    pub fn to_map(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert(CORE_ID.to_owned(), self.id.clone());
        map.insert(STORAGELINK_STATE.to_owned(), self.state.as_str().to_owned());
        if let Some(device) = &self.device_id {
            map.insert(STORAGELINK_DEVICE_ID.to_owned(), device.clone());
        }
        map
    }
}

/// Joins the endpoint identifiers into a link identifier.
#[must_use]
pub fn link_id(instance_id: &str, volume_id: &str) -> String {
    [instance_id, volume_id].join("_")
}

/// Handles the storage link kind on top of a [`VolumePlatform`].
#[derive(Clone, Debug)]
pub struct StorageLinkBackend<P> {
    platform: P,
}

impl<P> StorageLinkBackend<P>
where
    P: VolumePlatform,
{
    /// Creates a link backend.
    #[must_use]
    pub const fn new(platform: P) -> Self {
        Self { platform }
    }

    /// Links a compute instance to a volume.
    ///
    /// Missing endpoint identifiers are treated as empty strings. When the
    /// instance is not registered yet the attach call is skipped; the
    /// instance attaches its volumes once it exists. Otherwise the volume is
    /// attached and the device the platform chose is reported back.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Registry`] when the registry lookup fails for
    /// a reason other than absence, and [`AdapterError::Platform`] when the
    /// attach call fails.
    pub async fn create(
        &self,
        request: &StorageLinkRequest,
        context: &RequestContext<'_>,
    ) -> Result<StorageLink, AdapterError<P::Error>> {
        let instance_id = request.instance_id.clone().unwrap_or_default();
        let volume_id = request.volume_id.clone().unwrap_or_default();
        let id = link_id(&instance_id, &volume_id);
        let mut link = StorageLink {
            location: format!("{STORAGELINK_LOCATION}{id}"),
            id,
            instance_id,
            volume_id,
            device_id: request.device_id.clone(),
            state: LinkState::Active,
            attached: false,
        };

        let path = compute_path(&link.instance_id);
        match context.registry.get_resource(&path, context.tenant).await {
            Ok(_) => {}
            Err(RegistryError::NotFound { .. }) => {
                tracing::info!(
                    link_id = %link.id,
                    instance_id = %link.instance_id,
                    "compute not registered yet; deferring attachment to the instance"
                );
                return Ok(link);
            }
            Err(err) => return Err(AdapterError::Registry(err)),
        }

        let attach = AttachRequest {
            instance_id: link.instance_id.clone(),
            volume_id: link.volume_id.clone(),
            device: request.device_id.clone(),
        };
        let device = self
            .platform
            .attach_volume(&attach, context.tenant)
            .await
            .map_err(AdapterError::Platform)?;
        tracing::info!(
            instance_id = %link.instance_id,
            volume_id = %link.volume_id,
            device = %device,
            "attached volume"
        );
        link.device_id = Some(device);
        link.attached = true;
        Ok(link)
    }

    /// Detaches the volume behind a link from its instance.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Attribute`] when either endpoint identifier is
    /// missing and [`AdapterError::Platform`] when the volume lookup or the
    /// detach call fails.
    pub async fn delete(
        &self,
        request: &StorageLinkRequest,
        context: &RequestContext<'_>,
    ) -> Result<(), AdapterError<P::Error>> {
        let instance_id = request
            .instance_id
            .as_deref()
            .ok_or(AttributeError::Missing(SOURCE_ID))?;
        let volume_id = request
            .volume_id
            .as_deref()
            .ok_or(AttributeError::Missing(TARGET_ID))?;

        let volume = self
            .platform
            .get_volume(volume_id, context.tenant)
            .await
            .map_err(AdapterError::Platform)?;
        self.platform
            .detach_volume(instance_id, &volume, context.tenant)
            .await
            .map_err(AdapterError::Platform)?;
        tracing::info!(instance_id, volume_id, "detached volume");
        Ok(())
    }
}
