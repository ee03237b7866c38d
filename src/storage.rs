//! Lifecycle and action handling for OCCI storage resources.

use chrono::{Local, NaiveDate};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::AdapterError;
use crate::occi::{
    ActionSet, AttributeError, AttributeMap, STORAGE_SIZE, StorageAction, StorageAttributes,
    StorageEntity, StorageState, format_size_gib, parse_size_gib, storage_location,
};
use crate::platform::{SnapshotRequest, VolumePlatform, VolumeSpec, VolumeStatus};

/// Snapshot description used when the volume has no summary.
pub const SNAPSHOT_DESCRIPTION_FALLBACK: &str = "N/A";

/// Validated inputs for creating a volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageCreateRequest {
    /// Requested size in GiB.
    pub size_gib: u32,
    /// Requested display name; a random one is generated when absent.
    pub name: Option<String>,
}

impl StorageCreateRequest {
    /// Extracts creation parameters from resource attributes.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Missing`] when `occi.storage.size` is absent
    /// and [`AttributeError::Invalid`] when it is not a whole number of GiB.
    pub fn from_attributes(attributes: &StorageAttributes) -> Result<Self, AttributeError> {
        let raw_size = attributes
            .size
            .as_deref()
            .ok_or(AttributeError::Missing(STORAGE_SIZE))?;
        Ok(Self {
            size_gib: parse_size_gib(raw_size)?,
            name: attributes.title.clone().filter(|title| !title.is_empty()),
        })
    }

    fn volume_spec(&self) -> VolumeSpec {
        VolumeSpec {
            size_gib: self.size_gib,
            name: self
                .name
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        }
    }
}

/// Result of a dispatched storage action.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ActionOutcome {
    /// The action is accepted but the platform integration does not
    /// implement it.
    Unsupported(StorageAction),
    /// A snapshot was requested from the platform.
    SnapshotRequested(SnapshotRequest),
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Handles the storage kind and its actions on top of a [`VolumePlatform`].
#[derive(Clone, Debug)]
pub struct StorageBackend<P> {
    platform: P,
    today: fn() -> NaiveDate,
}

impl<P> StorageBackend<P>
where
    P: VolumePlatform,
{
    /// Creates a backend that dates snapshots with the local calendar date.
    #[must_use]
    pub const fn new(platform: P) -> Self {
        Self {
            platform,
            today: local_today,
        }
    }

    /// Replaces the calendar used to name snapshots.
    #[must_use]
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Creates a volume for a new storage resource.
    ///
    /// The platform's create response is not trusted for the status; the
    /// volume is fetched again before deciding the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Attribute`] when the size is missing or
    /// malformed (no platform call is made),
    /// [`AdapterError::VolumeCreationFailed`] when the volume settles in the
    /// `error` status, and [`AdapterError::Platform`] when a platform call
    /// fails.
    pub async fn create(
        &self,
        attributes: &StorageAttributes,
        context: &RequestContext<'_>,
    ) -> Result<StorageEntity, AdapterError<P::Error>> {
        let request = StorageCreateRequest::from_attributes(attributes)?;
        let spec = request.volume_spec();
        let created = self
            .platform
            .create_volume(&spec, context.tenant)
            .await
            .map_err(AdapterError::Platform)?;

        let volume = self
            .platform
            .get_volume(&created.id, context.tenant)
            .await
            .map_err(AdapterError::Platform)?;

        if volume.status == VolumeStatus::Error {
            tracing::error!(volume_id = %created.id, "volume entered error state after creation");
            return Err(AdapterError::VolumeCreationFailed {
                volume_id: created.id,
            });
        }

        let mut created_attributes = attributes.clone();
        if volume.status == VolumeStatus::Available {
            created_attributes.state = Some(StorageState::Active);
        }
        tracing::info!(
            volume_id = %created.id,
            name = %spec.name,
            size_gib = spec.size_gib,
            status = %volume.status,
            "created volume"
        );
        created_attributes.id = Some(created.id);

        let mut entity = StorageEntity::from_attributes(created_attributes);
        entity.actions = ActionSet::online();
        Ok(entity)
    }

    /// Refreshes a storage resource from the platform.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Attribute`] when `occi.core.id` is unset and
    /// [`AdapterError::Platform`] when the lookup fails.
    pub async fn retrieve(
        &self,
        attributes: &StorageAttributes,
        context: &RequestContext<'_>,
    ) -> Result<StorageEntity, AdapterError<P::Error>> {
        let volume_id = attributes.require_id()?;
        let volume = self
            .platform
            .get_volume(volume_id, context.tenant)
            .await
            .map_err(AdapterError::Platform)?;

        let (state, actions) = StorageState::project(&volume.status);
        tracing::debug!(volume_id, status = %volume.status, state = %state, "retrieved volume");

        let mut current = attributes.clone();
        current.title = volume.display_name;
        current.size = Some(format_size_gib(volume.size_gib));
        current.state = Some(state);

        Ok(StorageEntity {
            location: Some(storage_location(volume_id)),
            attributes: current,
            actions,
        })
    }

    /// Applies a partial update to the local attributes. No platform call is
    /// made.
    ///
    /// Only the title and summary are mutable. A non-empty title replaces the
    /// old one; a non-empty summary replaces the old one only when `new` also
    /// carries a title.
    #[must_use]
    pub fn update(&self, old: &StorageAttributes, new: &StorageAttributes) -> StorageAttributes {
        let mut updated = old.clone();
        if let Some(title) = new.title.as_deref().filter(|title| !title.is_empty()) {
            updated.title = Some(title.to_owned());
        }
        if new.title.is_some()
            && let Some(summary) = new.summary.as_deref().filter(|summary| !summary.is_empty())
        {
            updated.summary = Some(summary.to_owned());
        }
        updated
    }

    /// Deletes the volume behind a storage resource without waiting for the
    /// platform to finish.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Attribute`] when `occi.core.id` is unset and
    /// [`AdapterError::Platform`] when the platform rejects the deletion.
    pub async fn delete(
        &self,
        attributes: &StorageAttributes,
        context: &RequestContext<'_>,
    ) -> Result<(), AdapterError<P::Error>> {
        let volume_id = attributes.require_id()?;
        self.platform
            .delete_volume(volume_id, context.tenant)
            .await
            .map_err(AdapterError::Platform)?;
        tracing::info!(volume_id, "requested volume deletion");
        Ok(())
    }

    /// Runs an action against a storage resource.
    ///
    /// Only `snapshot` reaches the platform; `online`, `offline`, `backup`,
    /// and `resize` are accepted and reported as unsupported.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::ActionNotAllowed`] when `action` is not among
    /// the entity's applicable actions, [`AdapterError::Attribute`] when a
    /// snapshot is requested without `occi.core.id`, and
    /// [`AdapterError::Platform`] when the snapshot request fails.
    pub async fn action(
        &self,
        entity: &StorageEntity,
        action: StorageAction,
        attributes: &AttributeMap,
        context: &RequestContext<'_>,
    ) -> Result<ActionOutcome, AdapterError<P::Error>> {
        if !entity.actions.contains(action) {
            return Err(AdapterError::ActionNotAllowed { action });
        }
        tracing::debug!(
            %action,
            action_attributes = attributes.len(),
            "dispatching storage action"
        );

        match action {
            StorageAction::Online
            | StorageAction::Offline
            | StorageAction::Backup
            | StorageAction::Resize => {
                tracing::warn!(%action, "storage action is not supported by the platform");
                Ok(ActionOutcome::Unsupported(action))
            }
            StorageAction::Snapshot => {
                let volume_id = entity.attributes.require_id()?;
                let request = SnapshotRequest {
                    volume_id: volume_id.to_owned(),
                    name: format!("{volume_id}{}", (self.today)()),
                    description: entity
                        .attributes
                        .summary
                        .clone()
                        .unwrap_or_else(|| SNAPSHOT_DESCRIPTION_FALLBACK.to_owned()),
                };
                self.platform
                    .snapshot_volume(&request, context.tenant)
                    .await
                    .map_err(AdapterError::Platform)?;
                tracing::info!(volume_id, snapshot = %request.name, "requested volume snapshot");
                Ok(ActionOutcome::SnapshotRequested(request))
            }
        }
    }
}
