//! OCCI storage model: attribute schema, states, and actions.
//!
//! The runtime hands attributes over as plain `name -> value` maps. They are
//! parsed into [`StorageAttributes`] at the boundary so unknown names and
//! malformed values are rejected before any handler logic runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::platform::VolumeStatus;

/// Attribute dictionary exchanged with the OCCI runtime.
pub type AttributeMap = BTreeMap<String, String>;

/// `occi.core.id`
pub const CORE_ID: &str = "occi.core.id";
/// `occi.core.title`
pub const CORE_TITLE: &str = "occi.core.title";
/// `occi.core.summary`
pub const CORE_SUMMARY: &str = "occi.core.summary";
/// `occi.storage.size`
pub const STORAGE_SIZE: &str = "occi.storage.size";
/// `occi.storage.state`
pub const STORAGE_STATE: &str = "occi.storage.state";
/// `occi.storagelink.deviceid`
pub const STORAGELINK_DEVICE_ID: &str = "occi.storagelink.deviceid";
/// `occi.storagelink.state`
pub const STORAGELINK_STATE: &str = "occi.storagelink.state";

/// Collection path of storage resources.
pub const STORAGE_LOCATION: &str = "/storage/";
/// Collection path of storage links.
pub const STORAGELINK_LOCATION: &str = "/storage/link/";

/// Scheme shared by all storage actions.
pub const STORAGE_ACTION_SCHEME: &str =
    "http://schemas.ogf.org/occi/infrastructure/storage/action#";

/// Errors raised while validating OCCI attributes.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AttributeError {
    /// A required attribute is absent.
    #[error("{0} attribute not found")]
    Missing(&'static str),
    /// An attribute is present but its value is unusable.
    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid {
        /// Attribute name.
        name: &'static str,
        /// Offending value.
        value: String,
        /// Why the value was rejected.
        reason: &'static str,
    },
    /// The attribute is not part of the schema.
    #[error("unknown attribute {0}")]
    Unknown(String),
}

/// Actions defined on storage resources.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageAction {
    /// Bring the volume online.
    Online,
    /// Take the volume offline.
    Offline,
    /// Back the volume up.
    Backup,
    /// Snapshot the volume.
    Snapshot,
    /// Resize the volume.
    Resize,
}

impl StorageAction {
    /// Every storage action, in rendering order.
    pub const ALL: [Self; 5] = [
        Self::Online,
        Self::Offline,
        Self::Backup,
        Self::Snapshot,
        Self::Resize,
    ];

    /// Returns the action term.
    #[must_use]
    pub const fn term(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Backup => "backup",
            Self::Snapshot => "snapshot",
            Self::Resize => "resize",
        }
    }
}

impl fmt::Display for StorageAction {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.term())
    }
}

impl FromStr for StorageAction {
    type Err = AttributeError;

    /// Accepts either a bare term (`snapshot`) or a full type identifier.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let term = value.strip_prefix(STORAGE_ACTION_SCHEME).unwrap_or(value);
        Self::ALL
            .into_iter()
            .find(|action| action.term() == term)
            .ok_or_else(|| AttributeError::Invalid {
                name: "action",
                value: value.to_owned(),
                reason: "not a storage action",
            })
    }
}

/// Set of actions currently applicable to a storage resource.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ActionSet(BTreeSet<StorageAction>);

impl ActionSet {
    /// Actions applicable to an online volume.
    #[must_use]
    pub fn online() -> Self {
        Self::from_iter([
            StorageAction::Offline,
            StorageAction::Backup,
            StorageAction::Snapshot,
            StorageAction::Resize,
        ])
    }

    /// Actions applicable to an offline volume.
    #[must_use]
    pub fn offline() -> Self {
        Self::from_iter([StorageAction::Online])
    }

    /// Whether `action` is currently applicable.
    #[must_use]
    pub fn contains(&self, action: StorageAction) -> bool {
        self.0.contains(&action)
    }

    /// Iterates the actions in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = StorageAction> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<StorageAction> for ActionSet {
    fn from_iter<I: IntoIterator<Item = StorageAction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// OCCI state of a storage resource.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageState {
    /// Usable.
    Online,
    /// Not usable.
    Offline,
    /// Freshly created and available.
    Active,
}

impl StorageState {
    /// Returns the OCCI spelling of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Active => "active",
        }
    }

    /// Projects a platform status onto the OCCI state and the actions that
    /// apply in it. Depends on the status alone.
    #[must_use]
    pub fn project(status: &VolumeStatus) -> (Self, ActionSet) {
        if status.is_online() {
            (Self::Online, ActionSet::online())
        } else {
            (Self::Offline, ActionSet::offline())
        }
    }
}

impl fmt::Display for StorageState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for StorageState {
    type Err = AttributeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            "active" => Ok(Self::Active),
            _ => Err(AttributeError::Invalid {
                name: STORAGE_STATE,
                value: value.to_owned(),
                reason: "expected online, offline, or active",
            }),
        }
    }
}

/// Typed view of the attributes of a storage resource.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StorageAttributes {
    /// Platform volume identifier.
    #[serde(rename = "occi.core.id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Display name.
    #[serde(rename = "occi.core.title", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Free-text description.
    #[serde(rename = "occi.core.summary", skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Size in GiB, as rendered to or received from the runtime.
    #[serde(rename = "occi.storage.size", skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// Projected state.
    #[serde(rename = "occi.storage.state", skip_serializing_if = "Option::is_none")]
    pub state: Option<StorageState>,
}

impl StorageAttributes {
    /// Parses a runtime attribute map.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Unknown`] for names outside the storage
    /// schema and [`AttributeError::Invalid`] for an unknown state.
    pub fn from_map(map: &AttributeMap) -> Result<Self, AttributeError> {
        let mut attributes = Self::default();
        for (name, value) in map {
            match name.as_str() {
                CORE_ID => attributes.id = Some(value.clone()),
                CORE_TITLE => attributes.title = Some(value.clone()),
                CORE_SUMMARY => attributes.summary = Some(value.clone()),
                STORAGE_SIZE => attributes.size = Some(value.clone()),
                STORAGE_STATE => attributes.state = Some(value.parse()?),
                other => return Err(AttributeError::Unknown(other.to_owned())),
            }
        }
        Ok(attributes)
    }

    /// Renders the attributes that are set.
    #[must_use]
    pub fn to_map(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        let fields = [
            (CORE_ID, self.id.clone()),
            (CORE_TITLE, self.title.clone()),
            (CORE_SUMMARY, self.summary.clone()),
            (STORAGE_SIZE, self.size.clone()),
            (STORAGE_STATE, self.state.map(|state| state.as_str().to_owned())),
        ];
        for (name, value) in fields {
            if let Some(present) = value {
                map.insert(name.to_owned(), present);
            }
        }
        map
    }

    /// Returns the volume identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::Missing`] when `occi.core.id` is unset.
    pub fn require_id(&self) -> Result<&str, AttributeError> {
        self.id.as_deref().ok_or(AttributeError::Missing(CORE_ID))
    }
}

/// Storage resource as returned to the runtime.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StorageEntity {
    /// Location of the resource (`/storage/<id>`), once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Resource attributes.
    pub attributes: StorageAttributes,
    /// Actions applicable right now.
    pub actions: ActionSet,
}

impl StorageEntity {
    /// Builds an entity around existing attributes. The location is derived
    /// from `occi.core.id` when it is set; no action is applicable yet.
    #[must_use]
    pub fn from_attributes(attributes: StorageAttributes) -> Self {
        Self {
            location: attributes.id.as_deref().map(storage_location),
            attributes,
            actions: ActionSet::default(),
        }
    }
}

/// Returns the location of a storage resource.
#[must_use]
pub fn storage_location(volume_id: &str) -> String {
    format!("{STORAGE_LOCATION}{volume_id}")
}

/// Parses an `occi.storage.size` value into whole GiB.
///
/// Accepts integral values with an optional all-zero fraction (`"10"`,
/// `"10.0"`).
///
/// # Errors
///
/// Returns [`AttributeError::Invalid`] for anything else.
pub fn parse_size_gib(raw: &str) -> Result<u32, AttributeError> {
    let invalid = |reason| AttributeError::Invalid {
        name: STORAGE_SIZE,
        value: raw.to_owned(),
        reason,
    };
    let trimmed = raw.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    if !fraction.chars().all(|ch| ch == '0') {
        return Err(invalid("size must be a whole number of GiB"));
    }
    let size: u32 = whole
        .parse()
        .map_err(|_| invalid("size must be a positive integer"))?;
    if size == 0 {
        return Err(invalid("size must be greater than zero"));
    }
    Ok(size)
}

/// Renders a platform size the way OCCI clients expect it (`"10.0"`).
#[must_use]
pub fn format_size_gib(size_gib: u32) -> String {
    format!("{:.1}", f64::from(size_gib))
}
