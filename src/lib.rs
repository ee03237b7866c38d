//! OCCI storage backends for OpenStack volumes.
//!
//! The crate translates lifecycle calls on OCCI `storage` resources and
//! `storagelink` links into calls against a cloud volume platform. Handlers
//! take explicit request values plus a [`RequestContext`] and return explicit
//! results; the hosting OCCI runtime merges them into its own entities.

pub mod config;
pub mod context;
pub mod error;
pub mod link;
pub mod occi;
pub mod openstack;
pub mod platform;
pub mod registry;
pub mod storage;
pub mod test_support;

pub use config::{ConfigError, OpenStackConfig};
pub use context::{RequestContext, TenantContext};
pub use error::AdapterError;
pub use link::{LinkState, StorageLink, StorageLinkBackend, StorageLinkRequest};
pub use occi::{
    ActionSet, AttributeError, AttributeMap, StorageAction, StorageAttributes, StorageEntity,
    StorageState,
};
pub use openstack::{ComputeRegistry, OpenStackError, OpenStackPlatform};
pub use platform::{
    AttachRequest, PlatformFuture, SnapshotRequest, VolumePlatform, VolumeRecord, VolumeSpec,
    VolumeStatus,
};
pub use registry::{MemoryRegistry, Registry, RegistryError, RegistryFuture, ResourceEntry};
pub use storage::{ActionOutcome, StorageBackend, StorageCreateRequest};
