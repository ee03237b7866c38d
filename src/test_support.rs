//! Test support utilities shared across unit and integration tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::context::TenantContext;
use crate::platform::{
    AttachRequest, PlatformFuture, SnapshotRequest, VolumePlatform, VolumeRecord, VolumeSpec,
    VolumeStatus,
};

/// Device the scripted platform assigns when the caller does not ask for one.
pub const DEFAULT_DEVICE: &str = "/dev/vdb";

/// Platform call recorded by [`ScriptedPlatform`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PlatformCall {
    /// `create_volume`
    CreateVolume(VolumeSpec),
    /// `get_volume`
    GetVolume(String),
    /// `delete_volume`
    DeleteVolume(String),
    /// `snapshot_volume`
    SnapshotVolume(SnapshotRequest),
    /// `attach_volume`
    AttachVolume(AttachRequest),
    /// `detach_volume`
    DetachVolume {
        /// Instance the volume was detached from.
        instance_id: String,
        /// Volume that was detached.
        volume_id: String,
    },
}

impl PlatformCall {
    /// Operation name, as accepted by [`ScriptedPlatform::fail_on`].
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::CreateVolume(_) => "create_volume",
            Self::GetVolume(_) => "get_volume",
            Self::DeleteVolume(_) => "delete_volume",
            Self::SnapshotVolume(_) => "snapshot_volume",
            Self::AttachVolume(_) => "attach_volume",
            Self::DetachVolume { .. } => "detach_volume",
        }
    }
}

/// Errors raised by the scripted platform.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ScriptedPlatformError {
    /// Failure injected through [`ScriptedPlatform::fail_on`].
    #[error("scripted {0} failure")]
    Injected(&'static str),
    /// The volume is unknown to the scripted platform.
    #[error("volume {0} not found")]
    VolumeNotFound(String),
}

#[derive(Debug)]
struct State {
    volumes: BTreeMap<String, VolumeRecord>,
    next_volume: u32,
    status_after_create: VolumeStatus,
    assigned_device: Option<String>,
    failing: Option<&'static str>,
    calls: Vec<PlatformCall>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            volumes: BTreeMap::new(),
            next_volume: 1,
            status_after_create: VolumeStatus::Available,
            assigned_device: None,
            failing: None,
            calls: Vec::new(),
        }
    }
}

/// In-memory [`VolumePlatform`] that records every call.
///
/// Volumes created through it are named `vol-1`, `vol-2`, and so on. The
/// create response reports `creating`; the status seen by the following
/// `get_volume` is set with [`ScriptedPlatform::set_status_after_create`].
#[derive(Clone, Debug, Default)]
pub struct ScriptedPlatform {
    state: Arc<Mutex<State>>,
}

impl ScriptedPlatform {
    /// Creates a platform with no volumes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds an existing volume.
    pub fn insert_volume(&self, volume: VolumeRecord) {
        self.lock().volumes.insert(volume.id.clone(), volume);
    }

    /// Sets the status newly created volumes settle in.
    pub fn set_status_after_create(&self, status: VolumeStatus) {
        self.lock().status_after_create = status;
    }

    /// Forces the device name returned by `attach_volume`.
    pub fn set_assigned_device(&self, device: impl Into<String>) {
        self.lock().assigned_device = Some(device.into());
    }

    /// Makes the named operation fail from now on.
    pub fn fail_on(&self, operation: &'static str) {
        self.lock().failing = Some(operation);
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.lock().calls.clone()
    }

    /// Returns how many calls were made to the named operation.
    #[must_use]
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    fn record(&self, call: PlatformCall) -> Result<MutexGuard<'_, State>, ScriptedPlatformError> {
        let mut state = self.lock();
        let operation = call.operation();
        state.calls.push(call);
        if state.failing == Some(operation) {
            return Err(ScriptedPlatformError::Injected(operation));
        }
        Ok(state)
    }

    fn lookup(state: &State, volume_id: &str) -> Result<VolumeRecord, ScriptedPlatformError> {
        state
            .volumes
            .get(volume_id)
            .cloned()
            .ok_or_else(|| ScriptedPlatformError::VolumeNotFound(volume_id.to_owned()))
    }
}

impl VolumePlatform for ScriptedPlatform {
    type Error = ScriptedPlatformError;

    fn create_volume<'a>(
        &'a self,
        spec: &'a VolumeSpec,
        _tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, VolumeRecord, Self::Error> {
        Box::pin(async move {
            let mut state = self.record(PlatformCall::CreateVolume(spec.clone()))?;
            let id = format!("vol-{}", state.next_volume);
            state.next_volume += 1;
            let settled = VolumeRecord {
                id: id.clone(),
                display_name: Some(spec.name.clone()),
                size_gib: spec.size_gib,
                status: state.status_after_create.clone(),
            };
            state.volumes.insert(id.clone(), settled);
            Ok(VolumeRecord {
                id,
                display_name: None,
                size_gib: spec.size_gib,
                status: VolumeStatus::Creating,
            })
        })
    }

    fn get_volume<'a>(
        &'a self,
        volume_id: &'a str,
        _tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, VolumeRecord, Self::Error> {
        Box::pin(async move {
            let state = self.record(PlatformCall::GetVolume(volume_id.to_owned()))?;
            Self::lookup(&state, volume_id)
        })
    }

    fn delete_volume<'a>(
        &'a self,
        volume_id: &'a str,
        _tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.record(PlatformCall::DeleteVolume(volume_id.to_owned()))?;
            state
                .volumes
                .remove(volume_id)
                .map(drop)
                .ok_or_else(|| ScriptedPlatformError::VolumeNotFound(volume_id.to_owned()))
        })
    }

    fn snapshot_volume<'a>(
        &'a self,
        request: &'a SnapshotRequest,
        _tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let state = self.record(PlatformCall::SnapshotVolume(request.clone()))?;
            Self::lookup(&state, &request.volume_id).map(drop)
        })
    }

    fn attach_volume<'a>(
        &'a self,
        request: &'a AttachRequest,
        _tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, String, Self::Error> {
        Box::pin(async move {
            let mut state = self.record(PlatformCall::AttachVolume(request.clone()))?;
            let device = state
                .assigned_device
                .clone()
                .or_else(|| request.device.clone())
                .unwrap_or_else(|| DEFAULT_DEVICE.to_owned());
            if let Some(volume) = state.volumes.get_mut(&request.volume_id) {
                volume.status = VolumeStatus::InUse;
            }
            Ok(device)
        })
    }

    fn detach_volume<'a>(
        &'a self,
        instance_id: &'a str,
        volume: &'a VolumeRecord,
        _tenant: &'a TenantContext,
    ) -> PlatformFuture<'a, (), Self::Error> {
        Box::pin(async move {
            let mut state = self.record(PlatformCall::DetachVolume {
                instance_id: instance_id.to_owned(),
                volume_id: volume.id.clone(),
            })?;
            if let Some(stored) = state.volumes.get_mut(&volume.id) {
                stored.status = VolumeStatus::Available;
            }
            Ok(())
        })
    }
}

/// Builds a volume record for seeding a [`ScriptedPlatform`].
#[must_use]
pub fn volume_record(id: &str, name: &str, size_gib: u32, status: &str) -> VolumeRecord {
    VolumeRecord {
        id: id.to_owned(),
        display_name: Some(name.to_owned()),
        size_gib,
        status: VolumeStatus::from(status),
    }
}
