//! Shared fixtures for storage BDD scenarios.

use std::cell::RefCell;

use chrono::NaiveDate;
use occi_storage::test_support::{ScriptedPlatform, ScriptedPlatformError};
use occi_storage::{
    AdapterError, MemoryRegistry, RequestContext, StorageBackend, StorageEntity, TenantContext,
};
use rstest::fixture;

use crate::test_constants::{AUTH_TOKEN, PROJECT_ID};

/// Calendar date used to name snapshots in scenarios.
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 6, 1).unwrap_or_else(|| panic!("2012-06-01 is a calendar date"))
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StorageFailure {
    pub status: u16,
    pub message: String,
}

impl From<&AdapterError<ScriptedPlatformError>> for StorageFailure {
    fn from(err: &AdapterError<ScriptedPlatformError>) -> Self {
        Self {
            status: err.http_status(),
            message: err.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub enum StorageResult {
    Success,
    Failure(StorageFailure),
}

pub struct StorageContext {
    pub platform: ScriptedPlatform,
    pub backend: StorageBackend<ScriptedPlatform>,
    pub tenant: TenantContext,
    pub registry: MemoryRegistry,
    pub entity: RefCell<Option<StorageEntity>>,
    pub outcome: RefCell<Option<StorageResult>>,
}

impl StorageContext {
    pub fn request_context(&self) -> RequestContext<'_> {
        RequestContext::new(&self.tenant, &self.registry)
    }

    pub fn record<T>(&self, result: Result<T, AdapterError<ScriptedPlatformError>>) -> Option<T> {
        match result {
            Ok(value) => {
                self.outcome.replace(Some(StorageResult::Success));
                Some(value)
            }
            Err(err) => {
                self.outcome
                    .replace(Some(StorageResult::Failure(StorageFailure::from(&err))));
                None
            }
        }
    }
}

#[fixture]
pub fn storage_context() -> StorageContext {
    let platform = ScriptedPlatform::new();
    StorageContext {
        backend: StorageBackend::new(platform.clone()).with_today(fixed_today),
        platform,
        tenant: TenantContext::new(PROJECT_ID, AUTH_TOKEN),
        registry: MemoryRegistry::new(),
        entity: RefCell::new(None),
        outcome: RefCell::new(None),
    }
}
