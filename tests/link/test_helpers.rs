//! Shared fixtures for storage link BDD scenarios.

use std::cell::RefCell;

use occi_storage::test_support::{ScriptedPlatform, ScriptedPlatformError};
use occi_storage::{
    AdapterError, MemoryRegistry, RequestContext, StorageLink, StorageLinkBackend, TenantContext,
};
use rstest::fixture;

use crate::test_constants::{AUTH_TOKEN, PROJECT_ID};

#[derive(Clone, Debug)]
pub enum LinkResult {
    Success,
    Failure { status: u16, message: String },
}

pub struct LinkContext {
    pub platform: ScriptedPlatform,
    pub backend: StorageLinkBackend<ScriptedPlatform>,
    pub tenant: TenantContext,
    pub registry: MemoryRegistry,
    pub link: RefCell<Option<StorageLink>>,
    pub outcome: RefCell<Option<LinkResult>>,
}

impl LinkContext {
    pub fn request_context(&self) -> RequestContext<'_> {
        RequestContext::new(&self.tenant, &self.registry)
    }

    pub fn record<T>(&self, result: Result<T, AdapterError<ScriptedPlatformError>>) -> Option<T> {
        match result {
            Ok(value) => {
                self.outcome.replace(Some(LinkResult::Success));
                Some(value)
            }
            Err(err) => {
                self.outcome.replace(Some(LinkResult::Failure {
                    status: err.http_status(),
                    message: err.to_string(),
                }));
                None
            }
        }
    }
}

#[fixture]
pub fn link_context() -> LinkContext {
    let platform = ScriptedPlatform::new();
    LinkContext {
        backend: StorageLinkBackend::new(platform.clone()),
        platform,
        tenant: TenantContext::new(PROJECT_ID, AUTH_TOKEN),
        registry: MemoryRegistry::new(),
        link: RefCell::new(None),
        outcome: RefCell::new(None),
    }
}
