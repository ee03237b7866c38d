//! Per-call context threaded through every handler.

use std::fmt;

use crate::registry::Registry;

/// Authenticated tenant on whose behalf platform calls are made.
#[derive(Clone, Eq, PartialEq)]
pub struct TenantContext {
    /// Project (tenant) identifier the token is scoped to.
    pub project_id: String,
    /// Token sent as `X-Auth-Token` on every platform call.
    pub auth_token: String,
}

impl TenantContext {
    /// Creates a tenant context, trimming both fields.
    #[must_use]
    pub fn new(project_id: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into().trim().to_owned(),
            auth_token: auth_token.into().trim().to_owned(),
        }
    }
}

impl fmt::Debug for TenantContext {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TenantContext")
            .field("project_id", &self.project_id)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// Bundle handed to handlers by the hosting runtime for a single call.
#[derive(Clone, Copy)]
pub struct RequestContext<'a> {
    /// Tenant used to authorise platform calls.
    pub tenant: &'a TenantContext,
    /// Registry of resources currently known to the runtime.
    pub registry: &'a dyn Registry,
}

impl<'a> RequestContext<'a> {
    /// Bundles a tenant and a registry.
    #[must_use]
    pub const fn new(tenant: &'a TenantContext, registry: &'a dyn Registry) -> Self {
        Self { tenant, registry }
    }
}

impl fmt::Debug for RequestContext<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RequestContext")
            .field("tenant", self.tenant)
            .finish_non_exhaustive()
    }
}
