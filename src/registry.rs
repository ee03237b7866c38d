//! Registry seam used to check whether a compute resource is known yet.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::context::TenantContext;

/// Collection path under which compute resources are registered.
pub const COMPUTE_LOCATION: &str = "/compute/";

/// Returns the registry path of a compute resource.
#[must_use]
pub fn compute_path(instance_id: &str) -> String {
    format!("{COMPUTE_LOCATION}{instance_id}")
}

/// Resource returned by a successful registry lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceEntry {
    /// Path the resource is registered under.
    pub path: String,
}

/// Errors raised by registry lookups.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RegistryError {
    /// The path is not registered.
    #[error("resource {path} is not registered")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },
    /// The lookup itself failed.
    #[error("registry lookup for {path} failed: {message}")]
    Lookup {
        /// Path that was looked up.
        path: String,
        /// Description of the failure.
        message: String,
    },
}

/// Future returned by registry lookups.
pub type RegistryFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResourceEntry, RegistryError>> + Send + 'a>>;

/// Lookup service mapping resource paths to resources known to the runtime.
pub trait Registry: Send + Sync {
    /// Resolves `path`, failing with [`RegistryError::NotFound`] when the
    /// resource is not registered.
    fn get_resource<'a>(&'a self, path: &'a str, tenant: &'a TenantContext) -> RegistryFuture<'a>;
}

/// Registry backed by an in-memory set of paths.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    paths: Mutex<BTreeSet<String>>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a path.
    pub fn insert(&self, path: impl Into<String>) {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    /// Removes a path, returning whether it was registered.
    pub fn remove(&self, path: &str) -> bool {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
    }

    fn contains(&self, path: &str) -> bool {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
    }
}

impl Registry for MemoryRegistry {
    fn get_resource<'a>(
        &'a self,
        path: &'a str,
        _tenant: &'a TenantContext,
    ) -> RegistryFuture<'a> {
        Box::pin(async move {
            if self.contains(path) {
                Ok(ResourceEntry {
                    path: path.to_owned(),
                })
            } else {
                Err(RegistryError::NotFound {
                    path: path.to_owned(),
                })
            }
        })
    }
}
