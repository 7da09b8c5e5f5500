//! Seams between the driver and the native backend it drives.
//!
//! The driver never links a backend directly. It asks a [`DependencyLoader`] for a
//! [`NativeBackend`] by package name at construction time, and every statement it issues goes
//! through the [`NativeConnection`] that backend opened.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::NativeError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Opaque handle to one live native connection.
#[async_trait]
pub trait NativeConnection: Send + Sync + fmt::Debug {
    /// Run one or more statements that return no rows (pragmas, DDL).
    async fn execute_batch(&self, sql: &str) -> Result<(), NativeError>;

    /// Run a single statement with bound parameters.
    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, NativeError>;

    /// Close the connection. Further calls on this handle fail.
    async fn close(&self) -> Result<(), NativeError>;
}

/// A loaded backend module able to open connections.
#[async_trait]
pub trait NativeBackend: Send + Sync + fmt::Debug {
    /// Package identifier this backend was loaded under.
    fn package(&self) -> &str;

    async fn open(&self, locator: &str) -> Result<Arc<dyn NativeConnection>, NativeError>;
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("package not found")]
    NotFound,
    #[error("{0}")]
    Failed(String),
}

/// Resolves a package name to a backend.
pub trait DependencyLoader {
    /// # Errors
    /// `LoadError::NotFound` when no such package is available, `LoadError::Failed` otherwise.
    fn load(&self, package: &str) -> Result<Arc<dyn NativeBackend>, LoadError>;
}

/// In-process [`DependencyLoader`] keyed by package name.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn NativeBackend>>,
}

impl BackendRegistry {
    /// Empty registry; every load reports `NotFound`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the backends compiled into this crate.
    #[must_use]
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::RusqliteBackend::new()));
        registry
    }

    pub fn register(&mut self, backend: Arc<dyn NativeBackend>) {
        self.backends.insert(backend.package().to_string(), backend);
    }

    #[must_use]
    pub fn contains(&self, package: &str) -> bool {
        self.backends.contains_key(package)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("packages", &self.backends.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DependencyLoader for BackendRegistry {
    fn load(&self, package: &str) -> Result<Arc<dyn NativeBackend>, LoadError> {
        self.backends.get(package).cloned().ok_or(LoadError::NotFound)
    }
}

impl<F> DependencyLoader for F
where
    F: Fn(&str) -> Result<Arc<dyn NativeBackend>, LoadError>,
{
    fn load(&self, package: &str) -> Result<Arc<dyn NativeBackend>, LoadError> {
        self(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_reports_not_found() {
        let registry = BackendRegistry::new();
        assert!(matches!(registry.load("rusqlite"), Err(LoadError::NotFound)));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn defaults_include_rusqlite() {
        let registry = BackendRegistry::with_defaults();
        assert!(registry.contains("rusqlite"));
        let backend = registry.load("rusqlite").unwrap();
        assert_eq!(backend.package(), "rusqlite");
    }
}
