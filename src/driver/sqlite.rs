use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::{DriverConfig, ReplicationMode};
use crate::error::OrmDriverError;
use crate::native::{DependencyLoader, LoadError, NativeBackend, NativeConnection};
use crate::sqlite::SQLITE_PACKAGE;
use crate::storage::{FsProvisioner, StorageProvisioner, provision_storage};
use crate::types::{ColumnDescriptor, ColumnType, RowValues};

use super::file_family;
use super::{ConnectionSlot, QueryRunner};

/// Driver name used in dependency errors.
pub const SQLITE_DRIVER_NAME: &str = "SQLite";

/// Organizes communication with a `SQLite` database through an injected native backend.
///
/// Lifecycle transitions (`connect`, `disconnect`, `create_query_runner`) take `&mut self`, so the
/// owner serializes them; statements go through the single [`QueryRunner`].
pub struct SqliteDriver {
    config: DriverConfig,
    backend: Arc<dyn NativeBackend>,
    provisioner: Arc<dyn StorageProvisioner>,
    connection: Arc<ConnectionSlot>,
    query_runner: Option<QueryRunner>,
}

impl SqliteDriver {
    /// Validate `config`, then load the native backend through `loader`.
    ///
    /// # Errors
    /// `ConfigError` for a missing database option (the loader is not consulted),
    /// `DependencyMissing` when the loader has no `rusqlite` package, `DependencyLoad` when loading
    /// it failed for another reason.
    pub fn new(config: DriverConfig, loader: &dyn DependencyLoader) -> Result<Self, OrmDriverError> {
        config.validate()?;
        let backend = Self::load_dependencies(loader)?;
        debug!(database = %config.database, package = backend.package(), "sqlite driver created");
        Ok(Self {
            config,
            backend,
            provisioner: Arc::new(FsProvisioner),
            connection: Arc::new(RwLock::new(None)),
            query_runner: None,
        })
    }

    /// Replace the storage-directory provisioner used by [`SqliteDriver::connect`].
    #[must_use]
    pub fn with_provisioner(mut self, provisioner: Arc<dyn StorageProvisioner>) -> Self {
        self.provisioner = provisioner;
        self
    }

    fn load_dependencies(
        loader: &dyn DependencyLoader,
    ) -> Result<Arc<dyn NativeBackend>, OrmDriverError> {
        loader.load(SQLITE_PACKAGE).map_err(|err| match err {
            LoadError::NotFound => OrmDriverError::DependencyMissing {
                driver: SQLITE_DRIVER_NAME,
                package: SQLITE_PACKAGE,
            },
            LoadError::Failed(reason) => OrmDriverError::DependencyLoad {
                package: SQLITE_PACKAGE,
                reason,
            },
        })
    }

    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Open and configure the connection.
    ///
    /// Provisions the storage directory, opens the native connection, then applies every
    /// [`post_connect_statements`] entry in order. When a key is configured the backend must
    /// report a SQLCipher version right after `PRAGMA key`, otherwise the file would be written
    /// in plain text. The handle is stored only after all steps succeeded; on any failure it is
    /// closed and the driver stays disconnected. Calling this while connected returns the
    /// existing handle.
    ///
    /// # Errors
    /// `ConnectionError` wrapping the native error of the first failing step.
    pub async fn connect(&mut self) -> Result<Arc<dyn NativeConnection>, OrmDriverError> {
        if let Some(existing) = self.connection.read().await.as_ref() {
            debug!("sqlite driver already connected");
            return Ok(Arc::clone(existing));
        }

        let connection = self.create_database_connection().await?;
        *self.connection.write().await = Some(Arc::clone(&connection));
        info!(database = %self.config.database, "sqlite connection ready");
        Ok(connection)
    }

    async fn create_database_connection(
        &self,
    ) -> Result<Arc<dyn NativeConnection>, OrmDriverError> {
        provision_storage(self.provisioner.as_ref(), &self.config).await?;

        let connection = self
            .backend
            .open(&self.config.database)
            .await
            .map_err(|err| {
                OrmDriverError::connection(format!("failed to open {}", self.config.database), err)
            })?;

        if let Err(err) = self.configure(connection.as_ref()).await {
            if let Err(close_err) = connection.close().await {
                warn!(error = %close_err, "failed to close half-configured connection");
            }
            return Err(err);
        }
        Ok(connection)
    }

    async fn configure(&self, connection: &dyn NativeConnection) -> Result<(), OrmDriverError> {
        for (label, statement) in post_connect_statements(&self.config) {
            debug!(pragma = label, "applying post-connect configuration");
            connection.execute_batch(&statement).await.map_err(|err| {
                OrmDriverError::connection(format!("failed to apply PRAGMA {label}"), err)
            })?;
            if label == "key" {
                verify_cipher(connection).await?;
            }
        }
        Ok(())
    }

    /// Release the query runner, then close the connection.
    ///
    /// # Errors
    /// `NotConnected` if there is no open connection, `ConnectionError` if the native close fails.
    pub async fn disconnect(&mut self) -> Result<(), OrmDriverError> {
        if let Some(runner) = self.query_runner.take() {
            runner.release();
        }
        let connection = self
            .connection
            .write()
            .await
            .take()
            .ok_or(OrmDriverError::NotConnected)?;
        connection
            .close()
            .await
            .map_err(|err| OrmDriverError::connection("failed to close connection", err))?;
        info!(database = %self.config.database, "sqlite connection closed");
        Ok(())
    }

    /// The driver's query runner, created on first call and reused until disconnect.
    ///
    /// `SQLite` has one physical connection, so `mode` is recorded but does not pick a connection.
    pub fn create_query_runner(&mut self, mode: ReplicationMode) -> QueryRunner {
        if let Some(runner) = &self.query_runner {
            return runner.clone();
        }
        debug!(?mode, "creating sqlite query runner");
        let runner = QueryRunner::new(mode, Arc::downgrade(&self.connection));
        self.query_runner = Some(runner.clone());
        runner
    }

    /// Storage type for a column; binary payloads are stored as `blob`.
    #[must_use]
    pub fn normalize_type(&self, column: &ColumnDescriptor) -> String {
        if column.column_type == ColumnType::Binary {
            return "blob".to_string();
        }
        file_family::normalize_column_type(column)
    }

    #[must_use]
    pub fn escape(&self, name: &str) -> String {
        file_family::escape(name)
    }

    #[must_use]
    pub fn build_table_name(&self, table_name: &str, schema: Option<&str>) -> String {
        file_family::build_table_name(table_name, schema)
    }

    #[must_use]
    pub fn create_parameter(&self, index: usize) -> &'static str {
        file_family::create_parameter(index)
    }

    #[must_use]
    pub fn normalize_default(&self, column: &ColumnDescriptor) -> Option<String> {
        file_family::normalize_default(column)
    }

    /// # Errors
    /// Returns `ConversionError` when the value does not fit the column.
    pub fn preprocess_persistent_value(
        &self,
        column: &ColumnDescriptor,
        value: RowValues,
    ) -> Result<RowValues, OrmDriverError> {
        file_family::preprocess_persistent_value(column, value)
    }

    /// # Errors
    /// Returns `ConversionError` when the stored value does not fit the column.
    pub fn prepare_hydrated_value(
        &self,
        column: &ColumnDescriptor,
        value: RowValues,
    ) -> Result<RowValues, OrmDriverError> {
        file_family::prepare_hydrated_value(column, value)
    }
}

impl fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("config", &self.config)
            .field("backend", &self.backend.package())
            .field("query_runner", &self.query_runner)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
#[error("PRAGMA cipher_version returned no rows")]
struct CipherUnavailable;

/// Plain `SQLite` ignores `PRAGMA key`; only a SQLCipher build reports a cipher version.
async fn verify_cipher(connection: &dyn NativeConnection) -> Result<(), OrmDriverError> {
    const CONTEXT: &str = "encryption key configured but backend lacks SQLCipher";
    let result = connection
        .query("PRAGMA cipher_version;", &[])
        .await
        .map_err(|err| OrmDriverError::connection(CONTEXT, err))?;
    if result.is_empty() {
        return Err(OrmDriverError::connection(CONTEXT, CipherUnavailable));
    }
    debug!("sqlcipher key accepted");
    Ok(())
}

/// Statements applied right after opening, paired with a label safe to log.
///
/// Foreign keys are always enabled: cascades and relation cleanup rely on them.
#[must_use]
pub fn post_connect_statements(config: &DriverConfig) -> Vec<(&'static str, String)> {
    let mut statements = vec![("foreign_keys", "PRAGMA foreign_keys = ON;".to_string())];
    if let Some(key) = &config.key {
        statements.push((
            "key",
            format!("PRAGMA key = '{}';", key.replace('\'', "''")),
        ));
    }
    if let Some(mode) = config.journal_mode {
        statements.push((
            "journal_mode",
            format!("PRAGMA journal_mode = {};", mode.as_pragma_value()),
        ));
    }
    if let Some(millis) = config.busy_timeout_ms {
        statements.push(("busy_timeout", format!("PRAGMA busy_timeout = {millis};")));
    }
    statements
}
