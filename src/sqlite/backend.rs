use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::NativeError;
use crate::native::{NativeBackend, NativeConnection};
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::convert_params;
use super::worker::SqliteWorker;

/// Package name the `SQLite` driver asks its loader for.
pub const SQLITE_PACKAGE: &str = "rusqlite";

/// Native backend opening rusqlite connections, each on its own worker thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct RusqliteBackend;

impl RusqliteBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NativeBackend for RusqliteBackend {
    fn package(&self) -> &str {
        SQLITE_PACKAGE
    }

    async fn open(&self, locator: &str) -> Result<Arc<dyn NativeConnection>, NativeError> {
        let worker = SqliteWorker::open(locator).await?;
        debug!(worker = worker.id(), locator, "opened sqlite connection");
        Ok(Arc::new(RusqliteConnection { worker }))
    }
}

/// Worker-backed rusqlite connection.
pub struct RusqliteConnection {
    worker: SqliteWorker,
}

#[async_trait]
impl NativeConnection for RusqliteConnection {
    async fn execute_batch(&self, sql: &str) -> Result<(), NativeError> {
        self.worker.execute_batch(sql.to_owned()).await
    }

    async fn query(&self, sql: &str, params: &[RowValues]) -> Result<ResultSet, NativeError> {
        self.worker
            .query(sql.to_owned(), convert_params(params))
            .await
    }

    async fn close(&self) -> Result<(), NativeError> {
        self.worker.close().await
    }
}

impl fmt::Debug for RusqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RusqliteConnection")
            .field("worker", &self.worker.id())
            .finish()
    }
}
