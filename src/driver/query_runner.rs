use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::debug;

use crate::config::ReplicationMode;
use crate::error::OrmDriverError;
use crate::native::NativeConnection;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::ConnectionSlot;

/// Dispatch point for statements against a driver's open connection.
///
/// Cloning yields the same runner; use [`QueryRunner::ptr_eq`] for identity. The runner does
/// not queue: callers must not overlap write statements through it.
#[derive(Clone)]
pub struct QueryRunner {
    inner: Arc<RunnerInner>,
}

struct RunnerInner {
    mode: ReplicationMode,
    released: AtomicBool,
    connection: Weak<ConnectionSlot>,
}

impl QueryRunner {
    pub(crate) fn new(mode: ReplicationMode, connection: Weak<ConnectionSlot>) -> Self {
        Self {
            inner: Arc::new(RunnerInner {
                mode,
                released: AtomicBool::new(false),
                connection,
            }),
        }
    }

    #[must_use]
    pub fn mode(&self) -> ReplicationMode {
        self.inner.mode
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::Acquire)
    }

    pub(crate) fn release(&self) {
        self.inner.released.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &QueryRunner) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    async fn connection(&self) -> Result<Arc<dyn NativeConnection>, OrmDriverError> {
        if self.is_released() {
            return Err(OrmDriverError::QueryRunnerReleased);
        }
        let slot = self
            .inner
            .connection
            .upgrade()
            .ok_or(OrmDriverError::QueryRunnerReleased)?;
        let guard = slot.read().await;
        guard.as_ref().map(Arc::clone).ok_or(OrmDriverError::NotConnected)
    }

    /// Execute one statement with bound parameters.
    ///
    /// # Errors
    /// `QueryRunnerReleased` after the driver disconnected, `NotConnected` before it connected,
    /// `QueryFailed` carrying the backend error otherwise.
    pub async fn query(
        &self,
        query: &str,
        params: &[RowValues],
    ) -> Result<ResultSet, OrmDriverError> {
        let conn = self.connection().await?;
        debug!(query, params = params.len(), "query runner executing statement");
        conn.query(query, params)
            .await
            .map_err(|source| OrmDriverError::QueryFailed {
                query: query.to_string(),
                source,
            })
    }

    /// Execute statements that return no rows.
    ///
    /// # Errors
    /// Same as [`QueryRunner::query`].
    pub async fn execute_batch(&self, query: &str) -> Result<(), OrmDriverError> {
        let conn = self.connection().await?;
        debug!(query, "query runner executing batch");
        conn.execute_batch(query)
            .await
            .map_err(|source| OrmDriverError::QueryFailed {
                query: query.to_string(),
                source,
            })
    }
}

impl fmt::Debug for QueryRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRunner")
            .field("mode", &self.inner.mode)
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::RwLock;

    #[tokio::test]
    async fn runner_without_connection_reports_not_connected() {
        let slot: Arc<ConnectionSlot> = Arc::new(RwLock::new(None));
        let runner = QueryRunner::new(ReplicationMode::Master, Arc::downgrade(&slot));
        let err = runner.query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, OrmDriverError::NotConnected));
    }

    #[tokio::test]
    async fn released_runner_refuses_work() {
        let slot: Arc<ConnectionSlot> = Arc::new(RwLock::new(None));
        let runner = QueryRunner::new(ReplicationMode::Slave, Arc::downgrade(&slot));
        let clone = runner.clone();
        runner.release();

        assert!(clone.is_released());
        assert!(clone.ptr_eq(&runner));
        assert_eq!(clone.mode(), ReplicationMode::Slave);
        let err = clone.execute_batch("SELECT 1").await.unwrap_err();
        assert!(matches!(err, OrmDriverError::QueryRunnerReleased));
    }

    #[tokio::test]
    async fn dropped_driver_slot_releases_runner() {
        let slot: Arc<ConnectionSlot> = Arc::new(RwLock::new(None));
        let runner = QueryRunner::new(ReplicationMode::Master, Arc::downgrade(&slot));
        drop(slot);
        let err = runner.query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, OrmDriverError::QueryRunnerReleased));
    }
}
