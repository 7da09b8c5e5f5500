use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::thread;

use rusqlite::types::Value;
use tokio::sync::oneshot;

use crate::error::NativeError;
use crate::results::ResultSet;
use crate::sqlite::WorkerClosed;

use super::channel::Command;
use super::dispatcher::run_sqlite_worker;

static NEXT_WORKER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a thread that owns one `rusqlite::Connection`.
pub(in crate::sqlite) struct SqliteWorker {
    sender: Sender<Command>,
    id: u64,
}

impl SqliteWorker {
    /// Spawn the worker and open `locator` on it; resolves once the open has finished.
    pub(in crate::sqlite) async fn open(locator: &str) -> Result<Self, NativeError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = oneshot::channel::<rusqlite::Result<()>>();
        let id = NEXT_WORKER_ID.fetch_add(1, Ordering::Relaxed);
        let path = locator.to_owned();

        thread::Builder::new()
            .name(format!("sqlite-worker-{id}"))
            .spawn(move || match rusqlite::Connection::open(&path) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        run_sqlite_worker(conn, &receiver);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })?;

        ready_rx
            .await
            .map_err(|_| WorkerClosed("worker exited while opening"))??;
        Ok(Self { sender, id })
    }

    pub(in crate::sqlite) fn id(&self) -> u64 {
        self.id
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<rusqlite::Result<T>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, NativeError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .map_err(|_| WorkerClosed("connection already closed"))?;
        Ok(rx.await.map_err(|_| WorkerClosed(drop_message))??)
    }

    pub(in crate::sqlite) async fn execute_batch(&self, query: String) -> Result<(), NativeError> {
        self.request(
            |respond_to| Command::ExecuteBatch { query, respond_to },
            "worker dropped while executing batch",
        )
        .await
    }

    pub(in crate::sqlite) async fn query(
        &self,
        query: String,
        params: Vec<Value>,
    ) -> Result<ResultSet, NativeError> {
        self.request(
            |respond_to| Command::Query {
                query,
                params,
                respond_to,
            },
            "worker dropped while executing query",
        )
        .await
    }

    pub(in crate::sqlite) async fn close(&self) -> Result<(), NativeError> {
        self.request(
            |respond_to| Command::Close { respond_to },
            "worker dropped while closing",
        )
        .await
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}
