use std::sync::mpsc::Receiver;

use tracing::{trace, warn};

use crate::sqlite::query::run_statement;

use super::channel::Command;

/// Serve commands until `Close`, `Shutdown`, or every sender is gone.
///
/// Commands are handled strictly in arrival order, one at a time.
pub(super) fn run_sqlite_worker(conn: rusqlite::Connection, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::ExecuteBatch { query, respond_to } => {
                trace!(%query, "sqlite worker batch");
                let _ = respond_to.send(conn.execute_batch(&query));
            }
            Command::Query {
                query,
                params,
                respond_to,
            } => {
                trace!(%query, params = params.len(), "sqlite worker query");
                let _ = respond_to.send(run_statement(&conn, &query, &params));
            }
            Command::Close { respond_to } => {
                let _ = respond_to.send(conn.close().map_err(|(_, err)| err));
                return;
            }
            Command::Shutdown => break,
        }
    }
    if let Err((_, err)) = conn.close() {
        warn!(error = %err, "sqlite connection did not close cleanly");
    }
}
