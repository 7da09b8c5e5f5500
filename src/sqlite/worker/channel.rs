use rusqlite::types::Value;
use tokio::sync::oneshot;

use crate::results::ResultSet;

pub(super) enum Command {
    ExecuteBatch {
        query: String,
        respond_to: oneshot::Sender<rusqlite::Result<()>>,
    },
    Query {
        query: String,
        params: Vec<Value>,
        respond_to: oneshot::Sender<rusqlite::Result<ResultSet>>,
    },
    Close {
        respond_to: oneshot::Sender<rusqlite::Result<()>>,
    },
    Shutdown,
}
