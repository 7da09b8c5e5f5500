// Driver layer: connection lifecycle, post-connect configuration, type normalization
// and the per-driver query runner.

pub mod file_family;
mod query_runner;
#[cfg(feature = "sqlite")]
mod sqlite;

pub use file_family::normalize_column_type;
pub use query_runner::QueryRunner;
#[cfg(feature = "sqlite")]
pub use sqlite::{SQLITE_DRIVER_NAME, SqliteDriver, post_connect_statements};

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::native::NativeConnection;

/// Slot holding the driver's open handle; shared weakly with its query runner.
pub(crate) type ConnectionSlot = RwLock<Option<Arc<dyn NativeConnection>>>;
