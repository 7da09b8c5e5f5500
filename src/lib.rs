//! Connection and query-execution core of an ORM layer.
//!
//! [`SqliteDriver`] owns one backend connection: it validates its [`DriverConfig`], loads the
//! native backend through a [`DependencyLoader`], provisions the storage directory, opens the
//! connection and applies the mandatory pragmas before anyone can use it. Statements go through
//! the driver's single [`QueryRunner`]. Query construction resolves table references through
//! [`AliasBinding`]s, which refuse to hand out metadata that has not been bound yet.
//!
//! ```rust,no_run
//! use orm_driver::prelude::*;
//!
//! # async fn run() -> Result<(), OrmDriverError> {
//! let mut driver = SqliteDriver::new(
//!     DriverConfig::new("./data/app.db"),
//!     &BackendRegistry::with_defaults(),
//! )?;
//! driver.connect().await?;
//! let runner = driver.create_query_runner(ReplicationMode::Master);
//! let rows = runner.query("SELECT ?1 AS answer", &[RowValues::Int(42)]).await?;
//! assert_eq!(rows.results[0].get("answer"), Some(&RowValues::Int(42)));
//! driver.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod alias;
pub mod config;
pub mod driver;
pub mod error;
pub mod metadata;
pub mod native;
pub mod prelude;
pub mod results;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod storage;
pub mod types;

pub use alias::{Alias, AliasBinding, AliasKind, AliasRegistry};
pub use config::{DriverConfig, DriverConfigBuilder, JournalMode, ReplicationMode};
pub use driver::QueryRunner;
#[cfg(feature = "sqlite")]
pub use driver::SqliteDriver;
pub use error::{NativeError, OrmDriverError};
pub use metadata::{EntityMetadata, EntityTarget, MetadataProvider, MetadataRegistry};
pub use native::{BackendRegistry, DependencyLoader, LoadError, NativeBackend, NativeConnection};
pub use results::{CustomDbRow, ResultSet};
pub use types::{ColumnDescriptor, ColumnType, RowValues};
