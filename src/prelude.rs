//! Convenient imports for common functionality.
//!
//! ```rust
//! use orm_driver::prelude::*;
//! ```

pub use crate::alias::{Alias, AliasBinding, AliasKind, AliasRegistry};
pub use crate::config::{DriverConfig, DriverConfigBuilder, JournalMode, ReplicationMode};
pub use crate::driver::QueryRunner;
#[cfg(feature = "sqlite")]
pub use crate::driver::SqliteDriver;
pub use crate::error::OrmDriverError;
pub use crate::metadata::{EntityMetadata, EntityTarget, MetadataProvider, MetadataRegistry};
pub use crate::native::{BackendRegistry, DependencyLoader, NativeBackend, NativeConnection};
pub use crate::results::{CustomDbRow, ResultSet};
pub use crate::types::{ColumnDescriptor, ColumnType, RowValues};
