use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OrmDriverError;

/// `SQLite` journal modes accepted by `PRAGMA journal_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalMode {
    Delete,
    Truncate,
    Persist,
    Memory,
    Wal,
    Off,
}

impl JournalMode {
    #[must_use]
    pub fn as_pragma_value(self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Truncate => "TRUNCATE",
            JournalMode::Persist => "PERSIST",
            JournalMode::Memory => "MEMORY",
            JournalMode::Wal => "WAL",
            JournalMode::Off => "OFF",
        }
    }
}

/// Which side of a replicated setup a query runner is for.
///
/// File-backed drivers have a single physical connection and accept either tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationMode {
    #[default]
    Master,
    Slave,
}

/// Options for one driver instance. Immutable once handed to the driver.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Storage locator: a file path, a `file:` URI, or `:memory:`.
    #[serde(default)]
    pub database: String,
    /// SQLCipher encryption key. Connecting with a key requires the `sqlcipher` feature.
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub journal_mode: Option<JournalMode>,
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
}

impl DriverConfig {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn builder(database: impl Into<String>) -> DriverConfigBuilder {
        DriverConfigBuilder::new(database)
    }

    /// Parse options from JSON, e.g. `{"database": "./data/app.db", "journal_mode": "wal"}`.
    ///
    /// # Errors
    /// Returns `OrmDriverError::ConversionError` on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self, OrmDriverError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    /// Returns `OrmDriverError::ConfigError` naming the offending option.
    pub fn validate(&self) -> Result<(), OrmDriverError> {
        if self.database.trim().is_empty() {
            return Err(OrmDriverError::missing_option("database"));
        }
        if matches!(&self.key, Some(key) if key.is_empty()) {
            return Err(OrmDriverError::ConfigError {
                field: "key",
                reason: "must not be empty when set".into(),
            });
        }
        Ok(())
    }

    /// True for locators that never touch the filesystem.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        let db = self.database.trim();
        db == ":memory:" || db.starts_with("file::memory:") || db.contains("mode=memory")
    }

    /// Directory that must exist before the database file can be opened.
    ///
    /// `None` for in-memory databases and bare file names.
    #[must_use]
    pub fn storage_directory(&self) -> Option<&Path> {
        if self.is_in_memory() {
            return None;
        }
        let path = self.database.trim();
        // only URIs carry a query string; `?` is an ordinary character in a plain path
        let path = match path.strip_prefix("file:") {
            Some(uri) => uri.split('?').next().unwrap_or(uri),
            None => path,
        };
        Path::new(path)
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }
}

// Keeps the encryption key out of logs.
impl std::fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverConfig")
            .field("database", &self.database)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("journal_mode", &self.journal_mode)
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

/// Fluent builder for [`DriverConfig`].
#[derive(Debug, Clone)]
pub struct DriverConfigBuilder {
    opts: DriverConfig,
}

impl DriverConfigBuilder {
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            opts: DriverConfig::new(database),
        }
    }

    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.opts.key = Some(key.into());
        self
    }

    #[must_use]
    pub fn journal_mode(mut self, mode: JournalMode) -> Self {
        self.opts.journal_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn busy_timeout_ms(mut self, millis: u64) -> Self {
        self.opts.busy_timeout_ms = Some(millis);
        self
    }

    #[must_use]
    pub fn finish(self) -> DriverConfig {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_locator_is_rejected() {
        for db in ["", "   "] {
            let err = DriverConfig::new(db).validate().unwrap_err();
            assert!(matches!(
                err,
                OrmDriverError::ConfigError { field: "database", .. }
            ));
        }
        assert!(DriverConfig::new("app.db").validate().is_ok());
    }

    #[test]
    fn storage_directory_of_locators() {
        assert_eq!(
            DriverConfig::new("./data/app.db").storage_directory(),
            Some(Path::new("./data"))
        );
        assert_eq!(
            DriverConfig::new("file:/tmp/x/app.db?mode=rwc").storage_directory(),
            Some(Path::new("/tmp/x"))
        );
        assert_eq!(
            DriverConfig::new("./we?ird/app.db").storage_directory(),
            Some(Path::new("./we?ird"))
        );
        assert_eq!(DriverConfig::new("app.db").storage_directory(), None);
        assert_eq!(DriverConfig::new(":memory:").storage_directory(), None);
        assert!(DriverConfig::new("file::memory:?cache=shared").is_in_memory());
    }

    #[test]
    fn parses_json_options() {
        let cfg = DriverConfig::from_json(
            r#"{"database": "./data/app.db", "key": "s3cret", "journal_mode": "wal"}"#,
        )
        .unwrap();
        assert_eq!(cfg.database, "./data/app.db");
        assert_eq!(cfg.journal_mode, Some(JournalMode::Wal));
        assert!(!format!("{cfg:?}").contains("s3cret"));

        let missing = DriverConfig::from_json("{}").unwrap();
        assert!(missing.validate().is_err());
    }

    #[test]
    fn builder_sets_flags() {
        let cfg = DriverConfig::builder("db.sqlite")
            .key("k")
            .busy_timeout_ms(250)
            .journal_mode(JournalMode::Memory)
            .finish();
        assert_eq!(cfg.key.as_deref(), Some("k"));
        assert_eq!(cfg.busy_timeout_ms, Some(250));
        assert_eq!(cfg.journal_mode, Some(JournalMode::Memory));
    }
}
