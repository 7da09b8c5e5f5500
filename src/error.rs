use thiserror::Error;

/// Error produced by a native backend (open, pragma, statement or close failure).
pub type NativeError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum OrmDriverError {
    #[error("Configuration error: option \"{field}\" {reason}")]
    ConfigError { field: &'static str, reason: String },

    #[error(
        "{driver} package has not been found installed. Try to install it: add `{package}` to your dependencies"
    )]
    DependencyMissing {
        driver: &'static str,
        package: &'static str,
    },

    #[error("Failed to load driver package `{package}`: {reason}")]
    DependencyLoad {
        package: &'static str,
        reason: String,
    },

    #[error("Connection error: {context}: {source}")]
    ConnectionError {
        context: String,
        #[source]
        source: NativeError,
    },

    #[error("Connection error: no open connection; call connect() first")]
    NotConnected,

    #[error("Query runner already released; create a new one from the driver")]
    QueryRunnerReleased,

    #[error("SQL execution error: {source} (query: {query})")]
    QueryFailed {
        query: String,
        #[source]
        source: NativeError,
    },

    #[error("Cannot get entity metadata for the given alias \"{name}\"")]
    UnresolvedAlias { name: String },

    #[error("Alias \"{name}\" is already registered in this query")]
    DuplicateAlias { name: String },

    #[error("Conversion error: {0}")]
    ConversionError(String),
}

impl OrmDriverError {
    pub(crate) fn connection(context: impl Into<String>, source: impl Into<NativeError>) -> Self {
        OrmDriverError::ConnectionError {
            context: context.into(),
            source: source.into(),
        }
    }

    pub(crate) fn missing_option(field: &'static str) -> Self {
        OrmDriverError::ConfigError {
            field,
            reason: "is not set".into(),
        }
    }
}

impl From<serde_json::Error> for OrmDriverError {
    fn from(err: serde_json::Error) -> Self {
        OrmDriverError::ConversionError(err.to_string())
    }
}
