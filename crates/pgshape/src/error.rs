use camino::Utf8PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Boxed underlying cause of a failure.
pub type Cause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// The database could not be reached or refused us.
    #[error("connection failed: {0}")]
    Connection(#[source] Cause),

    /// A catalog query for a table (or `*` for schema-wide reads) failed.
    #[error("failed to introspect {schema}.{table}: {source}")]
    Introspection {
        schema: String,
        table: String,
        #[source]
        source: Cause,
    },

    /// Writing a generated artifact failed.
    #[error("failed to write {artifact} to {path}: {source}")]
    Emission {
        artifact: String,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The run configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn introspection(schema: &str, table: &str, source: impl Into<Cause>) -> Self {
        Error::Introspection {
            schema: schema.to_string(),
            table: table.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn connection(source: impl Into<Cause>) -> Self {
        Error::Connection(source.into())
    }
}

/// A catalog query did not finish within the configured timeout.
#[derive(Debug, Error)]
#[error("catalog query timed out after {0:?}")]
pub struct QueryTimeout(pub Duration);

/// The catalog returned no columns for a requested table.
#[derive(Debug, Error)]
#[error("table not found in catalog")]
pub struct TableNotFound;
