//! Error types for schema introspection.
//!
//! Every failure on the way from configuration to rendered output is one
//! [`SchemaError`]. The only outcome that is deliberately *not* an error is a
//! missing comment row: an absent comment is represented as an empty string.

use std::path::PathBuf;
use thiserror::Error;

use crate::introspect::Driver;
#[cfg(feature = "templating")]
use crate::render::TemplateError;

/// Main error type for introspection and rendering.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Configuration is missing a required value or holds an invalid one.
    #[error("configuration error: {0}")]
    Config(String),

    /// A deny-list entry in `^...$` form is not a valid regular expression.
    #[error("invalid table pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The configured driver name is not one of mysql, postgres or sqlite.
    #[error("unsupported database driver: {0}")]
    UnsupportedDriver(String),

    /// Opening or verifying the database connection failed.
    #[error("failed to connect to {driver} database: {source}")]
    Connection {
        driver: Driver,
        #[source]
        source: sqlx::Error,
    },

    /// A catalog query failed.
    #[error("{context}: {source}")]
    Query {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    /// Reading a configuration or template file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Rendering the output template failed.
    #[cfg(feature = "templating")]
    #[error(transparent)]
    Template(#[from] TemplateError),
}

impl SchemaError {
    /// Create a Query error describing what was being fetched.
    pub fn query(source: sqlx::Error, context: impl Into<String>) -> Self {
        SchemaError::Query {
            context: context.into(),
            source,
        }
    }

    /// Create a Connection error for the given driver.
    pub fn connection(driver: Driver, source: sqlx::Error) -> Self {
        SchemaError::Connection { driver, source }
    }

    /// True for errors detected before any database access.
    pub fn is_config(&self) -> bool {
        match self {
            SchemaError::Config(_)
            | SchemaError::InvalidPattern { .. }
            | SchemaError::UnsupportedDriver(_)
            | SchemaError::Io { .. }
            | SchemaError::Yaml(_) => true,
            #[cfg(feature = "templating")]
            SchemaError::Template(TemplateError::MissingTemplate(_)) => true,
            _ => false,
        }
    }
}

/// Result type alias for introspection operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
