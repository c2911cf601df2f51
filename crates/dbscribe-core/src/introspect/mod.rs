//! Dialect adapters and connection management.
//!
//! Each supported database implements [`Schema`] on top of its own sqlx pool.
//! [`Connection`] opens the pool for a [`DatabaseConfig`], hands out the
//! matching adapter and runs a complete extraction.

pub mod batch;
mod connection;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SchemaError};
use crate::types::{Column, Table};

pub use connection::Connection;
pub use mysql::MysqlSchema;
pub use postgres::PostgresSchema;
pub use sqlite::SqliteSchema;

/// Maximum number of tables enriched at the same time.
pub const MAX_CONCURRENT_TABLES: usize = 8;

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Mysql,
    Postgres,
    Sqlite,
}

impl Driver {
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::Mysql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }

    /// Port used when the configuration leaves it unset.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Driver::Mysql => Some(3306),
            Driver::Postgres => Some(5432),
            Driver::Sqlite => None,
        }
    }
}

impl FromStr for Driver {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(Driver::Mysql),
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            _ => Err(SchemaError::UnsupportedDriver(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform access to one database's catalog.
#[async_trait]
pub trait Schema: Send + Sync {
    fn driver(&self) -> Driver;

    /// Base tables in `schema`, ordered by name. A non-empty `only` restricts
    /// the result to exactly those names.
    async fn query_tables(&self, schema: &str, only: &[String]) -> Result<Vec<Table>>;

    /// Columns of one table in ordinal order. Returns nothing, without
    /// querying, when a required name is empty.
    async fn query_columns(&self, schema: &str, table: &str) -> Result<Vec<Column>>;

    /// Rebuild the table's DDL, storing it in `table.definition` and setting
    /// `table.auto_increment_column` when one is detected.
    async fn query_table_definition(&self, table: &mut Table) -> Result<String>;

    /// Attach columns, comments and DDL to every table.
    async fn query_schemas(&self, tables: &mut [Table]) -> Result<()>;
}

/// Make every `CREATE <object>` statement in `ddl` use `IF NOT EXISTS`.
///
/// Statements that already carry the guard are left as they are, so the
/// rewrite can be applied repeatedly. `objects` must list multi-word kinds
/// (`UNIQUE INDEX`) independently of their single-word suffix (`INDEX`).
pub(crate) fn guard_create(ddl: &str, objects: &[&str]) -> String {
    let mut guarded = ddl.to_string();
    for object in objects {
        let plain = format!("CREATE {object}");
        let guard = format!("CREATE {object} IF NOT EXISTS");
        guarded = guarded.replace(&guard, &plain).replace(&plain, &guard);
    }
    guarded
}
