//! Configuration type definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// Connection parameters and introspection scope.
    pub database: DatabaseConfig,

    /// Tables to skip. Entries of the form `^...$` are regular expressions,
    /// everything else must match a table name exactly.
    pub disable_table: Vec<String>,

    /// Fallback comments keyed by table name. They only fill comments that
    /// are empty or merely repeat the identifier.
    pub comments: BTreeMap<String, CommentConfig>,

    /// Template for the `custom` command. Required by that command.
    pub template_file_custom: String,

    /// Template overriding the embedded `replace` template.
    pub template_file_replace: String,

    /// Template overriding the embedded `schema` template.
    pub template_file_schema: String,

    /// Template overriding the embedded `table` template.
    pub template_file_table: String,

    /// Only export these tables. When non-empty, `disable_table` is ignored.
    pub only_table: Vec<String>,
}

/// Database connection and scope settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `mysql`, `postgres` (or `postgresql`), `sqlite` (or `sqlite3`).
    pub driver: String,
    pub username: String,
    pub password: String,
    pub host: String,
    /// 0 selects the driver's default port.
    pub port: u16,
    /// Database (MySQL) or catalog (PostgreSQL) name.
    pub database: String,
    /// Connection URL. Takes precedence over the individual fields and is
    /// required for SQLite (a file path or `sqlite://` URL).
    pub data_source_name: String,
    /// PostgreSQL schema to introspect; `public` when empty.
    pub database_schema_name: String,
    /// Prefix stripped from table names before deriving type names.
    pub table_prefix: String,
}

/// Fallback comments for one table and its columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CommentConfig {
    pub comment: String,
    pub columns: BTreeMap<String, String>,
}
