use serde::Serialize;

use super::field_type::FieldType;
use crate::naming;

/// Marker stored in [`Column::extra`] for auto-incrementing columns.
pub const AUTO_INCREMENT: &str = "auto_increment";

/// A table discovered in the database.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    /// Schema (PostgreSQL) or database (MySQL) name; empty for SQLite.
    pub database: String,
    /// Original table name.
    pub name: String,
    /// Table comment, falling back to `name` when the source has none.
    pub comment: String,
    /// Columns in ordinal order.
    pub columns: Vec<Column>,
    /// Reconstructed DDL, safe to apply more than once.
    pub definition: String,
    /// Name of the auto-incrementing column, empty if there is none.
    pub auto_increment_column: String,
    /// Pascal-case type name derived from `name` minus the table prefix.
    pub type_name: String,
    /// `type_name` suffixed with the generation timestamp.
    pub type_name_timestamp: String,
}

impl Table {
    pub fn new(database: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Look up a column by its original name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Derive the type names once; later calls keep the first result.
    pub fn derive_names(&mut self, table_prefix: &str, timestamp: i64) {
        if !self.type_name.is_empty() {
            return;
        }
        let base = if table_prefix.is_empty() {
            self.name.as_str()
        } else {
            self.name.strip_prefix(table_prefix).unwrap_or(&self.name)
        };
        self.type_name = naming::pascal(base);
        self.type_name_timestamp = format!("{}{}", self.type_name, timestamp);
    }
}

/// Key classification reported by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKey {
    Primary,
    Unique,
    Multiple,
}

impl ColumnKey {
    /// Parse catalog key codes (`PRI`, `UNI`, `MUL`); anything else is no key.
    pub fn from_code(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PRI" => Some(Self::Primary),
            "UNI" => Some(Self::Unique),
            "MUL" => Some(Self::Multiple),
            _ => None,
        }
    }
}

/// A column of a [`Table`].
///
/// `table` names the owning table rather than pointing at it, so a column
/// never keeps its table alive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Column {
    pub database: String,
    pub table: String,
    pub name: String,
    pub comment: String,
    /// Full declared type, e.g. `varchar(64)` or `int unsigned`.
    pub column_type: Option<String>,
    /// Generic data-type keyword, e.g. `varchar`.
    pub data_type: Option<String>,
    pub default: Option<String>,
    /// `None` when the catalog does not say; treated as nullable.
    pub nullable: Option<bool>,
    pub ordinal_position: Option<i64>,
    pub character_maximum_length: Option<i64>,
    pub character_octet_length: Option<i64>,
    pub numeric_precision: Option<i64>,
    pub numeric_scale: Option<i64>,
    pub character_set_name: Option<String>,
    pub collation_name: Option<String>,
    pub key: Option<ColumnKey>,
    /// Extra flags such as `auto_increment`.
    pub extra: Option<String>,

    pub camel: String,
    pub pascal: String,
    pub underline: String,
    pub field_type: Option<FieldType>,
    /// Display form of `field_type`, for templates.
    pub rust_type: String,
}

impl Column {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable != Some(false)
    }

    pub fn is_auto_increment(&self) -> bool {
        self.extra
            .as_deref()
            .is_some_and(|extra| extra.trim().eq_ignore_ascii_case(AUTO_INCREMENT))
    }

    /// Resolve the field type from the catalog attributes.
    pub fn resolve_type(&self) -> FieldType {
        FieldType::resolve(
            self.data_type.as_deref(),
            self.column_type.as_deref(),
            self.is_nullable(),
        )
    }

    /// Fill the naming variants and field type. A no-op once derived.
    pub fn derive(&mut self) {
        if self.field_type.is_some() {
            return;
        }
        self.camel = naming::camel(&self.name);
        self.pascal = naming::pascal(&self.name);
        self.underline = naming::underline(&self.name);
        let field_type = self.resolve_type();
        self.rust_type = field_type.to_string();
        self.field_type = Some(field_type);
    }
}
