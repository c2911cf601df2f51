//! Mapping from native column types to generated-code field types.

use schemars::JsonSchema;
use serde::Serialize;
use std::fmt;

/// Target-language semantic type of a column, independent of nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    /// 8-bit integer (`tinyint`)
    Int8,
    /// 16-bit integer (`smallint`, `smallserial`)
    Int16,
    /// Default-width integer (`int`, `integer`, `serial`)
    Int,
    /// 64-bit integer (`bigint`, `bigserial`)
    Int64,
    /// 64-bit float (`decimal`, `numeric`, `real`, `double`, `float`)
    Float64,
    /// Text, and anything not recognized
    String,
    /// Boolean (`bool`, `boolean`)
    Bool,
    /// Byte sequence (`blob` family, `binary`, `varbinary`, `bytea`)
    Bytes,
}

impl SemanticType {
    /// Map a normalized (lower-case, argument-free) type keyword.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "tinyint" => Self::Int8,
            "smallint" | "smallserial" => Self::Int16,
            "integer" | "serial" | "int" => Self::Int,
            "bigint" | "bigserial" => Self::Int64,
            "decimal" | "numeric" | "real" | "double precision" | "double" | "float" => {
                Self::Float64
            }
            "char" | "character" | "character varying" | "text" | "varchar" | "enum"
            | "mediumtext" | "longtext" => Self::String,
            "bool" | "boolean" => Self::Bool,
            "binary" | "varbinary" | "tinyblob" | "mediumblob" | "longblob" | "blob" | "bytea" => {
                Self::Bytes
            }
            _ => Self::String,
        }
    }

    /// Rust spelling of the type.
    pub fn rust_name(&self) -> &'static str {
        match self {
            Self::Int8 => "i8",
            Self::Int16 => "i16",
            Self::Int => "i32",
            Self::Int64 => "i64",
            Self::Float64 => "f64",
            Self::String => "String",
            Self::Bool => "bool",
            Self::Bytes => "Vec<u8>",
        }
    }
}

/// A resolved column type: the semantic type plus an optional marker.
///
/// Byte sequences are never optional; an empty sequence already signals
/// absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
pub struct FieldType {
    pub semantic: SemanticType,
    pub optional: bool,
}

impl FieldType {
    /// Resolve a field type from catalog attributes.
    ///
    /// `data_type` is the generic data-type keyword (MySQL, PostgreSQL);
    /// `declared_type` is used when it is absent or empty (SQLite).
    pub fn resolve(data_type: Option<&str>, declared_type: Option<&str>, nullable: bool) -> Self {
        let keyword = data_type
            .map(normalize_keyword)
            .filter(|keyword| !keyword.is_empty())
            .or_else(|| declared_type.map(normalize_keyword))
            .unwrap_or_default();
        let semantic = SemanticType::from_keyword(&keyword);
        Self {
            semantic,
            optional: nullable && semantic != SemanticType::Bytes,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.optional {
            write!(f, "Option<{}>", self.semantic.rust_name())
        } else {
            f.write_str(self.semantic.rust_name())
        }
    }
}

/// Lower-case a type keyword and drop any argument list: `VARCHAR(255)` → `varchar`.
fn normalize_keyword(raw: &str) -> String {
    let base = raw.split('(').next().unwrap_or_default();
    base.trim().to_lowercase()
}
