//! Multi-dialect schema introspection for code generation.
//!
//! `dbscribe-core` reads table and column metadata from MySQL, PostgreSQL or
//! SQLite, normalizes it into one [`Table`]/[`Column`] model and hands the
//! result to a template renderer.
//!
//! ```text
//! Config → [Connection] → Schema adapter → [aggregate] → Catalog → [render] → text
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod introspect;
pub mod naming;
#[cfg(feature = "templating")]
pub mod render;
pub mod types;

pub use aggregate::{get_all_tables, Catalog};
pub use config::{CommentConfig, Config, DatabaseConfig};
pub use error::{Result, SchemaError};
pub use filter::TableFilter;
pub use introspect::{Connection, Driver, Schema};
pub use naming::{camel, pascal, underline};
#[cfg(feature = "templating")]
pub use render::{Renderer, TemplateError};
pub use types::{Column, ColumnKey, FieldType, SemanticType, Table};
