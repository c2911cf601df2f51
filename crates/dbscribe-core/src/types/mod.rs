//! Dialect-independent table and column model.
//!
//! Dialect adapters fill the catalog attributes; the aggregator then derives
//! naming variants and the resolved [`FieldType`] of every column.

mod field_type;
mod model;

pub use field_type::{FieldType, SemanticType};
pub use model::{Column, ColumnKey, Table, AUTO_INCREMENT};
