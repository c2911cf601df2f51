//! SQLite adapter over `sqlite_master` and `pragma_table_info`.
//!
//! SQLite has no schemas and no comments: tables carry an empty database
//! name and every comment comes from configuration.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

use super::{guard_create, Driver, Schema};
use crate::error::{Result, SchemaError};
use crate::types::{Column, ColumnKey, Table, AUTO_INCREMENT};

#[cfg(feature = "tracing")]
use tracing::debug;

const TABLES_QUERY: &str = r#"
    SELECT name, sql
    FROM sqlite_master
    WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT cid, name, type, "notnull", dflt_value, pk
    FROM pragma_table_info(?)
    ORDER BY cid ASC
"#;

/// SQLite dialect adapter.
pub struct SqliteSchema {
    pool: SqlitePool,
}

impl SqliteSchema {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Schema for SqliteSchema {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    /// `schema` is ignored. The stored `CREATE TABLE` text becomes the
    /// table definition.
    async fn query_tables(&self, _schema: &str, only: &[String]) -> Result<Vec<Table>> {
        let mut sql = TABLES_QUERY.to_string();
        if !only.is_empty() {
            let placeholders = vec!["?"; only.len()].join(", ");
            sql.push_str(&format!("      AND name IN ({placeholders})\n"));
        }
        sql.push_str("    ORDER BY name ASC");

        let mut query = sqlx::query(&sql);
        for name in only {
            query = query.bind(name);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SchemaError::query(e, "listing SQLite tables"))?;

        rows.iter()
            .map(table_from_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| SchemaError::query(e, "decoding SQLite tables"))
    }

    /// Only `table` is required; SQLite has no schema to scope by.
    async fn query_columns(&self, _schema: &str, table: &str) -> Result<Vec<Column>> {
        if table.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(COLUMNS_QUERY)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SchemaError::query(e, format!("loading SQLite columns of {table}")))?;

        rows.iter()
            .map(|row| column_from_row(table, row))
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| SchemaError::query(e, format!("decoding SQLite columns of {table}")))
    }

    async fn query_table_definition(&self, table: &mut Table) -> Result<String> {
        Ok(table.definition.clone())
    }

    /// Enriches tables one after another.
    async fn query_schemas(&self, tables: &mut [Table]) -> Result<()> {
        #[cfg(feature = "tracing")]
        debug!(tables = tables.len(), "enriching SQLite tables");

        for table in tables.iter_mut() {
            table.columns = self.query_columns(&table.database, &table.name).await?;
            if let Some(column) = table.columns.iter().find(|c| c.is_auto_increment()) {
                table.auto_increment_column = column.name.clone();
            }
            self.query_table_definition(table).await?;
        }
        Ok(())
    }
}

fn table_from_row(row: &SqliteRow) -> std::result::Result<Table, sqlx::Error> {
    let mut table = Table::new("", row.try_get::<String, _>("name")?);
    let created: Option<String> = row.try_get("sql")?;
    table.definition = guard_create(&created.unwrap_or_default(), &["TABLE"]);
    Ok(table)
}

fn column_from_row(table: &str, row: &SqliteRow) -> std::result::Result<Column, sqlx::Error> {
    let mut column = Column::new(table, row.try_get::<String, _>("name")?);
    let declared: String = row.try_get("type")?;
    let not_null: i64 = row.try_get("notnull")?;
    let pk: i64 = row.try_get("pk")?;

    column.ordinal_position = Some(row.try_get("cid")?);
    column.column_type = Some(declared);
    column.nullable = Some(not_null == 0);
    column.default = row.try_get("dflt_value")?;
    if pk > 0 {
        column.key = Some(ColumnKey::Primary);
        column.extra = Some(AUTO_INCREMENT.to_string());
    }
    Ok(column)
}
