//! MySQL adapter over `information_schema` and `SHOW CREATE TABLE`.

use async_trait::async_trait;
use regex::Regex;
use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::Row;
use std::sync::LazyLock;

use super::batch::enrich_concurrently;
use super::{guard_create, Driver, Schema, MAX_CONCURRENT_TABLES};
use crate::error::{Result, SchemaError};
use crate::types::{Column, ColumnKey, Table};

#[cfg(feature = "tracing")]
use tracing::debug;

static AUTO_INCREMENT_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(AUTO_INCREMENT|auto_increment)=\d+").expect("valid regex"));

// information_schema columns are cast so they decode the same way on every
// server version and collation.
const TABLES_QUERY: &str = r#"
    SELECT
        CAST(TABLE_SCHEMA AS CHAR) AS table_schema,
        CAST(TABLE_NAME AS CHAR) AS table_name,
        CAST(COALESCE(TABLE_COMMENT, '') AS CHAR) AS table_comment
    FROM information_schema.TABLES
    WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(TABLE_SCHEMA AS CHAR) AS table_schema,
        CAST(TABLE_NAME AS CHAR) AS table_name,
        CAST(COLUMN_NAME AS CHAR) AS column_name,
        CAST(ORDINAL_POSITION AS SIGNED) AS ordinal_position,
        CAST(COLUMN_DEFAULT AS CHAR) AS column_default,
        CAST(IS_NULLABLE AS CHAR) AS is_nullable,
        CAST(DATA_TYPE AS CHAR) AS data_type,
        CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS character_maximum_length,
        CAST(CHARACTER_OCTET_LENGTH AS SIGNED) AS character_octet_length,
        CAST(NUMERIC_PRECISION AS SIGNED) AS numeric_precision,
        CAST(NUMERIC_SCALE AS SIGNED) AS numeric_scale,
        CAST(CHARACTER_SET_NAME AS CHAR) AS character_set_name,
        CAST(COLLATION_NAME AS CHAR) AS collation_name,
        CAST(COALESCE(COLUMN_COMMENT, '') AS CHAR) AS column_comment,
        CAST(COLUMN_TYPE AS CHAR) AS column_type,
        CAST(COLUMN_KEY AS CHAR) AS column_key,
        CAST(EXTRA AS CHAR) AS extra
    FROM information_schema.COLUMNS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION ASC
"#;

/// MySQL dialect adapter.
pub struct MysqlSchema {
    pool: MySqlPool,
}

impl MysqlSchema {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn enrich(&self, table: &mut Table) -> Result<()> {
        table.columns = self.query_columns(&table.database, &table.name).await?;
        self.query_table_definition(table).await?;
        Ok(())
    }
}

#[async_trait]
impl Schema for MysqlSchema {
    fn driver(&self) -> Driver {
        Driver::Mysql
    }

    async fn query_tables(&self, schema: &str, only: &[String]) -> Result<Vec<Table>> {
        let mut sql = TABLES_QUERY.to_string();
        if !only.is_empty() {
            let placeholders = vec!["?"; only.len()].join(", ");
            sql.push_str(&format!("      AND TABLE_NAME IN ({placeholders})\n"));
        }
        sql.push_str("    ORDER BY TABLE_NAME ASC");

        let mut query = sqlx::query(&sql).bind(schema);
        for name in only {
            query = query.bind(name);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SchemaError::query(e, format!("listing MySQL tables in {schema}")))?;

        rows.iter()
            .map(table_from_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| SchemaError::query(e, format!("decoding MySQL tables in {schema}")))
    }

    async fn query_columns(&self, schema: &str, table: &str) -> Result<Vec<Column>> {
        if schema.is_empty() || table.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(COLUMNS_QUERY)
            .bind(schema)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SchemaError::query(e, format!("loading MySQL columns of {schema}.{table}")))?;

        rows.iter()
            .map(column_from_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| SchemaError::query(e, format!("decoding MySQL columns of {schema}.{table}")))
    }

    async fn query_table_definition(&self, table: &mut Table) -> Result<String> {
        if let Some(column) = table.columns.iter().rev().find(|c| c.is_auto_increment()) {
            table.auto_increment_column = column.name.clone();
        }

        let sql = format!(
            "SHOW CREATE TABLE {}.{}",
            quote_ident(&table.database),
            quote_ident(&table.name)
        );
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SchemaError::query(e, format!("reading DDL of {}.{}", table.database, table.name)))?;
        let created: String = row
            .try_get(1)
            .map_err(|e| SchemaError::query(e, format!("decoding DDL of {}.{}", table.database, table.name)))?;

        table.definition = rewrite_definition(&created);
        Ok(table.definition.clone())
    }

    async fn query_schemas(&self, tables: &mut [Table]) -> Result<()> {
        #[cfg(feature = "tracing")]
        debug!(tables = tables.len(), "enriching MySQL tables");

        enrich_concurrently(tables, MAX_CONCURRENT_TABLES, |table| self.enrich(table)).await
    }
}

fn table_from_row(row: &MySqlRow) -> std::result::Result<Table, sqlx::Error> {
    let mut table = Table::new(
        row.try_get::<String, _>("table_schema")?,
        row.try_get::<String, _>("table_name")?,
    );
    table.comment = row.try_get("table_comment")?;
    Ok(table)
}

fn column_from_row(row: &MySqlRow) -> std::result::Result<Column, sqlx::Error> {
    let mut column = Column::new(
        row.try_get::<String, _>("table_name")?,
        row.try_get::<String, _>("column_name")?,
    );
    column.database = row.try_get("table_schema")?;
    column.comment = row.try_get("column_comment")?;
    column.ordinal_position = row.try_get("ordinal_position")?;
    column.default = row.try_get("column_default")?;
    column.nullable = row
        .try_get::<Option<String>, _>("is_nullable")?
        .map(|value| !value.eq_ignore_ascii_case("no"));
    column.data_type = row.try_get("data_type")?;
    column.character_maximum_length = row.try_get("character_maximum_length")?;
    column.character_octet_length = row.try_get("character_octet_length")?;
    column.numeric_precision = row.try_get("numeric_precision")?;
    column.numeric_scale = row.try_get("numeric_scale")?;
    column.character_set_name = row.try_get("character_set_name")?;
    column.collation_name = row.try_get("collation_name")?;
    column.column_type = row.try_get("column_type")?;
    column.key = row
        .try_get::<Option<String>, _>("column_key")?
        .as_deref()
        .and_then(ColumnKey::from_code);
    column.extra = row
        .try_get::<Option<String>, _>("extra")?
        .filter(|extra| !extra.is_empty());
    Ok(column)
}

/// Guard `CREATE TABLE` and reset any auto-increment start value to 1.
pub(crate) fn rewrite_definition(created: &str) -> String {
    let guarded = guard_create(created, &["TABLE"]);
    AUTO_INCREMENT_START
        .replace_all(&guarded, "${1}=1")
        .into_owned()
}

fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_guarded_and_reset() {
        let created = "CREATE TABLE `orders` (\n  `id` bigint NOT NULL AUTO_INCREMENT,\n  PRIMARY KEY (`id`)\n) ENGINE=InnoDB AUTO_INCREMENT=4182 DEFAULT CHARSET=utf8mb4";
        let rewritten = rewrite_definition(created);
        assert!(rewritten.starts_with("CREATE TABLE IF NOT EXISTS `orders`"));
        assert!(rewritten.contains("ENGINE=InnoDB AUTO_INCREMENT=1 DEFAULT"));
        assert!(rewritten.contains("`id` bigint NOT NULL AUTO_INCREMENT,"));
        assert_eq!(rewrite_definition(&rewritten), rewritten);
    }

    #[test]
    fn lower_case_start_value_is_reset() {
        let rewritten = rewrite_definition("CREATE TABLE t (id int) auto_increment=99");
        assert_eq!(rewritten, "CREATE TABLE IF NOT EXISTS t (id int) auto_increment=1");
    }

    #[test]
    fn identifiers_are_backtick_quoted() {
        assert_eq!(quote_ident("orders"), "`orders`");
        assert_eq!(quote_ident("we`ird"), "`we``ird`");
    }
}
