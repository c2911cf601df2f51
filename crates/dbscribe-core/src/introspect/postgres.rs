//! PostgreSQL adapter over `information_schema` and the system catalogs.
//!
//! PostgreSQL has no `SHOW CREATE TABLE`. DDL comes from the
//! `show_create_table_schema` PL/pgSQL function, which [`install_helper`]
//! creates for the duration of one extraction and [`drop_helper`] removes.

use async_trait::async_trait;
use regex::Regex;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use std::sync::LazyLock;

use super::batch::enrich_concurrently;
use super::{guard_create, Driver, Schema, MAX_CONCURRENT_TABLES};
use crate::error::{Result, SchemaError};
use crate::types::{Column, ColumnKey, Table, AUTO_INCREMENT};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

const CREATE_HELPER: &str = include_str!("../../sql/show_create_table_schema.sql");
const DROP_HELPER: &str = include_str!("../../sql/drop_show_create_table_schema.sql");

static SEQUENCE_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^nextval\('([A-Za-z0-9_]+)'::regclass\)$").expect("valid regex")
});

// information_schema uses domain types (sql_identifier, cardinal_number,
// yes_or_no) that only decode after a cast to their base type.
const TABLES_QUERY: &str = r#"
    SELECT table_schema::text AS table_schema, table_name::text AS table_name
    FROM information_schema.tables
    WHERE table_schema = $1
      AND table_type = 'BASE TABLE'
      AND (cardinality($2::text[]) = 0 OR table_name::text = ANY($2::text[]))
    ORDER BY table_name ASC
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        c.table_schema::text AS table_schema,
        c.table_name::text AS table_name,
        c.column_name::text AS column_name,
        c.ordinal_position::bigint AS ordinal_position,
        c.column_default::text AS column_default,
        c.is_nullable::text AS is_nullable,
        c.data_type::text AS data_type,
        c.character_maximum_length::bigint AS character_maximum_length,
        c.character_octet_length::bigint AS character_octet_length,
        c.numeric_precision::bigint AS numeric_precision,
        c.numeric_scale::bigint AS numeric_scale,
        c.character_set_name::text AS character_set_name,
        c.collation_name::text AS collation_name,
        c.is_identity::text AS is_identity,
        (
            SELECT CASE tc.constraint_type
                       WHEN 'PRIMARY KEY' THEN 'PRI'
                       WHEN 'UNIQUE' THEN 'UNI'
                       ELSE 'MUL'
                   END
            FROM information_schema.key_column_usage k
            JOIN information_schema.table_constraints tc
              ON tc.constraint_schema = k.constraint_schema
             AND tc.constraint_name = k.constraint_name
            WHERE k.table_schema = c.table_schema
              AND k.table_name = c.table_name
              AND k.column_name = c.column_name
            ORDER BY CASE tc.constraint_type
                         WHEN 'PRIMARY KEY' THEN 1
                         WHEN 'UNIQUE' THEN 2
                         ELSE 3
                     END
            LIMIT 1
        ) AS column_key
    FROM information_schema.columns c
    WHERE c.table_schema = $1 AND c.table_name = $2
    ORDER BY c.ordinal_position ASC
"#;

const TABLE_COMMENT_QUERY: &str = r#"
    SELECT obj_description(c.oid, 'pg_class') AS table_comment
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    WHERE n.nspname = $1 AND c.relname = $2
    LIMIT 1
"#;

const COLUMN_COMMENT_QUERY: &str = r#"
    SELECT COALESCE(d.description, '') AS column_comment
    FROM pg_class c
    JOIN pg_namespace n ON n.oid = c.relnamespace
    JOIN pg_attribute a ON a.attrelid = c.oid
    JOIN pg_type t ON t.oid = a.atttypid
    JOIN pg_description d ON d.objoid = a.attrelid AND d.objsubid = a.attnum
    WHERE n.nspname = $1
      AND c.relname = $2
      AND a.attname = $3
      AND a.attnum > 0
    ORDER BY a.attnum ASC
    LIMIT 1
"#;

/// PostgreSQL dialect adapter.
pub struct PostgresSchema {
    pool: PgPool,
}

impl PostgresSchema {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn query_table_comment(&self, table: &Table) -> Result<String> {
        let row = sqlx::query(TABLE_COMMENT_QUERY)
            .bind(&table.database)
            .bind(&table.name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                SchemaError::query(e, format!("reading comment of {}.{}", table.database, table.name))
            })?;
        let comment = match row {
            Some(row) => row.try_get::<Option<String>, _>("table_comment").map_err(|e| {
                SchemaError::query(e, format!("decoding comment of {}.{}", table.database, table.name))
            })?,
            None => None,
        };
        Ok(comment.unwrap_or_default())
    }

    /// One lookup per column; a missing description is an empty comment.
    async fn query_column_comment(&self, schema: &str, table: &str, column: &str) -> Result<String> {
        let context = || format!("reading comment of {schema}.{table}.{column}");
        let row = sqlx::query(COLUMN_COMMENT_QUERY)
            .bind(schema)
            .bind(table)
            .bind(column)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SchemaError::query(e, context()))?;
        match row {
            Some(row) => row
                .try_get("column_comment")
                .map_err(|e| SchemaError::query(e, context())),
            None => Ok(String::new()),
        }
    }

    async fn enrich(&self, table: &mut Table) -> Result<()> {
        table.columns = self.query_columns(&table.database, &table.name).await?;
        table.comment = self.query_table_comment(table).await?;
        self.query_table_definition(table).await?;
        Ok(())
    }
}

#[async_trait]
impl Schema for PostgresSchema {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    async fn query_tables(&self, schema: &str, only: &[String]) -> Result<Vec<Table>> {
        let rows = sqlx::query(TABLES_QUERY)
            .bind(schema)
            .bind(only)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SchemaError::query(e, format!("listing PostgreSQL tables in {schema}")))?;

        rows.iter()
            .map(table_from_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| SchemaError::query(e, format!("decoding PostgreSQL tables in {schema}")))
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
            .map_err(|e| {
                SchemaError::query(e, format!("loading PostgreSQL columns of {schema}.{table}"))
            })?;

        let mut columns = rows
            .iter()
            .map(column_from_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| {
                SchemaError::query(e, format!("decoding PostgreSQL columns of {schema}.{table}"))
            })?;

        for column in columns.iter_mut().filter(|c| !c.name.is_empty()) {
            column.comment = self.query_column_comment(schema, table, &column.name).await?;
        }
        Ok(columns)
    }

    async fn query_table_definition(&self, table: &mut Table) -> Result<String> {
        let sequences = detect_auto_increment(table);

        let row = sqlx::query("SELECT show_create_table_schema($1, $2) AS definition")
            .bind(&table.database)
            .bind(&table.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                SchemaError::query(e, format!("reading DDL of {}.{}", table.database, table.name))
            })?;
        let created: Option<String> = row.try_get("definition").map_err(|e| {
            SchemaError::query(e, format!("decoding DDL of {}.{}", table.database, table.name))
        })?;

        table.definition = rewrite_definition(&created.unwrap_or_default(), &sequences);
        Ok(table.definition.clone())
    }

    async fn query_schemas(&self, tables: &mut [Table]) -> Result<()> {
        #[cfg(feature = "tracing")]
        debug!(tables = tables.len(), "enriching PostgreSQL tables");

        enrich_concurrently(tables, MAX_CONCURRENT_TABLES, |table| self.enrich(table)).await
    }
}

/// Create the DDL helper function.
pub(crate) async fn install_helper(pool: &PgPool) -> Result<()> {
    sqlx::raw_sql(CREATE_HELPER)
        .execute(pool)
        .await
        .map_err(|e| SchemaError::query(e, "installing show_create_table_schema"))?;

    #[cfg(feature = "tracing")]
    info!("installed show_create_table_schema");

    Ok(())
}

/// Drop the DDL helper function. Failures are logged, never returned.
pub(crate) async fn drop_helper(pool: &PgPool) {
    match sqlx::raw_sql(DROP_HELPER).execute(pool).await {
        Ok(_) => {
            #[cfg(feature = "tracing")]
            info!("dropped show_create_table_schema");
        }
        Err(_err) => {
            #[cfg(feature = "tracing")]
            warn!(error = %_err, "failed to drop show_create_table_schema");
        }
    }
}

fn table_from_row(row: &PgRow) -> std::result::Result<Table, sqlx::Error> {
    Ok(Table::new(
        row.try_get::<String, _>("table_schema")?,
        row.try_get::<String, _>("table_name")?,
    ))
}

fn column_from_row(row: &PgRow) -> std::result::Result<Column, sqlx::Error> {
    let mut column = Column::new(
        row.try_get::<String, _>("table_name")?,
        row.try_get::<String, _>("column_name")?,
    );
    column.database = row.try_get("table_schema")?;
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
    column.key = row
        .try_get::<Option<String>, _>("column_key")?
        .as_deref()
        .and_then(ColumnKey::from_code);
    let identity = row.try_get::<Option<String>, _>("is_identity")?;
    if identity.is_some_and(|value| value.eq_ignore_ascii_case("yes")) {
        column.extra = Some(AUTO_INCREMENT.to_string());
    }
    Ok(column)
}

/// Sequence named by a `nextval('<name>'::regclass)` default, ignoring any
/// double quotes inside the expression.
pub(crate) fn sequence_name(default: &str) -> Option<String> {
    let unquoted = default.replace('"', "");
    SEQUENCE_DEFAULT
        .captures(&unquoted)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_string())
}

/// Record the table's auto-increment column and return the sequences its
/// column defaults draw from, in column order. When several columns qualify
/// the last one wins.
pub(crate) fn detect_auto_increment(table: &mut Table) -> Vec<String> {
    let mut sequences = Vec::new();
    let mut auto_increment = None;
    for column in &table.columns {
        // The stored default keeps its quotes; they are ignored for matching only.
        let sequence = column.default.as_deref().and_then(sequence_name);
        let serial = sequence.is_some();
        if let Some(sequence) = sequence {
            if !sequences.contains(&sequence) {
                sequences.push(sequence);
            }
        }
        if serial || column.is_auto_increment() {
            auto_increment = Some(column.name.clone());
        }
    }
    if let Some(name) = auto_increment {
        table.auto_increment_column = name;
    }
    sequences
}

/// Guard tables and indexes with `IF NOT EXISTS` and prepend one
/// `CREATE SEQUENCE IF NOT EXISTS` line per sequence.
pub(crate) fn rewrite_definition(created: &str, sequences: &[String]) -> String {
    let guarded = guard_create(created, &["TABLE", "INDEX", "UNIQUE INDEX"]);
    let mut definition = String::new();
    for sequence in sequences {
        let line = format!("CREATE SEQUENCE IF NOT EXISTS {sequence} START 1;\n");
        if !guarded.contains(&line) {
            definition.push_str(&line);
        }
    }
    definition.push_str(&guarded);
    definition
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, default: Option<&str>) -> Column {
        let mut column = Column::new("orders", name);
        column.default = default.map(str::to_string);
        column
    }

    #[test]
    fn nextval_default_marks_auto_increment() {
        let mut table = Table::new("public", "orders");
        table.columns = vec![
            column("id", Some("nextval('orders_id_seq'::regclass)")),
            column("total", Some("0")),
        ];

        let sequences = detect_auto_increment(&mut table);
        assert_eq!(table.auto_increment_column, "id");
        assert_eq!(sequences, ["orders_id_seq"]);

        let ddl = rewrite_definition("CREATE TABLE public.orders (\n    id integer\n);", &sequences);
        assert_eq!(
            ddl,
            "CREATE SEQUENCE IF NOT EXISTS orders_id_seq START 1;\nCREATE TABLE IF NOT EXISTS public.orders (\n    id integer\n);"
        );
    }

    #[test]
    fn quoted_sequence_names_are_unquoted() {
        assert_eq!(
            sequence_name(r#"nextval('"Orders_id_seq"'::regclass)"#).as_deref(),
            Some("Orders_id_seq")
        );
        assert_eq!(sequence_name("nextval('public.orders_id_seq'::regclass)"), None);
        assert_eq!(sequence_name("now()"), None);
    }

    #[test]
    fn identity_column_is_auto_increment_without_sequence_line() {
        let mut table = Table::new("public", "events");
        let mut id = column("id", None);
        id.extra = Some(AUTO_INCREMENT.into());
        table.columns = vec![column("name", None), id];

        let sequences = detect_auto_increment(&mut table);
        assert!(sequences.is_empty());
        assert_eq!(table.auto_increment_column, "id");
    }

    #[test]
    fn last_serial_column_wins() {
        let mut table = Table::new("public", "t");
        table.columns = vec![
            column("a", Some("nextval('t_a_seq'::regclass)")),
            column("b", Some("nextval('t_b_seq'::regclass)")),
            column("c", None),
        ];

        let sequences = detect_auto_increment(&mut table);
        assert_eq!(table.auto_increment_column, "b");
        assert_eq!(sequences, ["t_a_seq", "t_b_seq"]);
    }

    #[test]
    fn quoted_default_is_kept_as_stored() {
        let stored = r#"nextval('"Orders_id_seq"'::regclass)"#;
        let mut table = Table::new("public", "Orders");
        table.columns = vec![column("id", Some(stored))];

        assert_eq!(detect_auto_increment(&mut table), ["Orders_id_seq"]);
        assert_eq!(table.columns[0].default.as_deref(), Some(stored));
    }

    #[test]
    fn no_sequence_leaves_auto_increment_empty() {
        let mut table = Table::new("public", "tags");
        table.columns = vec![column("name", Some("'x'::text"))];
        assert!(detect_auto_increment(&mut table).is_empty());
        assert!(table.auto_increment_column.is_empty());
    }

    #[test]
    fn rewrite_is_idempotent() {
        let created = "CREATE TABLE public.t (\n    id integer\n);\nCREATE UNIQUE INDEX t_a ON public.t USING btree (a);\nCREATE INDEX t_b ON public.t USING btree (b);";
        let sequences = vec!["t_id_seq".to_string()];
        let once = rewrite_definition(created, &sequences);
        assert!(once.contains("CREATE UNIQUE INDEX IF NOT EXISTS t_a"));
        assert!(once.contains("CREATE INDEX IF NOT EXISTS t_b"));
        assert_eq!(rewrite_definition(&once, &sequences), once);
    }
}
