//! Cross-table aggregation: selection, enrichment and post-processing.

use chrono::Utc;
use serde::Serialize;
use std::collections::HashSet;

use crate::config::Config;
use crate::error::Result;
use crate::filter::TableFilter;
use crate::introspect::{Driver, Schema};
use crate::types::Table;

#[cfg(feature = "tracing")]
use tracing::info;

/// Everything handed to the render pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    /// Selected tables in listing order.
    pub tables: Vec<Table>,
    /// Distinct column names across all tables, in first-seen order.
    pub all_table_columns: Vec<String>,
}

/// Select, enrich and post-process every table `config` asks for.
///
/// Tables keep the order the adapter listed them in. Any enrichment failure
/// fails the whole call; no partial catalog is returned.
pub async fn get_all_tables(
    config: &Config,
    filter: &TableFilter,
    schema: &dyn Schema,
) -> Result<Catalog> {
    let scope = scope(config, schema.driver());
    let listed = schema.query_tables(&scope, filter.only()).await?;

    #[cfg(feature = "tracing")]
    let listed_count = listed.len();

    let mut tables: Vec<Table> = listed
        .into_iter()
        .filter(|table| filter.allows(&table.name))
        .collect();

    #[cfg(feature = "tracing")]
    info!(
        scope = %scope,
        listed = listed_count,
        selected = tables.len(),
        "selected tables"
    );

    schema.query_schemas(&mut tables).await?;

    Ok(finish(config, tables, Utc::now().timestamp()))
}

/// Schema (PostgreSQL) or database (MySQL) the tables are listed from.
fn scope(config: &Config, driver: Driver) -> String {
    match driver {
        Driver::Postgres => config.database.schema_name().to_string(),
        Driver::Mysql => config.database.database_name().unwrap_or_default(),
        Driver::Sqlite => String::new(),
    }
}

/// Derive names and types, backfill comments and collect column names.
///
/// `timestamp` is shared by every table of one run.
fn finish(config: &Config, mut tables: Vec<Table>, timestamp: i64) -> Catalog {
    for table in &mut tables {
        if table.comment.is_empty() {
            table.comment = table.name.clone();
        }
        table.derive_names(&config.database.table_prefix, timestamp);
        for column in &mut table.columns {
            column.derive();
        }
    }

    backfill_comments(config, &mut tables);

    let mut seen = HashSet::new();
    let all_table_columns = tables
        .iter()
        .flat_map(|table| &table.columns)
        .filter(|column| seen.insert(column.name.as_str()))
        .map(|column| column.name.clone())
        .collect();

    Catalog {
        tables,
        all_table_columns,
    }
}

/// Fill comments that are empty or merely repeat the identifier.
fn backfill_comments(config: &Config, tables: &mut [Table]) {
    for table in tables {
        let Some(fallback) = config.comments.get(&table.name) else {
            continue;
        };
        if !fallback.comment.is_empty() && is_placeholder(&table.comment, &table.name) {
            table.comment = fallback.comment.clone();
        }
        for column in &mut table.columns {
            match fallback.columns.get(&column.name) {
                Some(comment) if !comment.is_empty() && is_placeholder(&column.comment, &column.name) => {
                    column.comment = comment.clone();
                }
                _ => {}
            }
        }
    }
}

fn is_placeholder(comment: &str, name: &str) -> bool {
    comment.is_empty() || comment == name
}
