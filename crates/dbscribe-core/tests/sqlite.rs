//! End-to-end extraction from real SQLite databases.

use dbscribe_core::introspect::SqliteSchema;
use dbscribe_core::{Config, Connection, Driver, Schema, SemanticType};
use rusqlite::Connection as SqliteConnection;
use std::path::Path;
use tempfile::{tempdir, TempDir};

/// Create a fixture database with a few related tables.
fn create_test_db(path: &Path) {
    let conn = SqliteConnection::open(path).expect("open sqlite db");

    conn.execute_batch(
        r#"
        CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email VARCHAR(255),
            avatar BLOB
        );

        CREATE TABLE orders (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES users(id),
            total DECIMAL(10,2) NOT NULL,
            note TEXT DEFAULT 'none'
        );

        CREATE TABLE log_2023 (id INTEGER);

        CREATE TABLE pre_settings (
            key TEXT NOT NULL,
            value TEXT
        );

        INSERT INTO users (name) VALUES ('alice');
        "#,
    )
    .expect("create test tables");
}

fn fixture(extra_yaml: &str) -> (TempDir, Config) {
    let dir = tempdir().expect("create temp dir");
    let db_path = dir.path().join("app.db");
    create_test_db(&db_path);

    let yaml = format!(
        "database:\n  driver: sqlite\n  data_source_name: '{}'\n{extra_yaml}",
        db_path.display()
    );
    let config = Config::from_yaml(&yaml).expect("valid config");
    (dir, config)
}

#[tokio::test]
async fn lists_tables_in_name_order_without_internal_tables() {
    let (_dir, config) = fixture("");
    let connection = Connection::open(&config.database).await.unwrap();
    assert_eq!(connection.driver(), Driver::Sqlite);

    let catalog = connection.extract(&config).await.unwrap();
    let names: Vec<_> = catalog.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["log_2023", "orders", "pre_settings", "users"]);
    assert!(catalog.tables.iter().all(|t| t.database.is_empty()));

    connection.close().await;
}

#[tokio::test]
async fn only_the_sqlite_underscore_prefix_is_internal() {
    let dir = tempdir().expect("create temp dir");
    let db_path = dir.path().join("prefix.db");
    let conn = SqliteConnection::open(&db_path).expect("open sqlite db");
    conn.execute_batch(
        r#"
        CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);
        CREATE TABLE sqliteusers (id INTEGER PRIMARY KEY, name TEXT);
        INSERT INTO users (name) VALUES ('a');
        "#,
    )
    .expect("create prefix tables");
    drop(conn);

    let yaml = format!(
        "database:\n  driver: sqlite\n  data_source_name: '{}'\n",
        db_path.display()
    );
    let config = Config::from_yaml(&yaml).expect("valid config");
    let connection = Connection::open(&config.database).await.unwrap();
    let catalog = connection.extract(&config).await.unwrap();
    connection.close().await;

    // sqlite_sequence exists because of AUTOINCREMENT but stays hidden.
    let names: Vec<_> = catalog.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["sqliteusers", "users"]);
}

#[tokio::test]
async fn columns_carry_ordinals_types_and_keys() {
    let (_dir, config) = fixture("only_table: [users]\n");
    let connection = Connection::open(&config.database).await.unwrap();
    let catalog = connection.extract(&config).await.unwrap();

    assert_eq!(catalog.tables.len(), 1);
    let users = &catalog.tables[0];
    let ordinals: Vec<_> = users.columns.iter().map(|c| c.ordinal_position).collect();
    assert_eq!(ordinals, [Some(0), Some(1), Some(2), Some(3)]);

    assert_eq!(users.auto_increment_column, "id");
    assert!(users.column("id").unwrap().is_auto_increment());

    let name = users.column("name").unwrap();
    assert_eq!(name.nullable, Some(false));
    assert_eq!(name.rust_type, "String");

    let email = users.column("email").unwrap();
    assert_eq!(email.column_type.as_deref(), Some("VARCHAR(255)"));
    assert_eq!(email.rust_type, "Option<String>");

    let avatar = users.column("avatar").unwrap();
    assert_eq!(avatar.field_type.map(|t| t.semantic), Some(SemanticType::Bytes));
    assert_eq!(avatar.rust_type, "Vec<u8>");

    assert!(users.definition.starts_with("CREATE TABLE IF NOT EXISTS users"));
    assert_eq!(users.comment, "users");
}

#[tokio::test]
async fn deny_list_prefix_and_comment_fallbacks_apply() {
    let extra = r#"
  table_prefix: pre_
disable_table:
  - "^log_.*$"
  - orders
comments:
  pre_settings:
    comment: runtime settings
    columns:
      key: setting key
"#;
    let (_dir, config) = fixture(extra);
    let connection = Connection::open(&config.database).await.unwrap();
    let catalog = connection.extract(&config).await.unwrap();

    let names: Vec<_> = catalog.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["pre_settings", "users"]);

    let settings = &catalog.tables[0];
    assert_eq!(settings.type_name, "Settings");
    assert!(settings.type_name_timestamp.starts_with("Settings"));
    assert_eq!(settings.comment, "runtime settings");
    assert_eq!(settings.column("key").unwrap().comment, "setting key");
    assert_eq!(settings.column("value").unwrap().comment, "");
    assert!(settings.auto_increment_column.is_empty());

    assert_eq!(
        catalog.all_table_columns,
        ["key", "value", "id", "name", "email", "avatar"]
    );
}

#[tokio::test]
async fn orders_default_and_decimal_type() {
    let (_dir, config) = fixture("only_table: [orders]\n");
    let connection = Connection::open(&config.database).await.unwrap();
    let catalog = connection.extract(&config).await.unwrap();

    let orders = &catalog.tables[0];
    assert_eq!(orders.column("note").unwrap().default.as_deref(), Some("'none'"));
    assert_eq!(orders.column("total").unwrap().rust_type, "f64");
    assert_eq!(orders.column("user_id").unwrap().rust_type, "i32");
}

#[tokio::test]
async fn empty_table_name_returns_no_columns() {
    let (_dir, config) = fixture("");
    let pool = sqlx::SqlitePool::connect(&format!("sqlite://{}", config.database.data_source_name))
        .await
        .unwrap();
    let schema = SqliteSchema::new(pool);

    assert!(schema.query_columns("", "").await.unwrap().is_empty());
    assert_eq!(schema.query_columns("", "log_2023").await.unwrap().len(), 1);
}

#[cfg(feature = "templating")]
#[tokio::test]
async fn renders_extracted_catalog() {
    use dbscribe_core::Renderer;

    let (_dir, config) = fixture("only_table: [users]\n");
    let connection = Connection::open(&config.database).await.unwrap();
    let catalog = connection.extract(&config).await.unwrap();

    let renderer = Renderer::new(
        "struct",
        "{% for t in tables %}\npub struct {{ t.type_name }} {\n{% for c in t.columns %}\n    pub {{ c.underline }}: {{ c.rust_type }},\n{% endfor %}\n}\n{% endfor %}\n",
    );
    let rendered = renderer.render(&catalog).unwrap();
    assert_eq!(
        rendered,
        "pub struct Users {\n    pub id: Option<i32>,\n    pub name: String,\n    pub email: Option<String>,\n    pub avatar: Vec<u8>,\n}\n"
    );
}
