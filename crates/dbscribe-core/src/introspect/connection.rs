//! Connection pools and one-shot extraction.

use sqlx::mysql::{MySql, MySqlConnectOptions, MySqlPool};
use sqlx::pool::PoolOptions;
use sqlx::postgres::{PgConnectOptions, PgPool, PgSslMode, Postgres};
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool};
use std::str::FromStr;
use std::time::Duration;

use super::{postgres, Driver, MysqlSchema, PostgresSchema, Schema, SqliteSchema};
use crate::aggregate::{self, Catalog};
use crate::config::{split_dsn_database, Config, DatabaseConfig};
use crate::error::{Result, SchemaError};

#[cfg(feature = "tracing")]
use tracing::info;

/// Upper bound on open connections.
const MAX_CONNECTIONS: u32 = 8;

/// Idle timeout and maximum lifetime of a pooled connection.
const CONNECTION_LIFETIME: Duration = Duration::from_secs(3 * 60);

/// How long to wait for a free connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

enum Pool {
    Mysql(MySqlPool),
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// An open, verified database connection pool.
pub struct Connection {
    pool: Pool,
}

impl Connection {
    /// Open a pool for the configured database and verify it with `SELECT 1`.
    pub async fn open(config: &DatabaseConfig) -> Result<Self> {
        let driver = config.driver()?;
        let pool = match driver {
            Driver::Mysql => {
                let options = mysql_options(config)?;
                let pool = pool_options::<MySql>()
                    .connect_with(options)
                    .await
                    .map_err(|e| SchemaError::connection(driver, e))?;
                Pool::Mysql(pool)
            }
            Driver::Postgres => {
                let options = postgres_options(config)?;
                let pool = pool_options::<Postgres>()
                    .connect_with(options)
                    .await
                    .map_err(|e| SchemaError::connection(driver, e))?;
                Pool::Postgres(pool)
            }
            Driver::Sqlite => {
                let options = sqlite_options(config)?;
                let pool = pool_options::<Sqlite>()
                    .connect_with(options)
                    .await
                    .map_err(|e| SchemaError::connection(driver, e))?;
                Pool::Sqlite(pool)
            }
        };

        let connection = Self { pool };
        connection.ping().await?;

        #[cfg(feature = "tracing")]
        info!(driver = %driver, "connected to database");

        Ok(connection)
    }

    pub fn driver(&self) -> Driver {
        match self.pool {
            Pool::Mysql(_) => Driver::Mysql,
            Pool::Postgres(_) => Driver::Postgres,
            Pool::Sqlite(_) => Driver::Sqlite,
        }
    }

    /// The dialect adapter for this connection.
    pub fn schema(&self) -> Box<dyn Schema> {
        match &self.pool {
            Pool::Mysql(pool) => Box::new(MysqlSchema::new(pool.clone())),
            Pool::Postgres(pool) => Box::new(PostgresSchema::new(pool.clone())),
            Pool::Sqlite(pool) => Box::new(SqliteSchema::new(pool.clone())),
        }
    }

    /// Run a complete extraction for `config`.
    ///
    /// On PostgreSQL the DDL helper function is installed first and dropped
    /// again afterwards, whether or not the extraction succeeded.
    pub async fn extract(&self, config: &Config) -> Result<Catalog> {
        let filter = config.table_filter()?;
        match &self.pool {
            Pool::Postgres(pool) => {
                postgres::install_helper(pool).await?;
                let schema = PostgresSchema::new(pool.clone());
                let result = aggregate::get_all_tables(config, &filter, &schema).await;
                postgres::drop_helper(pool).await;
                result
            }
            _ => {
                let schema = self.schema();
                aggregate::get_all_tables(config, &filter, schema.as_ref()).await
            }
        }
    }

    /// Close every pooled connection.
    pub async fn close(self) {
        match self.pool {
            Pool::Mysql(pool) => pool.close().await,
            Pool::Postgres(pool) => pool.close().await,
            Pool::Sqlite(pool) => pool.close().await,
        }
    }

    async fn ping(&self) -> Result<()> {
        let driver = self.driver();
        let result = match &self.pool {
            Pool::Mysql(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            Pool::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
            Pool::Sqlite(pool) => sqlx::query("SELECT 1").execute(pool).await.map(|_| ()),
        };
        result.map_err(|e| SchemaError::connection(driver, e))
    }
}

fn pool_options<DB: sqlx::Database>() -> PoolOptions<DB> {
    PoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .idle_timeout(CONNECTION_LIFETIME)
        .max_lifetime(CONNECTION_LIFETIME)
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

fn host(config: &DatabaseConfig) -> &str {
    match config.host.trim() {
        "" => "localhost",
        host => host,
    }
}

fn mysql_options(config: &DatabaseConfig) -> Result<MySqlConnectOptions> {
    if let Some(dsn) = config.dsn() {
        if dsn.contains("://") {
            return MySqlConnectOptions::from_str(dsn)
                .map_err(|e| SchemaError::Config(format!("invalid mysql data_source_name: {e}")));
        }
        return mysql_options_from_go_dsn(dsn);
    }

    let mut options = MySqlConnectOptions::new()
        .host(host(config))
        .port(config.port_or(3306))
        .username(&config.username);
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if let Some(database) = config.database_name() {
        options = options.database(&database);
    }
    Ok(options)
}

/// Parse the `user:password@tcp(host:port)/database?params` form.
fn mysql_options_from_go_dsn(dsn: &str) -> Result<MySqlConnectOptions> {
    let invalid = || SchemaError::Config(format!("invalid mysql data_source_name: {dsn}"));

    let (head, database) = split_dsn_database(dsn).ok_or_else(invalid)?;
    let (credentials, address) = match head.rsplit_once('@') {
        Some((credentials, address)) => (Some(credentials), address),
        None => (None, head),
    };

    let mut options = MySqlConnectOptions::new();
    if let Some(credentials) = credentials {
        let (user, password) = credentials.split_once(':').unwrap_or((credentials, ""));
        options = options.username(user);
        if !password.is_empty() {
            options = options.password(password);
        }
    }

    let address = match address.split_once('(') {
        Some((_, rest)) => rest.strip_suffix(')').ok_or_else(invalid)?,
        None => address,
    };
    if !address.is_empty() {
        match address.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| invalid())?;
                options = options.host(host).port(port);
            }
            None => options = options.host(address),
        }
    }
    if !database.is_empty() {
        options = options.database(database);
    }
    Ok(options)
}

fn postgres_options(config: &DatabaseConfig) -> Result<PgConnectOptions> {
    if let Some(dsn) = config.dsn() {
        return PgConnectOptions::from_str(dsn)
            .map_err(|e| SchemaError::Config(format!("invalid postgres data_source_name: {e}")));
    }

    let mut options = PgConnectOptions::new()
        .host(host(config))
        .port(config.port_or(5432))
        .username(&config.username)
        .ssl_mode(PgSslMode::Disable);
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }
    if let Some(database) = config.database_name() {
        options = options.database(&database);
    }
    Ok(options)
}

fn sqlite_options(config: &DatabaseConfig) -> Result<SqliteConnectOptions> {
    let dsn = config.dsn().ok_or_else(|| {
        SchemaError::Config("database.data_source_name is required for sqlite".into())
    })?;
    let options = if dsn.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(dsn)
            .map_err(|e| SchemaError::Config(format!("invalid sqlite data_source_name: {e}")))?
    } else {
        SqliteConnectOptions::new().filename(dsn)
    };
    Ok(options.create_if_missing(false).read_only(true))
}
