//! Engine pools, connections and transactions
//!
//! Each supported engine has its own sqlx pool type. The enums here close
//! over the three so the CRUD engine can run a [`Statement`] against any of
//! them, either on a pooled connection or inside an open transaction.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::{Database, Encode, MySql, Postgres, Sqlite, Transaction, Type};
use tracing::{debug, info};

use super::codec::ColumnValue;
use super::driver::{DriverKind, mysql, postgres, sqlite};
use super::error::{StorageError, StorageResult};
use super::statement::Statement;
use crate::config::PoolConfig;

pub(crate) const MEMORY_TARGET: &str = ":memory:";

/// Connection pool of one engine
#[derive(Debug, Clone)]
pub(crate) enum EnginePool {
    Sqlite(SqlitePool),
    Postgres(PgPool),
    MySql(MySqlPool),
}

impl EnginePool {
    pub async fn connect(kind: DriverKind, target: &str, config: &PoolConfig) -> StorageResult<Self> {
        let acquire_timeout = Duration::from_secs(config.acquire_timeout_secs);

        let pool = match kind {
            DriverKind::Sqlite => {
                let options = sqlite_options(target)?;
                let mut pool_options = SqlitePoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(acquire_timeout);

                // Every connection to an in-memory database opens a new one,
                // so a single connection is kept open for the pool's lifetime
                if is_memory(target) {
                    pool_options = pool_options
                        .max_connections(1)
                        .min_connections(1)
                        .idle_timeout(None)
                        .max_lifetime(None);
                }

                let pool = pool_options
                    .connect_with(options)
                    .await
                    .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
                EnginePool::Sqlite(pool)
            }
            DriverKind::Postgres => {
                let options = PgConnectOptions::from_str(target)
                    .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
                EnginePool::Postgres(pool)
            }
            DriverKind::MySql => {
                let options = MySqlConnectOptions::from_str(target)
                    .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(config.max_connections)
                    .acquire_timeout(acquire_timeout)
                    .connect_with(options)
                    .await
                    .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;
                EnginePool::MySql(pool)
            }
        };

        info!("{} connection pool created", kind);
        Ok(pool)
    }

    pub async fn acquire(&self) -> StorageResult<PoolConn> {
        Ok(match self {
            EnginePool::Sqlite(pool) => PoolConn::Sqlite(pool.acquire().await?),
            EnginePool::Postgres(pool) => PoolConn::Postgres(pool.acquire().await?),
            EnginePool::MySql(pool) => PoolConn::MySql(pool.acquire().await?),
        })
    }

    pub async fn begin(&self) -> StorageResult<EngineTx> {
        Ok(match self {
            EnginePool::Sqlite(pool) => EngineTx::Sqlite(pool.begin().await?),
            EnginePool::Postgres(pool) => EngineTx::Postgres(pool.begin().await?),
            EnginePool::MySql(pool) => EngineTx::MySql(pool.begin().await?),
        })
    }

    /// Run unparameterized statements (DDL) in order
    pub async fn execute_batch(&self, statements: &[String]) -> StorageResult<()> {
        for sql in statements {
            let result = match self {
                EnginePool::Sqlite(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
                EnginePool::Postgres(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
                EnginePool::MySql(pool) => sqlx::raw_sql(sql).execute(pool).await.map(|_| ()),
            };
            result.map_err(|e| StorageError::SchemaFailed(e.to_string()))?;
        }
        Ok(())
    }

    pub async fn ping(&self) -> StorageResult<()> {
        match self {
            EnginePool::Sqlite(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            EnginePool::Postgres(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
            EnginePool::MySql(pool) => {
                sqlx::query("SELECT 1").execute(pool).await?;
            }
        }
        Ok(())
    }

    /// Open and idle connection counts
    pub fn stats(&self) -> (u32, usize) {
        match self {
            EnginePool::Sqlite(pool) => (pool.size(), pool.num_idle()),
            EnginePool::Postgres(pool) => (pool.size(), pool.num_idle()),
            EnginePool::MySql(pool) => (pool.size(), pool.num_idle()),
        }
    }

    pub async fn close(&self) {
        match self {
            EnginePool::Sqlite(pool) => pool.close().await,
            EnginePool::Postgres(pool) => pool.close().await,
            EnginePool::MySql(pool) => pool.close().await,
        }
    }
}

fn is_memory(target: &str) -> bool {
    matches!(target, MEMORY_TARGET | "sqlite::memory:" | "sqlite://:memory:")
}

fn sqlite_options(target: &str) -> StorageResult<SqliteConnectOptions> {
    let options = if is_memory(target) {
        SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?
    } else if target.starts_with("sqlite:") {
        SqliteConnectOptions::from_str(target)
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?
    } else {
        SqliteConnectOptions::new().filename(target)
    };

    Ok(options
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30))
        .foreign_keys(true))
}

/// Connection checked out of a pool for a single operation
pub(crate) enum PoolConn {
    Sqlite(PoolConnection<Sqlite>),
    Postgres(PoolConnection<Postgres>),
    MySql(PoolConnection<MySql>),
}

impl PoolConn {
    pub fn conn(&mut self) -> Conn<'_> {
        match self {
            PoolConn::Sqlite(c) => Conn::Sqlite(&mut **c),
            PoolConn::Postgres(c) => Conn::Postgres(&mut **c),
            PoolConn::MySql(c) => Conn::MySql(&mut **c),
        }
    }
}

/// Open transaction on one engine; rolled back by sqlx when dropped
pub(crate) enum EngineTx {
    Sqlite(Transaction<'static, Sqlite>),
    Postgres(Transaction<'static, Postgres>),
    MySql(Transaction<'static, MySql>),
}

impl EngineTx {
    pub fn conn(&mut self) -> Conn<'_> {
        match self {
            EngineTx::Sqlite(tx) => Conn::Sqlite(&mut **tx),
            EngineTx::Postgres(tx) => Conn::Postgres(&mut **tx),
            EngineTx::MySql(tx) => Conn::MySql(&mut **tx),
        }
    }

    pub async fn commit(self) -> StorageResult<()> {
        match self {
            EngineTx::Sqlite(tx) => tx.commit().await?,
            EngineTx::Postgres(tx) => tx.commit().await?,
            EngineTx::MySql(tx) => tx.commit().await?,
        }
        Ok(())
    }

    pub async fn rollback(self) -> StorageResult<()> {
        match self {
            EngineTx::Sqlite(tx) => tx.rollback().await?,
            EngineTx::Postgres(tx) => tx.rollback().await?,
            EngineTx::MySql(tx) => tx.rollback().await?,
        }
        Ok(())
    }
}

/// Borrowed connection statements run on
pub(crate) enum Conn<'c> {
    Sqlite(&'c mut SqliteConnection),
    Postgres(&'c mut PgConnection),
    MySql(&'c mut MySqlConnection),
}

impl Conn<'_> {
    /// Execute a statement, returning the number of affected rows
    pub async fn execute(&mut self, stmt: &Statement) -> StorageResult<u64> {
        debug!(sql = %stmt.sql, args = stmt.args.len(), "execute");

        let affected = match self {
            Conn::Sqlite(c) => bind_args::<Sqlite>(stmt).execute(&mut **c).await?.rows_affected(),
            Conn::Postgres(c) => bind_args::<Postgres>(stmt).execute(&mut **c).await?.rows_affected(),
            Conn::MySql(c) => bind_args::<MySql>(stmt).execute(&mut **c).await?.rows_affected(),
        };
        Ok(affected)
    }

    /// Fetch at most one row as scanned column values
    pub async fn fetch_optional(&mut self, stmt: &Statement) -> StorageResult<Option<Vec<ColumnValue>>> {
        debug!(sql = %stmt.sql, args = stmt.args.len(), "fetch_optional");

        match self {
            Conn::Sqlite(c) => bind_args::<Sqlite>(stmt)
                .fetch_optional(&mut **c)
                .await?
                .map(|row| sqlite::scan_row(&row))
                .transpose(),
            Conn::Postgres(c) => bind_args::<Postgres>(stmt)
                .fetch_optional(&mut **c)
                .await?
                .map(|row| postgres::scan_row(&row))
                .transpose(),
            Conn::MySql(c) => bind_args::<MySql>(stmt)
                .fetch_optional(&mut **c)
                .await?
                .map(|row| mysql::scan_row(&row))
                .transpose(),
        }
    }

    /// Stream every row of a statement into scanned column values
    pub async fn fetch_all(&mut self, stmt: &Statement) -> StorageResult<Vec<Vec<ColumnValue>>> {
        debug!(sql = %stmt.sql, args = stmt.args.len(), "fetch_all");

        let mut rows = Vec::new();
        match self {
            Conn::Sqlite(c) => {
                let query = bind_args::<Sqlite>(stmt);
                let mut stream = query.fetch(&mut **c);
                while let Some(row) = stream.try_next().await? {
                    rows.push(sqlite::scan_row(&row)?);
                }
            }
            Conn::Postgres(c) => {
                let query = bind_args::<Postgres>(stmt);
                let mut stream = query.fetch(&mut **c);
                while let Some(row) = stream.try_next().await? {
                    rows.push(postgres::scan_row(&row)?);
                }
            }
            Conn::MySql(c) => {
                let query = bind_args::<MySql>(stmt);
                let mut stream = query.fetch(&mut **c);
                while let Some(row) = stream.try_next().await? {
                    rows.push(mysql::scan_row(&row)?);
                }
            }
        }
        Ok(rows)
    }
}

/// Bind column values positionally onto a query
///
/// JSON payloads are bound as text when they are valid UTF-8 so structured
/// columns stay TEXT on every engine.
fn bind_args<'q, DB>(stmt: &'q Statement) -> sqlx::query::Query<'q, DB, <DB as Database>::Arguments<'q>>
where
    DB: Database,
    bool: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    Vec<u8>: Encode<'q, DB> + Type<DB>,
    DateTime<Utc>: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
{
    let mut query = sqlx::query::<DB>(&stmt.sql);
    for value in &stmt.args {
        query = match value {
            ColumnValue::Null => query.bind(Option::<String>::None),
            ColumnValue::Bool(v) => query.bind(*v),
            ColumnValue::Integer(v) => query.bind(*v),
            ColumnValue::Float(v) => query.bind(*v),
            ColumnValue::Text(v) => query.bind(v.clone()),
            ColumnValue::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => query.bind(text.to_string()),
                Err(_) => query.bind(bytes.clone()),
            },
            ColumnValue::Timestamp(v) => query.bind(*v),
        };
    }
    query
}
