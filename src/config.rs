use std::path::PathBuf;

use tracing::trace;

use crate::storage::{DriverKind, StorageError, StorageResult};

/// Storage configuration
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub pool: PoolConfig,
}

impl StorageConfig {
    pub fn validate(&self) -> StorageResult<()> {
        self.backend.validate()?;
        if self.pool.max_connections == 0 {
            return Err(StorageError::InvalidConfig(
                "pool.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Database engine and connection settings
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "driver", rename_all = "lowercase")]
pub enum BackendConfig {
    /// SQLite database file (default)
    #[serde(alias = "sqlite3")]
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },

    #[serde(alias = "postgresql", alias = "pgsql")]
    Postgres {
        #[serde(default = "default_host")]
        host: String,
        #[serde(default = "default_pgsql_port")]
        port: u16,
        #[serde(default = "default_dbname")]
        dbname: String,
        #[serde(default = "default_pgsql_user")]
        user: String,
        #[serde(default)]
        password: String,
        #[serde(default = "default_sslmode")]
        sslmode: String,
    },

    #[serde(rename = "mysql")]
    MySql {
        #[serde(default = "default_mysql_address")]
        address: String,
        #[serde(default = "default_dbname")]
        dbname: String,
        #[serde(default = "default_mysql_user")]
        user: String,
        #[serde(default)]
        password: String,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

impl BackendConfig {
    pub fn kind(&self) -> DriverKind {
        match self {
            BackendConfig::Sqlite { .. } => DriverKind::Sqlite,
            BackendConfig::Postgres { .. } => DriverKind::Postgres,
            BackendConfig::MySql { .. } => DriverKind::MySql,
        }
    }

    fn validate(&self) -> StorageResult<()> {
        let missing = match self {
            BackendConfig::Sqlite { path } if path.as_os_str().is_empty() => Some("path"),
            BackendConfig::Postgres { host, dbname, .. } if host.is_empty() || dbname.is_empty() => {
                Some("host and dbname")
            }
            BackendConfig::MySql { address, dbname, .. }
                if address.is_empty() || dbname.is_empty() =>
            {
                Some("address and dbname")
            }
            _ => None,
        };

        match missing {
            Some(what) => Err(StorageError::InvalidConfig(format!(
                "{} backend requires {}",
                self.kind(),
                what
            ))),
            None => Ok(()),
        }
    }

    /// Connection target handed to the driver: a file path or a URL
    pub fn connection_target(&self) -> String {
        match self {
            BackendConfig::Sqlite { path } => path.to_string_lossy().to_string(),
            BackendConfig::Postgres {
                host,
                port,
                dbname,
                user,
                password,
                sslmode,
            } => format!(
                "postgres://{}@{}:{}/{}?sslmode={}",
                credentials(user, password),
                host,
                port,
                dbname,
                sslmode
            ),
            BackendConfig::MySql {
                address,
                dbname,
                user,
                password,
            } => format!("mysql://{}@{}/{}", credentials(user, password), address, dbname),
        }
    }
}

fn credentials(user: &str, password: &str) -> String {
    if password.is_empty() {
        user.to_string()
    } else {
        format!("{}:{}", user, password)
    }
}

/// Connection pool limits
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a free connection before failing
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./facette.db")
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_pgsql_port() -> u16 {
    5432
}

fn default_dbname() -> String {
    "facette".to_string()
}

fn default_pgsql_user() -> String {
    "postgres".to_string()
}

fn default_sslmode() -> String {
    "disable".to_string()
}

fn default_mysql_address() -> String {
    "localhost:3306".to_string()
}

fn default_mysql_user() -> String {
    "root".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

pub fn read_config_file(path: &str) -> StorageResult<StorageConfig> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| StorageError::InvalidConfig(format!("{}: {}", path, e)))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
