//! Backend handle and explicit transactions
//!
//! A [`Backend`] owns the connection pool of one engine, its driver and the
//! entity mapping registry. Statements issued on the backend run on a
//! pooled connection each; [`Backend::begin`] returns a [`Transaction`]
//! through which a sequence of operations runs atomically.

use std::collections::HashMap;

use tracing::{info, instrument, warn};

use super::connection::{EnginePool, EngineTx};
use super::crud::Crud;
use super::driver::{Driver, DriverKind, driver_for};
use super::entity::Entity;
use super::error::StorageResult;
use super::registry::Registry;
use crate::config::{PoolConfig, StorageConfig};

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: HashMap<String, String>,
}

/// Persistence handle over one SQL engine
pub struct Backend {
    driver: &'static dyn Driver,
    pool: EnginePool,
    registry: Registry,
}

impl Backend {
    /// Open a backend and create the schema
    ///
    /// `kind` names the engine (`sqlite`, `postgres`, `mysql`); `target` is a
    /// SQLite path or a connection URL. Unsupported engines fail before any
    /// connection is attempted.
    ///
    /// ```no_run
    /// # use facette_backend::storage::Backend;
    /// # async fn example() -> facette_backend::storage::StorageResult<()> {
    /// let backend = Backend::open("sqlite", "./facette.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(target))]
    pub async fn open(kind: &str, target: &str) -> StorageResult<Self> {
        let kind: DriverKind = kind.parse()?;
        Self::with_pool(kind, target, &PoolConfig::default()).await
    }

    /// Open a backend from configuration
    #[instrument(skip_all, fields(driver = %config.backend.kind()))]
    pub async fn connect(config: &StorageConfig) -> StorageResult<Self> {
        config.validate()?;
        let target = config.backend.connection_target();
        Self::with_pool(config.backend.kind(), &target, &config.pool).await
    }

    async fn with_pool(kind: DriverKind, target: &str, pool: &PoolConfig) -> StorageResult<Self> {
        info!("opening {} backend", kind);

        let driver = driver_for(kind);
        let pool = EnginePool::connect(kind, target, pool).await?;

        let statements = driver.schema_statements();
        pool.execute_batch(&statements).await?;
        info!("schema ready ({} statements)", statements.len());

        Ok(Self {
            driver,
            pool,
            registry: Registry::new(),
        })
    }

    pub fn kind(&self) -> DriverKind {
        self.driver.kind()
    }

    pub fn driver(&self) -> &'static dyn Driver {
        self.driver
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn crud(&self) -> Crud<'_> {
        Crud {
            driver: self.driver,
            registry: &self.registry,
        }
    }

    /// Load the row identified by `id` into `target`
    ///
    /// NULL columns leave the matching fields of `target` untouched.
    #[instrument(skip(self, target), fields(entity = std::any::type_name::<E>()))]
    pub async fn get<E: Entity>(&self, id: &str, target: &mut E) -> StorageResult<()> {
        let mut pooled = self.pool.acquire().await?;
        let mut conn = pooled.conn();
        self.crud().get(&mut conn, id, target).await
    }

    /// Insert the entity's non-zero fields
    #[instrument(skip_all, fields(entity = std::any::type_name::<E>()))]
    pub async fn insert<E: Entity>(&self, entity: &E) -> StorageResult<()> {
        let mut pooled = self.pool.acquire().await?;
        let mut conn = pooled.conn();
        self.crud().insert(&mut conn, entity).await
    }

    /// Overwrite the entity's non-zero fields on its stored row
    #[instrument(skip_all, fields(entity = std::any::type_name::<E>()))]
    pub async fn update<E: Entity>(&self, entity: &E) -> StorageResult<()> {
        let mut pooled = self.pool.acquire().await?;
        let mut conn = pooled.conn();
        self.crud().update(&mut conn, entity).await
    }

    #[instrument(skip_all, fields(entity = std::any::type_name::<E>()))]
    pub async fn delete<E: Entity>(&self, entity: &E) -> StorageResult<()> {
        let mut pooled = self.pool.acquire().await?;
        let mut conn = pooled.conn();
        self.crud().delete(&mut conn, entity).await
    }

    /// Append every stored entity of type `E` to `target`, ordered by id
    ///
    /// Rows follow insertion order only when identifiers are issued in
    /// ascending order. `filter` is reserved and currently ignored.
    #[instrument(skip(self, target), fields(entity = std::any::type_name::<E>()))]
    pub async fn list<E: Entity>(&self, target: &mut Vec<E>, filter: &str) -> StorageResult<()> {
        let mut pooled = self.pool.acquire().await?;
        let mut conn = pooled.conn();
        self.crud().list(&mut conn, target, filter).await
    }

    /// Start a transaction
    #[instrument(skip(self))]
    pub async fn begin(&self) -> StorageResult<Transaction<'_>> {
        let tx = self.pool.begin().await?;
        Ok(Transaction { backend: self, tx })
    }

    #[instrument(skip(self))]
    pub async fn health_check(&self) -> StorageResult<HealthStatus> {
        match self.pool.ping().await {
            Ok(()) => {
                let (size, idle) = self.pool.stats();

                let mut metadata = HashMap::new();
                metadata.insert("backend".to_string(), self.kind().to_string());
                metadata.insert("connections".to_string(), size.to_string());
                metadata.insert("idle_connections".to_string(), idle.to_string());
                metadata.insert("mapped_entities".to_string(), self.registry.len().to_string());

                Ok(HealthStatus {
                    healthy: true,
                    message: format!("{} backend operational", self.kind()),
                    metadata,
                })
            }
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    metadata: HashMap::new(),
                })
            }
        }
    }

    /// Close the pool, waiting for checked-out connections to return
    #[instrument(skip(self))]
    pub async fn close(&self) -> StorageResult<()> {
        info!("closing {} backend", self.kind());
        self.pool.close().await;
        Ok(())
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("driver", &self.kind())
            .field("mapped_entities", &self.registry.len())
            .finish()
    }
}

/// An open transaction on a backend
///
/// Operations run on the transaction's connection and become visible to
/// other handles on [`commit`](Self::commit). Dropping an unresolved
/// transaction rolls it back.
pub struct Transaction<'b> {
    backend: &'b Backend,
    tx: EngineTx,
}

impl Transaction<'_> {
    #[instrument(skip(self, target), fields(entity = std::any::type_name::<E>()))]
    pub async fn get<E: Entity>(&mut self, id: &str, target: &mut E) -> StorageResult<()> {
        let crud = self.backend.crud();
        crud.get(&mut self.tx.conn(), id, target).await
    }

    #[instrument(skip_all, fields(entity = std::any::type_name::<E>()))]
    pub async fn insert<E: Entity>(&mut self, entity: &E) -> StorageResult<()> {
        let crud = self.backend.crud();
        crud.insert(&mut self.tx.conn(), entity).await
    }

    #[instrument(skip_all, fields(entity = std::any::type_name::<E>()))]
    pub async fn update<E: Entity>(&mut self, entity: &E) -> StorageResult<()> {
        let crud = self.backend.crud();
        crud.update(&mut self.tx.conn(), entity).await
    }

    #[instrument(skip_all, fields(entity = std::any::type_name::<E>()))]
    pub async fn delete<E: Entity>(&mut self, entity: &E) -> StorageResult<()> {
        let crud = self.backend.crud();
        crud.delete(&mut self.tx.conn(), entity).await
    }

    #[instrument(skip(self, target), fields(entity = std::any::type_name::<E>()))]
    pub async fn list<E: Entity>(&mut self, target: &mut Vec<E>, filter: &str) -> StorageResult<()> {
        let crud = self.backend.crud();
        crud.list(&mut self.tx.conn(), target, filter).await
    }

    #[instrument(skip(self))]
    pub async fn commit(self) -> StorageResult<()> {
        self.tx.commit().await
    }

    #[instrument(skip(self))]
    pub async fn rollback(self) -> StorageResult<()> {
        self.tx.rollback().await
    }
}
