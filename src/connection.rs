//! Database Connection Manager
//!
//! Every application owns a database named after it, so the manager keeps one
//! pool per database name on the configured server and creates them lazily.

use crate::config::DatabaseConfig;
use crate::error::AppError;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio_postgres::NoTls;
use tracing::{debug, info};

/// Connection Manager - hands out pools per database
pub struct ConnectionManager {
    config: DatabaseConfig,
    pools: RwLock<HashMap<String, Pool>>,
}

impl ConnectionManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pools: RwLock::new(HashMap::new()),
        }
    }

    /// Name of the maintenance database (`CREATE DATABASE` runs there)
    pub fn maintenance_database(&self) -> &str {
        &self.config.database
    }

    /// Pool for the named database, created on first use
    pub async fn pool_for(&self, database: &str) -> Result<Pool, AppError> {
        if let Some(pool) = self.pools.read().await.get(database) {
            return Ok(pool.clone());
        }

        let mut pools = self.pools.write().await;
        // another task may have created it while we waited for the lock
        if let Some(pool) = pools.get(database) {
            return Ok(pool.clone());
        }

        let pool = self.create_pool(database)?;
        pools.insert(database.to_string(), pool.clone());
        debug!("Created pool for database '{}'", database);
        Ok(pool)
    }

    /// Create a connection pool for one database on the configured server
    fn create_pool(&self, database: &str) -> Result<Pool, AppError> {
        let mut cfg = Config::new();
        cfg.host = Some(self.config.host.clone());
        cfg.port = Some(self.config.port);
        cfg.user = Some(self.config.user.clone());
        cfg.password = Some(self.config.password.clone());
        cfg.dbname = Some(database.to_string());
        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig::new(self.config.max_pool_size.max(1)));

        if self.config.require_tls {
            let certs = rustls_native_certs::load_native_certs();
            let mut root_store = rustls::RootCertStore::empty();
            for cert in certs.certs {
                root_store.add(cert).ok();
            }

            let tls_config = rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth();

            let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);
            cfg.create_pool(Some(Runtime::Tokio1), tls)
                .map_err(|e| AppError::Config(format!("Failed to create TLS pool: {}", e)))
        } else {
            cfg.create_pool(Some(Runtime::Tokio1), NoTls)
                .map_err(|e| AppError::Config(format!("Failed to create pool: {}", e)))
        }
    }

    /// Check that the server answers, using the maintenance database
    pub async fn test_connection(&self) -> Result<ConnectionTestResult, AppError> {
        let database = self.config.database.clone();
        let pool = self.pool_for(&database).await?;

        let start = std::time::Instant::now();
        let client = pool.get().await?;

        let row = client
            .query_one("SELECT version()", &[])
            .await
            .map_err(|e| AppError::Connection(format!("Connection test failed: {}", e)))?;
        let version: String = row.get(0);

        let latency = start.elapsed();
        info!("Database {}@{} answered in {:?}", database, self.config.host, latency);

        Ok(ConnectionTestResult {
            success: true,
            latency_ms: latency.as_millis() as u64,
            server_version: version,
            database,
            host: self.config.host.clone(),
        })
    }

    /// Number of pools created so far
    pub async fn pool_count(&self) -> usize {
        self.pools.read().await.len()
    }
}

/// Result of testing a connection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    pub latency_ms: u64,
    pub server_version: String,
    pub database: String,
    pub host: String,
}
