//! Backend selection
//!
//! Bundles the three repositories behind trait objects so the tracking,
//! sending and analytics services never know which backend they run on.

use crate::db::DatabasePool;
use crate::memory::MemoryStore;
use crate::repository::{
    CampaignRepository, DbCampaignRepository, DbEventRepository, DbRecipientRepository,
    EventRepository, RecipientRepository,
};
use mailpulse_common::config::DatabaseConfig;
use mailpulse_common::{Error, Result};
use std::sync::Arc;
use tracing::info;

/// Repository handles sharing one backend
#[derive(Clone)]
pub struct Datastore {
    pub campaigns: Arc<dyn CampaignRepository>,
    pub recipients: Arc<dyn RecipientRepository>,
    pub events: Arc<dyn EventRepository>,
    pool: Option<DatabasePool>,
}

impl Datastore {
    /// PostgreSQL-backed repositories
    pub fn postgres(pool: DatabasePool) -> Self {
        Self {
            campaigns: Arc::new(DbCampaignRepository::new(pool.clone())),
            recipients: Arc::new(DbRecipientRepository::new(pool.clone())),
            events: Arc::new(DbEventRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Backend-less bundle over arbitrary repository implementations
    pub fn from_parts(
        campaigns: Arc<dyn CampaignRepository>,
        recipients: Arc<dyn RecipientRepository>,
        events: Arc<dyn EventRepository>,
    ) -> Self {
        Self {
            campaigns,
            recipients,
            events,
            pool: None,
        }
    }

    /// Process-local repositories, lost on restart
    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    /// Repositories over an existing memory store
    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self::from_parts(store.clone(), store.clone(), store)
    }

    /// Connect the configured backend, running migrations for PostgreSQL
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        match config.backend.as_str() {
            "postgres" => {
                let pool = DatabasePool::new(config).await?;
                pool.migrate().await?;
                Ok(Self::postgres(pool))
            }
            "memory" => {
                info!("Using in-memory datastore; data is not persisted");
                Ok(Self::memory())
            }
            other => Err(Error::Config(format!("Unsupported database backend: {}", other))),
        }
    }

    /// Name of the active backend
    pub fn backend(&self) -> &'static str {
        if self.pool.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    /// Check that the backend is reachable
    pub async fn health_check(&self) -> Result<()> {
        match &self.pool {
            Some(pool) => pool.health_check().await,
            None => Ok(()),
        }
    }

    /// Release backend resources
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
