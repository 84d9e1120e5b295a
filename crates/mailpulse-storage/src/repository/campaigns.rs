//! Campaign repository

use crate::db::DatabasePool;
use crate::models::{Campaign, CreateCampaign};
use async_trait::async_trait;
use mailpulse_common::types::{CampaignId, CampaignStatus};
use mailpulse_common::{Error, Result};
use uuid::Uuid;

/// Campaign repository trait
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    /// Create a draft campaign
    async fn create(&self, input: CreateCampaign) -> Result<Campaign>;

    /// Get a campaign by ID
    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>>;

    /// List all campaigns, newest first
    async fn list(&self) -> Result<Vec<Campaign>>;

    /// Overwrite the campaign status
    async fn update_status(&self, id: CampaignId, status: CampaignStatus)
        -> Result<Option<Campaign>>;
}

/// Database campaign repository
pub struct DbCampaignRepository {
    pool: DatabasePool,
}

impl DbCampaignRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CampaignRepository for DbCampaignRepository {
    async fn create(&self, input: CreateCampaign) -> Result<Campaign> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (id, name, subject, from_email, from_name, html_content, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.subject)
        .bind(&input.from_email)
        .bind(&input.from_name)
        .bind(&input.html_content)
        .bind(CampaignStatus::Draft.to_string())
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<Campaign>> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns ORDER BY created_at DESC")
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>> {
        sqlx::query_as::<_, Campaign>(
            "UPDATE campaigns SET status = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}
