//! Recipient repository
//!
//! Recipient rows carry the denormalized open/click counters. Every mutation
//! here is a single statement so concurrent tracking requests for the same
//! recipient cannot lose increments.

use crate::db::DatabasePool;
use crate::models::Recipient;
use async_trait::async_trait;
use mailpulse_common::types::{CampaignId, RecipientId};
use mailpulse_common::{Error, Result};
use uuid::Uuid;

/// Recipient repository trait
#[async_trait]
pub trait RecipientRepository: Send + Sync {
    /// Return the recipient for (campaign, email), creating it if absent
    async fn find_or_create(
        &self,
        campaign_id: CampaignId,
        email: &str,
        name: Option<&str>,
    ) -> Result<Recipient>;

    /// Get a recipient by ID
    async fn get(&self, id: RecipientId) -> Result<Option<Recipient>>;

    /// Stamp `sent_at` if it is not already set
    async fn mark_sent(&self, id: RecipientId) -> Result<Option<Recipient>>;

    /// Stamp the first open and bump the open counter
    async fn record_open(&self, id: RecipientId) -> Result<Option<Recipient>>;

    /// Stamp the first click and bump the click counter
    async fn record_click(&self, id: RecipientId) -> Result<Option<Recipient>>;

    /// Recipients of one campaign, newest first
    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<Recipient>>;

    /// Every recipient across campaigns
    async fn list_all(&self) -> Result<Vec<Recipient>>;
}

/// Database recipient repository
pub struct DbRecipientRepository {
    pool: DatabasePool,
}

impl DbRecipientRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn get_by_email(&self, campaign_id: CampaignId, email: &str) -> Result<Option<Recipient>> {
        sqlx::query_as::<_, Recipient>(
            "SELECT * FROM recipients WHERE campaign_id = $1 AND email = $2",
        )
        .bind(campaign_id)
        .bind(email)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}

#[async_trait]
impl RecipientRepository for DbRecipientRepository {
    async fn find_or_create(
        &self,
        campaign_id: CampaignId,
        email: &str,
        name: Option<&str>,
    ) -> Result<Recipient> {
        let id = Uuid::new_v4();

        // The unique (campaign_id, email) constraint arbitrates concurrent sends
        let inserted = sqlx::query_as::<_, Recipient>(
            r#"
            INSERT INTO recipients (id, campaign_id, email, name)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (campaign_id, email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(campaign_id)
        .bind(email)
        .bind(name)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        match inserted {
            Some(recipient) => Ok(recipient),
            None => self.get_by_email(campaign_id, email).await?.ok_or_else(|| {
                Error::Internal(format!(
                    "Recipient {} vanished after insert conflict",
                    email
                ))
            }),
        }
    }

    async fn get(&self, id: RecipientId) -> Result<Option<Recipient>> {
        sqlx::query_as::<_, Recipient>("SELECT * FROM recipients WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    async fn mark_sent(&self, id: RecipientId) -> Result<Option<Recipient>> {
        sqlx::query_as::<_, Recipient>(
            r#"
            UPDATE recipients SET
                sent_at = COALESCE(sent_at, NOW())
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn record_open(&self, id: RecipientId) -> Result<Option<Recipient>> {
        sqlx::query_as::<_, Recipient>(
            r#"
            UPDATE recipients SET
                opened_at = COALESCE(opened_at, NOW()),
                opened_count = opened_count + 1
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn record_click(&self, id: RecipientId) -> Result<Option<Recipient>> {
        sqlx::query_as::<_, Recipient>(
            r#"
            UPDATE recipients SET
                clicked_at = COALESCE(clicked_at, NOW()),
                clicked_count = clicked_count + 1
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<Recipient>> {
        sqlx::query_as::<_, Recipient>(
            "SELECT * FROM recipients WHERE campaign_id = $1 ORDER BY created_at DESC",
        )
        .bind(campaign_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Recipient>> {
        sqlx::query_as::<_, Recipient>("SELECT * FROM recipients")
            .fetch_all(self.pool.pool())
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}
