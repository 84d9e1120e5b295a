//! Tracking event repository (append-only)

use crate::db::DatabasePool;
use crate::models::{ActivityEntry, NewTrackingEvent, TrackingEvent};
use async_trait::async_trait;
use mailpulse_common::types::{CampaignId, RecipientId};
use mailpulse_common::{Error, Result};
use uuid::Uuid;

/// Tracking event repository trait
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append an immutable event row
    async fn append(&self, input: NewTrackingEvent) -> Result<TrackingEvent>;

    /// Newest events joined with recipient and campaign
    async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>>;

    /// Events of one recipient, oldest first
    async fn list_by_recipient(&self, recipient_id: RecipientId) -> Result<Vec<TrackingEvent>>;

    /// Events of every recipient in a campaign, oldest first
    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<TrackingEvent>>;
}

/// Database tracking event repository
pub struct DbEventRepository {
    pool: DatabasePool,
}

impl DbEventRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for DbEventRepository {
    async fn append(&self, input: NewTrackingEvent) -> Result<TrackingEvent> {
        let id = Uuid::new_v4();

        sqlx::query_as::<_, TrackingEvent>(
            r#"
            INSERT INTO tracking_events (id, recipient_id, event_type, link_url, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.recipient_id)
        .bind(input.event_type.as_str())
        .bind(&input.link_url)
        .bind(&input.client.ip_address)
        .bind(&input.client.user_agent)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>> {
        sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT
                te.id, te.recipient_id, te.event_type, te.link_url,
                te.ip_address, te.user_agent, te.created_at,
                r.email, r.name,
                c.id AS campaign_id, c.name AS campaign_name
            FROM tracking_events te
            JOIN recipients r ON te.recipient_id = r.id
            JOIN campaigns c ON r.campaign_id = c.id
            ORDER BY te.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_by_recipient(&self, recipient_id: RecipientId) -> Result<Vec<TrackingEvent>> {
        sqlx::query_as::<_, TrackingEvent>(
            "SELECT * FROM tracking_events WHERE recipient_id = $1 ORDER BY created_at ASC",
        )
        .bind(recipient_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }

    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<TrackingEvent>> {
        sqlx::query_as::<_, TrackingEvent>(
            r#"
            SELECT te.*
            FROM tracking_events te
            JOIN recipients r ON te.recipient_id = r.id
            WHERE r.campaign_id = $1
            ORDER BY te.created_at ASC
            "#,
        )
        .bind(campaign_id)
        .fetch_all(self.pool.pool())
        .await
        .map_err(|e| Error::Database(e.to_string()))
    }
}
