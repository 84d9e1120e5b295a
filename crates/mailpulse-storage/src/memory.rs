//! In-memory datastore
//!
//! Implements every repository trait over a single lock-guarded state so each
//! mutation is atomic with respect to concurrent requests. Used for local
//! development (`database.backend = "memory"`) and in tests.

use crate::models::{
    ActivityEntry, Campaign, CreateCampaign, NewTrackingEvent, Recipient, TrackingEvent,
};
use crate::repository::{CampaignRepository, EventRepository, RecipientRepository};
use async_trait::async_trait;
use chrono::Utc;
use mailpulse_common::types::{CampaignId, CampaignStatus, EventType, RecipientId};
use mailpulse_common::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    campaigns: Vec<Campaign>,
    recipients: Vec<Recipient>,
    by_id: HashMap<RecipientId, usize>,
    by_email: HashMap<(CampaignId, String), usize>,
    events: Vec<TrackingEvent>,
}

impl MemoryState {
    fn campaign(&self, id: CampaignId) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.id == id)
    }

    fn recipient(&self, id: RecipientId) -> Option<&Recipient> {
        self.by_id.get(&id).map(|&idx| &self.recipients[idx])
    }

    fn recipient_mut(&mut self, id: RecipientId) -> Option<&mut Recipient> {
        let idx = *self.by_id.get(&id)?;
        self.recipients.get_mut(idx)
    }
}

/// In-memory store backing all repositories
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored tracking events
    pub async fn event_count(&self) -> usize {
        self.state.read().await.events.len()
    }

    async fn track(&self, id: RecipientId, event: EventType) -> Result<Option<Recipient>> {
        let mut state = self.state.write().await;
        Ok(state.recipient_mut(id).map(|recipient| {
            recipient.apply(event, Utc::now());
            recipient.clone()
        }))
    }
}

#[async_trait]
impl CampaignRepository for MemoryStore {
    async fn create(&self, input: CreateCampaign) -> Result<Campaign> {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: input.name,
            subject: input.subject,
            from_email: input.from_email,
            from_name: input.from_name,
            html_content: input.html_content,
            status: CampaignStatus::Draft.to_string(),
            created_at: Utc::now(),
        };

        self.state.write().await.campaigns.push(campaign.clone());
        Ok(campaign)
    }

    async fn get(&self, id: CampaignId) -> Result<Option<Campaign>> {
        Ok(self.state.read().await.campaign(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Campaign>> {
        Ok(self.state.read().await.campaigns.iter().rev().cloned().collect())
    }

    async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>> {
        let mut state = self.state.write().await;
        Ok(state
            .campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .map(|campaign| {
                campaign.status = status.to_string();
                campaign.clone()
            }))
    }
}

#[async_trait]
impl RecipientRepository for MemoryStore {
    async fn find_or_create(
        &self,
        campaign_id: CampaignId,
        email: &str,
        name: Option<&str>,
    ) -> Result<Recipient> {
        let mut state = self.state.write().await;
        let key = (campaign_id, email.to_string());

        if let Some(&idx) = state.by_email.get(&key) {
            return Ok(state.recipients[idx].clone());
        }

        let recipient = Recipient::new(campaign_id, email, name.map(str::to_string));
        let idx = state.recipients.len();
        state.by_id.insert(recipient.id, idx);
        state.by_email.insert(key, idx);
        state.recipients.push(recipient.clone());
        Ok(recipient)
    }

    async fn get(&self, id: RecipientId) -> Result<Option<Recipient>> {
        Ok(self.state.read().await.recipient(id).cloned())
    }

    async fn mark_sent(&self, id: RecipientId) -> Result<Option<Recipient>> {
        let mut state = self.state.write().await;
        Ok(state.recipient_mut(id).map(|recipient| {
            recipient.mark_sent(Utc::now());
            recipient.clone()
        }))
    }

    async fn record_open(&self, id: RecipientId) -> Result<Option<Recipient>> {
        self.track(id, EventType::Open).await
    }

    async fn record_click(&self, id: RecipientId) -> Result<Option<Recipient>> {
        self.track(id, EventType::Click).await
    }

    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<Recipient>> {
        Ok(self
            .state
            .read()
            .await
            .recipients
            .iter()
            .rev()
            .filter(|r| r.campaign_id == campaign_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Recipient>> {
        Ok(self.state.read().await.recipients.clone())
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn append(&self, input: NewTrackingEvent) -> Result<TrackingEvent> {
        let event = input.into_event(Utc::now());
        self.state.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<ActivityEntry>> {
        let state = self.state.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(state
            .events
            .iter()
            .rev()
            .filter_map(|event| {
                let recipient = state.recipient(event.recipient_id)?;
                let campaign = state.campaign(recipient.campaign_id)?;
                Some(ActivityEntry::join(event, recipient, campaign))
            })
            .take(limit)
            .collect())
    }

    async fn list_by_recipient(&self, recipient_id: RecipientId) -> Result<Vec<TrackingEvent>> {
        Ok(self
            .state
            .read()
            .await
            .events
            .iter()
            .filter(|e| e.recipient_id == recipient_id)
            .cloned()
            .collect())
    }

    async fn list_by_campaign(&self, campaign_id: CampaignId) -> Result<Vec<TrackingEvent>> {
        let state = self.state.read().await;
        Ok(state
            .events
            .iter()
            .filter(|e| {
                state
                    .recipient(e.recipient_id)
                    .is_some_and(|r| r.campaign_id == campaign_id)
            })
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailpulse_common::types::ClientInfo;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn campaign_input(name: &str) -> CreateCampaign {
        CreateCampaign {
            name: name.to_string(),
            subject: "Hello".to_string(),
            from_email: "news@example.com".to_string(),
            from_name: "News".to_string(),
            html_content: "<p>Hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let campaign = CampaignRepository::create(&store, campaign_input("Launch"))
            .await
            .unwrap();

        let first = store
            .find_or_create(campaign.id, "a@example.com", Some("Ann"))
            .await
            .unwrap();
        let second = store
            .find_or_create(campaign.id, "a@example.com", None)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("Ann"));
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_same_email_in_two_campaigns() {
        let store = MemoryStore::new();
        let a = CampaignRepository::create(&store, campaign_input("A")).await.unwrap();
        let b = CampaignRepository::create(&store, campaign_input("B")).await.unwrap();

        let ra = store.find_or_create(a.id, "x@example.com", None).await.unwrap();
        let rb = store.find_or_create(b.id, "x@example.com", None).await.unwrap();

        assert_ne!(ra.id, rb.id);
        assert_eq!(
            RecipientRepository::list_by_campaign(&store, a.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_yields_one_row() {
        let store = Arc::new(MemoryStore::new());
        let campaign = CampaignRepository::create(store.as_ref(), campaign_input("Race"))
            .await
            .unwrap();
        let campaign_id = campaign.id;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .find_or_create(campaign_id, "race@example.com", None)
                    .await
                    .unwrap()
                    .id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_opens_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let campaign = CampaignRepository::create(store.as_ref(), campaign_input("Opens"))
            .await
            .unwrap();
        let recipient = store
            .find_or_create(campaign.id, "o@example.com", None)
            .await
            .unwrap();
        let recipient_id = recipient.id;

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.record_open(recipient_id).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = RecipientRepository::get(store.as_ref(), recipient.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.opened_count, 50);
        assert!(stored.opened_at.is_some());
    }

    #[tokio::test]
    async fn test_tracking_unknown_recipient_is_none() {
        let store = MemoryStore::new();
        assert!(store.record_open(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.record_click(Uuid::new_v4()).await.unwrap().is_none());
        assert!(store.mark_sent(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_recent_is_newest_first_and_joined() {
        let store = MemoryStore::new();
        let campaign = CampaignRepository::create(&store, campaign_input("Feed"))
            .await
            .unwrap();
        let recipient = store
            .find_or_create(campaign.id, "f@example.com", Some("Fay"))
            .await
            .unwrap();

        store
            .append(NewTrackingEvent::open(recipient.id, ClientInfo::default()))
            .await
            .unwrap();
        store
            .append(NewTrackingEvent::click(
                recipient.id,
                "https://example.com",
                ClientInfo::default(),
            ))
            .await
            .unwrap();
        // Orphan event: dropped by the join
        store
            .append(NewTrackingEvent::open(Uuid::new_v4(), ClientInfo::default()))
            .await
            .unwrap();

        let feed = store.recent(10).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].event_type, "click");
        assert_eq!(feed[0].campaign_name, "Feed");
        assert_eq!(feed[0].name.as_deref(), Some("Fay"));
        assert_eq!(feed[1].event_type, "open");

        assert_eq!(store.recent(1).await.unwrap().len(), 1);
        assert_eq!(store.event_count().await, 3);
    }

    #[tokio::test]
    async fn test_campaigns_listed_newest_first() {
        let store = MemoryStore::new();
        CampaignRepository::create(&store, campaign_input("First")).await.unwrap();
        let second = CampaignRepository::create(&store, campaign_input("Second"))
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].id, second.id);

        let updated = store
            .update_status(second.id, CampaignStatus::Sent)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status_enum(), Some(CampaignStatus::Sent));
    }
}
