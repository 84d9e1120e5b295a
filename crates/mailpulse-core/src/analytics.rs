//! Read-side analytics over recipients and the event log

use crate::stats::CampaignStats;
use chrono::{DateTime, NaiveDate, Utc};
use mailpulse_common::types::{CampaignId, EventType, RecipientId};
use mailpulse_common::{Error, Result};
use mailpulse_storage::{ActivityEntry, Campaign, Datastore, Recipient};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Largest activity page served in one request
pub const MAX_ACTIVITY_LIMIT: i64 = 1000;

/// One campaign with its statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignPerformance {
    pub id: CampaignId,
    pub name: String,
    pub subject: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: CampaignStats,
}

impl CampaignPerformance {
    fn new(campaign: &Campaign, stats: CampaignStats) -> Self {
        Self {
            id: campaign.id,
            name: campaign.name.clone(),
            subject: campaign.subject.clone(),
            status: campaign.status.clone(),
            created_at: campaign.created_at,
            stats,
        }
    }
}

/// Opens and clicks logged on one UTC day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub opens: u64,
    pub clicks: u64,
}

/// A recipient whose counters disagree with the event log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDrift {
    pub recipient_id: RecipientId,
    pub email: String,
    pub opened_count: i32,
    pub logged_opens: u64,
    pub clicked_count: i32,
    pub logged_clicks: u64,
}

/// Dashboard snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub overall: CampaignStats,
    pub campaigns: Vec<CampaignPerformance>,
    pub recent_events: Vec<ActivityEntry>,
}

/// Analytics service
#[derive(Clone)]
pub struct Analytics {
    store: Datastore,
    default_limit: i64,
}

impl Analytics {
    pub fn new(store: Datastore, default_limit: i64) -> Self {
        Self {
            store,
            default_limit,
        }
    }

    /// Statistics over every recipient of every campaign
    pub async fn overall(&self) -> Result<CampaignStats> {
        let recipients = self.store.recipients.list_all().await?;
        Ok(CampaignStats::from_recipients(&recipients))
    }

    /// Statistics for one campaign
    pub async fn campaign(&self, campaign_id: CampaignId) -> Result<CampaignStats> {
        self.require_campaign(campaign_id).await?;
        let recipients = self.store.recipients.list_by_campaign(campaign_id).await?;
        Ok(CampaignStats::from_recipients(&recipients))
    }

    /// Every campaign, newest first, including campaigns without recipients
    pub async fn campaign_performance(&self) -> Result<Vec<CampaignPerformance>> {
        let campaigns = self.store.campaigns.list().await?;
        let recipients = self.store.recipients.list_all().await?;

        let mut by_campaign: HashMap<CampaignId, Vec<&Recipient>> = HashMap::new();
        for recipient in &recipients {
            by_campaign
                .entry(recipient.campaign_id)
                .or_default()
                .push(recipient);
        }

        Ok(campaigns
            .iter()
            .map(|campaign| {
                let rows = by_campaign.get(&campaign.id).map(Vec::as_slice).unwrap_or_default();
                CampaignPerformance::new(campaign, CampaignStats::from_recipients(rows.iter().copied()))
            })
            .collect())
    }

    /// Newest events joined with recipient and campaign
    pub async fn recent_activity(&self, limit: Option<i64>) -> Result<Vec<ActivityEntry>> {
        let limit = limit
            .unwrap_or(self.default_limit)
            .clamp(0, MAX_ACTIVITY_LIMIT);
        self.store.events.recent(limit).await
    }

    /// Overall stats, per-campaign stats and the activity feed
    pub async fn report(&self, limit: Option<i64>) -> Result<AnalyticsReport> {
        Ok(AnalyticsReport {
            overall: self.overall().await?,
            campaigns: self.campaign_performance().await?,
            recent_events: self.recent_activity(limit).await?,
        })
    }

    /// Events of a campaign bucketed by UTC day, oldest day first
    pub async fn daily_activity(&self, campaign_id: CampaignId) -> Result<Vec<DailyActivity>> {
        self.require_campaign(campaign_id).await?;
        let events = self.store.events.list_by_campaign(campaign_id).await?;

        let mut days: BTreeMap<NaiveDate, DailyActivity> = BTreeMap::new();
        for event in &events {
            let date = event.created_at.date_naive();
            let day = days.entry(date).or_insert(DailyActivity {
                date,
                opens: 0,
                clicks: 0,
            });
            match event.event_type_enum() {
                Some(EventType::Open) => day.opens += 1,
                Some(EventType::Click) => day.clicks += 1,
                None => {}
            }
        }

        Ok(days.into_values().collect())
    }

    /// Recipients whose counters differ from their logged events
    pub async fn counter_drift(&self, campaign_id: CampaignId) -> Result<Vec<CounterDrift>> {
        self.require_campaign(campaign_id).await?;
        let recipients = self.store.recipients.list_by_campaign(campaign_id).await?;
        let events = self.store.events.list_by_campaign(campaign_id).await?;

        let mut logged: HashMap<(RecipientId, EventType), u64> = HashMap::new();
        for event in &events {
            if let Some(kind) = event.event_type_enum() {
                *logged.entry((event.recipient_id, kind)).or_default() += 1;
            }
        }
        let count = |id: RecipientId, kind: EventType| logged.get(&(id, kind)).copied().unwrap_or(0);

        Ok(recipients
            .into_iter()
            .filter_map(|r| {
                let logged_opens = count(r.id, EventType::Open);
                let logged_clicks = count(r.id, EventType::Click);
                let in_sync = i64::from(r.opened_count) == logged_opens as i64
                    && i64::from(r.clicked_count) == logged_clicks as i64;
                (!in_sync).then(|| CounterDrift {
                    recipient_id: r.id,
                    email: r.email,
                    opened_count: r.opened_count,
                    logged_opens,
                    clicked_count: r.clicked_count,
                    logged_clicks,
                })
            })
            .collect())
    }

    async fn require_campaign(&self, campaign_id: CampaignId) -> Result<Campaign> {
        self.store
            .campaigns
            .get(campaign_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Campaign {} not found", campaign_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mailpulse_common::types::ClientInfo;
    use mailpulse_storage::{
        CampaignRepository, CreateCampaign, EventRepository, MemoryStore, NewTrackingEvent,
        RecipientRepository,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use uuid::Uuid;

    fn input(name: &str) -> CreateCampaign {
        CreateCampaign {
            name: name.to_string(),
            subject: format!("{} subject", name),
            from_email: "team@example.com".to_string(),
            from_name: "Team".to_string(),
            html_content: "<p>Hi</p>".to_string(),
        }
    }

    async fn setup() -> (Arc<MemoryStore>, Analytics) {
        let memory = Arc::new(MemoryStore::new());
        let analytics = Analytics::new(Datastore::from_memory(memory.clone()), 50);
        (memory, analytics)
    }

    async fn open(memory: &MemoryStore, id: RecipientId) {
        memory.record_open(id).await.unwrap();
        memory
            .append(NewTrackingEvent::open(id, ClientInfo::default()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_campaign_is_not_found() {
        let (_, analytics) = setup().await;
        let err = analytics.campaign(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(analytics.daily_activity(Uuid::new_v4()).await.is_err());
    }

    #[tokio::test]
    async fn test_campaign_without_recipients_is_zero() {
        let (memory, analytics) = setup().await;
        let campaign = memory.create(input("Empty")).await.unwrap();
        assert_eq!(
            analytics.campaign(campaign.id).await.unwrap(),
            CampaignStats::default()
        );
    }

    #[tokio::test]
    async fn test_performance_lists_every_campaign() {
        let (memory, analytics) = setup().await;
        let first = memory.create(input("First")).await.unwrap();
        let second = memory.create(input("Second")).await.unwrap();

        let r = memory.find_or_create(first.id, "a@example.com", None).await.unwrap();
        memory.mark_sent(r.id).await.unwrap();
        open(&memory, r.id).await;

        let rows = analytics.campaign_performance().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, second.id);
        assert_eq!(rows[0].stats, CampaignStats::default());
        assert_eq!(rows[1].stats.sent_count, 1);
        assert_eq!(rows[1].stats.open_rate, 100.0);

        let overall = analytics.overall().await.unwrap();
        assert_eq!(overall.recipient_count, 1);
        assert_eq!(overall.total_opens, 1);
    }

    #[tokio::test]
    async fn test_recent_activity_respects_limit() {
        let (memory, analytics) = setup().await;
        let campaign = memory.create(input("Feed")).await.unwrap();
        let r = memory.find_or_create(campaign.id, "a@example.com", None).await.unwrap();
        for _ in 0..4 {
            open(&memory, r.id).await;
        }

        assert_eq!(analytics.recent_activity(Some(2)).await.unwrap().len(), 2);
        assert_eq!(analytics.recent_activity(None).await.unwrap().len(), 4);
        assert!(analytics.recent_activity(Some(-5)).await.unwrap().is_empty());

        let report = analytics.report(Some(3)).await.unwrap();
        assert_eq!(report.recent_events.len(), 3);
        assert_eq!(report.campaigns.len(), 1);
    }

    #[tokio::test]
    async fn test_daily_activity_buckets_by_day() {
        let (memory, analytics) = setup().await;
        let campaign = memory.create(input("Chart")).await.unwrap();
        let r = memory.find_or_create(campaign.id, "a@example.com", None).await.unwrap();
        open(&memory, r.id).await;
        open(&memory, r.id).await;
        memory
            .append(NewTrackingEvent::click(r.id, "https://example.com", ClientInfo::default()))
            .await
            .unwrap();

        let days = analytics.daily_activity(campaign.id).await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, Utc::now().date_naive());
        assert_eq!(days[0].opens, 2);
        assert_eq!(days[0].clicks, 1);
    }

    #[tokio::test]
    async fn test_counter_drift_reports_mismatch_only() {
        let (memory, analytics) = setup().await;
        let campaign = memory.create(input("Drift")).await.unwrap();
        let synced = memory.find_or_create(campaign.id, "a@example.com", None).await.unwrap();
        let drifted = memory.find_or_create(campaign.id, "b@example.com", None).await.unwrap();

        open(&memory, synced.id).await;
        // Counter bumped without a matching log row
        memory.record_open(drifted.id).await.unwrap();

        let drift = analytics.counter_drift(campaign.id).await.unwrap();
        assert_eq!(
            drift,
            vec![CounterDrift {
                recipient_id: drifted.id,
                email: "b@example.com".to_string(),
                opened_count: 1,
                logged_opens: 0,
                clicked_count: 0,
                logged_clicks: 0,
            }]
        );

        // Reporting never repairs
        let stored = RecipientRepository::get(memory.as_ref(), drifted.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.opened_count, 1);
    }
}
