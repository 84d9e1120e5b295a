//! Database models

use chrono::{DateTime, Utc};
use mailpulse_common::types::{
    CampaignId, CampaignStatus, ClientInfo, EventId, EventType, RecipientId,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Campaign model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub subject: String,
    pub from_email: String,
    pub from_name: String,
    pub html_content: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    /// Get status enum
    pub fn status_enum(&self) -> Option<CampaignStatus> {
        self.status.parse().ok()
    }
}

/// Create campaign input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub name: String,
    pub subject: String,
    pub from_email: String,
    pub from_name: String,
    pub html_content: String,
}

/// Open/click portion of a recipient's lifecycle.
///
/// Transitions never clear a timestamp or decrease a counter: the first
/// event of a kind stamps its `*_at` field and every event bumps its count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackingState {
    pub opened_at: Option<DateTime<Utc>>,
    pub opened_count: i32,
    pub clicked_at: Option<DateTime<Utc>>,
    pub clicked_count: i32,
}

impl TrackingState {
    /// Apply one tracking event observed at `now`
    pub fn apply(self, event: EventType, now: DateTime<Utc>) -> Self {
        match event {
            EventType::Open => Self {
                opened_at: self.opened_at.or(Some(now)),
                opened_count: self.opened_count.saturating_add(1),
                ..self
            },
            EventType::Click => Self {
                clicked_at: self.clicked_at.or(Some(now)),
                clicked_count: self.clicked_count.saturating_add(1),
                ..self
            },
        }
    }

    /// Whether the timestamp/counter pairs agree with each other
    pub fn is_consistent(&self) -> bool {
        self.opened_at.is_none() == (self.opened_count == 0)
            && self.clicked_at.is_none() == (self.clicked_count == 0)
    }
}

/// Recipient model: one row per (campaign, email)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Recipient {
    pub id: RecipientId,
    pub campaign_id: CampaignId,
    pub email: String,
    pub name: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub opened_count: i32,
    pub clicked_at: Option<DateTime<Utc>>,
    pub clicked_count: i32,
    pub created_at: DateTime<Utc>,
}

impl Recipient {
    /// Fresh recipient with no sends, opens or clicks
    pub fn new(campaign_id: CampaignId, email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            campaign_id,
            email: email.into(),
            name,
            sent_at: None,
            opened_at: None,
            opened_count: 0,
            clicked_at: None,
            clicked_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Current open/click state
    pub fn tracking_state(&self) -> TrackingState {
        TrackingState {
            opened_at: self.opened_at,
            opened_count: self.opened_count,
            clicked_at: self.clicked_at,
            clicked_count: self.clicked_count,
        }
    }

    /// Apply a tracking event in place
    pub fn apply(&mut self, event: EventType, now: DateTime<Utc>) {
        let next = self.tracking_state().apply(event, now);
        self.opened_at = next.opened_at;
        self.opened_count = next.opened_count;
        self.clicked_at = next.clicked_at;
        self.clicked_count = next.clicked_count;
    }

    /// Stamp `sent_at` unless it is already set
    pub fn mark_sent(&mut self, now: DateTime<Utc>) {
        self.sent_at = self.sent_at.or(Some(now));
    }

    /// Counter for the given event type
    pub fn count_for(&self, event: EventType) -> i32 {
        match event {
            EventType::Open => self.opened_count,
            EventType::Click => self.clicked_count,
        }
    }
}

/// Tracking event model (append-only)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub id: EventId,
    pub recipient_id: RecipientId,
    pub event_type: String,
    pub link_url: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TrackingEvent {
    /// Get event type enum
    pub fn event_type_enum(&self) -> Option<EventType> {
        self.event_type.parse().ok()
    }
}

/// New tracking event input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTrackingEvent {
    pub recipient_id: RecipientId,
    pub event_type: EventType,
    pub link_url: Option<String>,
    pub client: ClientInfo,
}

impl NewTrackingEvent {
    /// Open event for a recipient
    pub fn open(recipient_id: RecipientId, client: ClientInfo) -> Self {
        Self {
            recipient_id,
            event_type: EventType::Open,
            link_url: None,
            client,
        }
    }

    /// Click event for a recipient, carrying the original destination
    pub fn click(recipient_id: RecipientId, link_url: impl Into<String>, client: ClientInfo) -> Self {
        Self {
            recipient_id,
            event_type: EventType::Click,
            link_url: Some(link_url.into()),
            client,
        }
    }

    /// Materialize the immutable row
    pub fn into_event(self, now: DateTime<Utc>) -> TrackingEvent {
        TrackingEvent {
            id: uuid::Uuid::new_v4(),
            recipient_id: self.recipient_id,
            event_type: self.event_type.to_string(),
            link_url: self.link_url,
            ip_address: Some(self.client.ip_address),
            user_agent: Some(self.client.user_agent),
            created_at: now,
        }
    }
}

/// Tracking event joined with its recipient and campaign for display
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: EventId,
    pub recipient_id: RecipientId,
    pub event_type: String,
    pub link_url: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub email: String,
    pub name: Option<String>,
    pub campaign_id: CampaignId,
    pub campaign_name: String,
}

impl ActivityEntry {
    /// Join an event with its recipient and campaign
    pub fn join(event: &TrackingEvent, recipient: &Recipient, campaign: &Campaign) -> Self {
        Self {
            id: event.id,
            recipient_id: event.recipient_id,
            event_type: event.event_type.clone(),
            link_url: event.link_url.clone(),
            ip_address: event.ip_address.clone(),
            user_agent: event.user_agent.clone(),
            created_at: event.created_at,
            email: recipient.email.clone(),
            name: recipient.name.clone(),
            campaign_id: campaign.id,
            campaign_name: campaign.name.clone(),
        }
    }
}
