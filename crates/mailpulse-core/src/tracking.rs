//! Tracking ingestion
//!
//! Turns an open-pixel load or a click-through into a recipient state
//! transition plus an event log row. Ingestion never fails outward: callers
//! always serve the pixel or the redirect, whatever [`Ingestion`] reports.

use crate::metrics::TrackingMetrics;
use mailpulse_common::types::{ClientInfo, EventType, RecipientId};
use mailpulse_common::Error;
use mailpulse_storage::{Datastore, NewTrackingEvent, Recipient};
use tracing::{debug, warn};
use uuid::Uuid;

/// One tracking request as received from a mail client
#[derive(Debug, Clone)]
pub struct TrackingSignal {
    /// Raw tracking token from the URL path
    pub token: String,
    pub event: EventType,
    /// Original destination, clicks only
    pub link_url: Option<String>,
    pub client: ClientInfo,
}

impl TrackingSignal {
    pub fn open(token: impl Into<String>, client: ClientInfo) -> Self {
        Self {
            token: token.into(),
            event: EventType::Open,
            link_url: None,
            client,
        }
    }

    pub fn click(token: impl Into<String>, link_url: impl Into<String>, client: ClientInfo) -> Self {
        Self {
            token: token.into(),
            event: EventType::Click,
            link_url: Some(link_url.into()),
            client,
        }
    }

    /// Recipient id carried by the token, if it is well formed
    pub fn recipient_id(&self) -> Option<RecipientId> {
        Uuid::parse_str(self.token.trim()).ok()
    }
}

/// Outcome of ingesting one signal
#[derive(Debug)]
pub enum Ingestion {
    /// Counter bumped and event appended
    Recorded(Recipient),
    /// No recipient matches the token; nothing was written
    UnknownRecipient,
    /// A datastore write failed; the counter may or may not have moved
    Degraded(Error),
}

impl Ingestion {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Ingestion::Recorded(_))
    }
}

/// Applies tracking signals to the datastore
#[derive(Clone)]
pub struct Tracker {
    store: Datastore,
    metrics: TrackingMetrics,
}

impl Tracker {
    pub fn new(store: Datastore, metrics: TrackingMetrics) -> Self {
        Self { store, metrics }
    }

    pub fn metrics(&self) -> &TrackingMetrics {
        &self.metrics
    }

    /// Ingest a signal, logging and counting the outcome
    pub async fn ingest(&self, signal: TrackingSignal) -> Ingestion {
        let event = signal.event;
        let outcome = self.apply(signal).await;

        match &outcome {
            Ingestion::Recorded(recipient) => {
                self.metrics.recorded(event);
                debug!(
                    recipient_id = %recipient.id,
                    campaign_id = %recipient.campaign_id,
                    event_type = %event,
                    count = recipient.count_for(event),
                    "Tracking event recorded"
                );
            }
            Ingestion::UnknownRecipient => {
                self.metrics.unknown_recipient(event);
                debug!(event_type = %event, "Tracking request for unknown recipient");
            }
            Ingestion::Degraded(e) => {
                self.metrics.degraded(event);
                warn!(event_type = %event, error = %e, "Tracking write failed; serving response anyway");
            }
        }

        outcome
    }

    async fn apply(&self, signal: TrackingSignal) -> Ingestion {
        let Some(recipient_id) = signal.recipient_id() else {
            return Ingestion::UnknownRecipient;
        };

        let updated = match signal.event {
            EventType::Open => self.store.recipients.record_open(recipient_id).await,
            EventType::Click => self.store.recipients.record_click(recipient_id).await,
        };

        let recipient = match updated {
            Ok(Some(recipient)) => recipient,
            Ok(None) => return Ingestion::UnknownRecipient,
            Err(e) => return Ingestion::Degraded(e),
        };

        let row = NewTrackingEvent {
            recipient_id,
            event_type: signal.event,
            link_url: signal.link_url,
            client: signal.client,
        };

        match self.store.events.append(row).await {
            Ok(_) => Ingestion::Recorded(recipient),
            Err(e) => Ingestion::Degraded(e),
        }
    }
}
