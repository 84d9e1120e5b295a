//! Shared handler state

use mailpulse_common::config::TrackingConfig;
use mailpulse_common::Result;
use mailpulse_core::{
    Analytics, CampaignSender, LinkRewriter, Mailer, Tracker, TrackingMetrics,
};
use mailpulse_storage::Datastore;
use std::sync::Arc;

/// Services available to every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Datastore,
    pub tracker: Tracker,
    pub analytics: Analytics,
    pub sender: CampaignSender,
}

impl AppState {
    /// Wire the services over one datastore
    pub fn new(store: Datastore, mailer: Arc<dyn Mailer>, tracking: &TrackingConfig) -> Result<Self> {
        let metrics = TrackingMetrics::new()?;

        Ok(Self {
            tracker: Tracker::new(store.clone(), metrics),
            analytics: Analytics::new(store.clone(), tracking.recent_events_limit),
            sender: CampaignSender::new(
                store.clone(),
                mailer,
                LinkRewriter::new(tracking.base_url.clone()),
            ),
            store,
        })
    }
}
