//! Shared fixtures for router tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use mailpulse_api::{create_router, AppState};
use mailpulse_common::config::TrackingConfig;
use mailpulse_common::types::{CampaignId, CampaignStatus, RecipientId};
use mailpulse_common::{Error, Result};
use mailpulse_core::{Mailer, OutboundEmail};
use mailpulse_storage::{
    ActivityEntry, Campaign, CampaignRepository, CreateCampaign, Datastore, EventRepository,
    MemoryStore, NewTrackingEvent, Recipient, RecipientRepository, TrackingEvent,
};
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "http://track.test";

/// Mailer that keeps every message it is handed
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<()> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Datastore whose every call fails
pub struct UnavailableStore;

fn down<T>() -> Result<T> {
    Err(Error::Database("connection refused".into()))
}

#[async_trait]
impl CampaignRepository for UnavailableStore {
    async fn create(&self, _input: CreateCampaign) -> Result<Campaign> {
        down()
    }
    async fn get(&self, _id: CampaignId) -> Result<Option<Campaign>> {
        down()
    }
    async fn list(&self) -> Result<Vec<Campaign>> {
        down()
    }
    async fn update_status(&self, _id: CampaignId, _s: CampaignStatus) -> Result<Option<Campaign>> {
        down()
    }
}

#[async_trait]
impl RecipientRepository for UnavailableStore {
    async fn find_or_create(
        &self,
        _campaign_id: CampaignId,
        _email: &str,
        _name: Option<&str>,
    ) -> Result<Recipient> {
        down()
    }
    async fn get(&self, _id: RecipientId) -> Result<Option<Recipient>> {
        down()
    }
    async fn mark_sent(&self, _id: RecipientId) -> Result<Option<Recipient>> {
        down()
    }
    async fn record_open(&self, _id: RecipientId) -> Result<Option<Recipient>> {
        down()
    }
    async fn record_click(&self, _id: RecipientId) -> Result<Option<Recipient>> {
        down()
    }
    async fn list_by_campaign(&self, _campaign_id: CampaignId) -> Result<Vec<Recipient>> {
        down()
    }
    async fn list_all(&self) -> Result<Vec<Recipient>> {
        down()
    }
}

#[async_trait]
impl EventRepository for UnavailableStore {
    async fn append(&self, _input: NewTrackingEvent) -> Result<TrackingEvent> {
        down()
    }
    async fn recent(&self, _limit: i64) -> Result<Vec<ActivityEntry>> {
        down()
    }
    async fn list_by_recipient(&self, _id: RecipientId) -> Result<Vec<TrackingEvent>> {
        down()
    }
    async fn list_by_campaign(&self, _id: CampaignId) -> Result<Vec<TrackingEvent>> {
        down()
    }
}

pub fn tracking_config() -> TrackingConfig {
    TrackingConfig {
        base_url: BASE_URL.to_string(),
        ..TrackingConfig::default()
    }
}

pub fn server(store: Datastore, mailer: Arc<RecordingMailer>) -> TestServer {
    let state = AppState::new(store, mailer, &tracking_config()).unwrap();
    TestServer::new(create_router(state)).unwrap()
}

/// Server over a fresh memory store
pub fn memory_server() -> (TestServer, Arc<MemoryStore>, Arc<RecordingMailer>) {
    let memory = Arc::new(MemoryStore::new());
    let mailer = Arc::new(RecordingMailer::default());
    let server = server(Datastore::from_memory(memory.clone()), mailer.clone());
    (server, memory, mailer)
}

/// Server whose datastore is unreachable
pub fn unavailable_server() -> TestServer {
    let store = Arc::new(UnavailableStore);
    server(
        Datastore::from_parts(store.clone(), store.clone(), store),
        Arc::new(RecordingMailer::default()),
    )
}

pub async fn seed_campaign(memory: &MemoryStore, html: &str) -> Campaign {
    memory
        .create(CreateCampaign {
            name: "Launch".to_string(),
            subject: "We are live".to_string(),
            from_email: "news@example.com".to_string(),
            from_name: "News".to_string(),
            html_content: html.to_string(),
        })
        .await
        .unwrap()
}
