//! Campaign send flow
//!
//! One recipient per call: look up or create the recipient row, instrument
//! the campaign HTML for that recipient, transmit once, then stamp `sent_at`.

use crate::mailer::{sender_mailbox, Mailer, OutboundEmail};
use crate::rewrite::LinkRewriter;
use mailpulse_common::types::{CampaignId, CampaignStatus, EmailAddress};
use mailpulse_common::{Error, Result};
use mailpulse_storage::{Datastore, Recipient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Send request for a single recipient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub campaign_id: CampaignId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Sends campaign emails with tracking instrumentation
#[derive(Clone)]
pub struct CampaignSender {
    store: Datastore,
    mailer: Arc<dyn Mailer>,
    rewriter: LinkRewriter,
}

impl CampaignSender {
    pub fn new(store: Datastore, mailer: Arc<dyn Mailer>, rewriter: LinkRewriter) -> Self {
        Self {
            store,
            mailer,
            rewriter,
        }
    }

    /// Send the campaign to one address and return the recipient row
    pub async fn send(&self, request: SendRequest) -> Result<Recipient> {
        let email = request.email.trim();
        if EmailAddress::parse(email).is_none() {
            return Err(Error::Validation(format!("Invalid email address: {:?}", email)));
        }
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let campaign = self
            .store
            .campaigns
            .get(request.campaign_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Campaign {} not found", request.campaign_id)))?;
        sender_mailbox(&campaign.from_name, &campaign.from_email)?;

        let recipient = self
            .store
            .recipients
            .find_or_create(campaign.id, email, name)
            .await?;

        let outbound = OutboundEmail {
            to: email.to_string(),
            from_name: campaign.from_name.clone(),
            from_email: campaign.from_email.clone(),
            subject: campaign.subject.clone(),
            html: self.rewriter.rewrite(&campaign.html_content, recipient.id),
        };

        if let Err(e) = self.mailer.send(&outbound).await {
            warn!(
                campaign_id = %campaign.id,
                recipient_id = %recipient.id,
                error = %e,
                "Campaign email not sent"
            );
            return Err(e);
        }

        let recipient = self
            .store
            .recipients
            .mark_sent(recipient.id)
            .await?
            .ok_or_else(|| Error::Internal(format!("Recipient {} disappeared", recipient.id)))?;

        self.store
            .campaigns
            .update_status(campaign.id, CampaignStatus::Sent)
            .await?;

        info!(
            campaign_id = %campaign.id,
            recipient_id = %recipient.id,
            "Campaign email sent"
        );

        Ok(recipient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mailpulse_storage::{CampaignRepository, CreateCampaign, MemoryStore, RecipientRepository};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<()> {
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    struct RefusingMailer;

    #[async_trait]
    impl Mailer for RefusingMailer {
        async fn send(&self, _email: &OutboundEmail) -> Result<()> {
            Err(Error::Smtp("554 relay refused".into()))
        }
    }

    async fn campaign(memory: &MemoryStore) -> CampaignId {
        campaign_from(memory, "News", "news@example.com").await
    }

    async fn campaign_from(memory: &MemoryStore, from_name: &str, from_email: &str) -> CampaignId {
        memory
            .create(CreateCampaign {
                name: "Launch".to_string(),
                subject: "We are live".to_string(),
                from_email: from_email.to_string(),
                from_name: from_name.to_string(),
                html_content: r#"<a href="https://example.com">Visit</a>"#.to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn request(campaign_id: CampaignId, email: &str) -> SendRequest {
        SendRequest {
            campaign_id,
            email: email.to_string(),
            name: Some("Ann".to_string()),
        }
    }

    #[tokio::test]
    async fn test_send_instruments_and_marks_sent() {
        let memory = Arc::new(MemoryStore::new());
        let campaign_id = campaign(&memory).await;
        let mailer = Arc::new(RecordingMailer::default());
        let sender = CampaignSender::new(
            Datastore::from_memory(memory.clone()),
            mailer.clone(),
            LinkRewriter::new("http://t.example.com"),
        );

        let recipient = sender.send(request(campaign_id, "ann@example.com")).await.unwrap();
        assert!(recipient.sent_at.is_some());
        assert_eq!(recipient.name.as_deref(), Some("Ann"));

        let sent = mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from_name, "News");
        assert_eq!(sent[0].from_email, "news@example.com");
        assert!(sent[0].html.contains(&format!(
            "http://t.example.com/track/click/{}?url=https%3A%2F%2Fexample.com",
            recipient.id
        )));
        assert!(sent[0].html.contains(&format!("/track/open/{}", recipient.id)));

        let stored = CampaignRepository::get(memory.as_ref(), campaign_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status_enum(), Some(CampaignStatus::Sent));
        assert_eq!(stored.html_content, r#"<a href="https://example.com">Visit</a>"#);
    }

    #[tokio::test]
    async fn test_resend_reuses_recipient_and_keeps_sent_at() {
        let memory = Arc::new(MemoryStore::new());
        let campaign_id = campaign(&memory).await;
        let sender = CampaignSender::new(
            Datastore::from_memory(memory.clone()),
            Arc::new(RecordingMailer::default()),
            LinkRewriter::new("http://localhost:3000"),
        );

        let first = sender.send(request(campaign_id, "ann@example.com")).await.unwrap();
        let second = sender.send(request(campaign_id, "ann@example.com")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.sent_at, second.sent_at);
        assert_eq!(memory.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_transmission_leaves_sent_at_null() {
        let memory = Arc::new(MemoryStore::new());
        let campaign_id = campaign(&memory).await;
        let sender = CampaignSender::new(
            Datastore::from_memory(memory.clone()),
            Arc::new(RefusingMailer),
            LinkRewriter::new("http://localhost:3000"),
        );

        let err = sender.send(request(campaign_id, "ann@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::Smtp(_)));

        let rows = memory.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].sent_at.is_none());
        let stored = CampaignRepository::get(memory.as_ref(), campaign_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status_enum(), Some(CampaignStatus::Draft));
    }

    #[tokio::test]
    async fn test_sender_name_with_comma_is_sent() {
        let memory = Arc::new(MemoryStore::new());
        let campaign_id = campaign_from(&memory, "Acme, Inc", "shop@example.com").await;
        let mailer = Arc::new(RecordingMailer::default());
        let sender = CampaignSender::new(
            Datastore::from_memory(memory.clone()),
            mailer.clone(),
            LinkRewriter::new("http://localhost:3000"),
        );

        let recipient = sender.send(request(campaign_id, "ann@example.com")).await.unwrap();
        assert!(recipient.sent_at.is_some());

        let sent = mailer.sent.lock().unwrap().clone();
        let raw = String::from_utf8(sent[0].to_message().unwrap().formatted()).unwrap();
        assert!(raw.contains("Acme, Inc"));
        assert!(raw.contains("<shop@example.com>"));
    }

    #[tokio::test]
    async fn test_invalid_sender_address_creates_no_recipient() {
        let memory = Arc::new(MemoryStore::new());
        let campaign_id = campaign_from(&memory, "Shop", "not an address").await;
        let mailer = Arc::new(RecordingMailer::default());
        let sender = CampaignSender::new(
            Datastore::from_memory(memory.clone()),
            mailer.clone(),
            LinkRewriter::new("http://localhost:3000"),
        );

        let err = sender.send(request(campaign_id, "ann@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(memory.list_all().await.unwrap().is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validation_and_missing_campaign() {
        let memory = Arc::new(MemoryStore::new());
        let sender = CampaignSender::new(
            Datastore::from_memory(memory.clone()),
            Arc::new(RecordingMailer::default()),
            LinkRewriter::new("http://localhost:3000"),
        );

        let err = sender.send(request(Uuid::new_v4(), "  ")).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = sender
            .send(request(Uuid::new_v4(), "ann@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(memory.list_all().await.unwrap().is_empty());
    }
}
