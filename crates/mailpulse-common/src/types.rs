//! Common types for MailPulse

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for campaigns
pub type CampaignId = Uuid;

/// Unique identifier for recipients, doubling as the tracking token
pub type RecipientId = Uuid;

/// Unique identifier for tracking events
pub type EventId = Uuid;

/// Kind of tracking interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Open,
    Click,
}

impl EventType {
    /// String form as stored in the datastore
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Open => "open",
            EventType::Click => "click",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(EventType::Open),
            "click" => Ok(EventType::Click),
            _ => Err(crate::Error::Validation(format!("Invalid event type: {}", s))),
        }
    }
}

/// Campaign status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Scheduled,
    Sent,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Scheduled => write!(f, "scheduled"),
            CampaignStatus::Sent => write!(f, "sent"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "scheduled" => Ok(CampaignStatus::Scheduled),
            "sent" => Ok(CampaignStatus::Sent),
            _ => Err(crate::Error::Validation(format!(
                "Invalid campaign status: {}",
                s
            ))),
        }
    }
}

/// Email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress {
    pub local: String,
    pub domain: String,
}

impl EmailAddress {
    /// Create a new email address
    pub fn new(local: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            domain: domain.into(),
        }
    }

    /// Parse an email address from a string
    pub fn parse(s: &str) -> Option<Self> {
        let (local, domain) = s.trim().split_once('@')?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return None;
        }
        Some(Self::new(local, domain))
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

impl std::str::FromStr for EmailAddress {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| crate::Error::Validation("Invalid email address".to_string()))
    }
}

/// Client metadata captured with each tracking event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// Placeholder used when a header is missing
    pub const UNKNOWN: &'static str = "unknown";

    /// Build client info, substituting `unknown` for missing values
    pub fn new(ip_address: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            ip_address: ip_address.unwrap_or(Self::UNKNOWN).to_string(),
            user_agent: user_agent.unwrap_or(Self::UNKNOWN).to_string(),
        }
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new(None, None)
    }
}
