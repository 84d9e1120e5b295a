//! MailPulse Core - Tracking ingestion, send flow and analytics
//!
//! This crate provides the campaign tracking logic for MailPulse:
//! open/click ingestion, outbound link instrumentation, the single-shot
//! send flow and the read-side statistics.

pub mod analytics;
pub mod mailer;
pub mod metrics;
pub mod rewrite;
pub mod sender;
pub mod stats;
pub mod tracking;

pub use analytics::{
    Analytics, AnalyticsReport, CampaignPerformance, CounterDrift, DailyActivity,
};
pub use mailer::{Mailer, OutboundEmail, SmtpMailer};
pub use metrics::TrackingMetrics;
pub use rewrite::LinkRewriter;
pub use sender::{CampaignSender, SendRequest};
pub use stats::CampaignStats;
pub use tracking::{Ingestion, Tracker, TrackingSignal};
