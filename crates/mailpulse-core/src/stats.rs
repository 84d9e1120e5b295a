//! Campaign statistics
//!
//! Pure folds over recipient rows. Unique counts come from the first-event
//! timestamps, totals from the per-recipient counters.

use mailpulse_storage::Recipient;
use serde::{Deserialize, Serialize};

/// Aggregated view of a set of recipients
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignStats {
    pub recipient_count: u64,
    pub sent_count: u64,
    /// Recipients that opened at least once
    pub opened_count: u64,
    /// Recipients that clicked at least once
    pub clicked_count: u64,
    pub total_opens: u64,
    pub total_clicks: u64,
    pub open_rate: f64,
    pub click_rate: f64,
}

impl CampaignStats {
    /// Fold recipient rows into statistics
    pub fn from_recipients<'a, I>(recipients: I) -> Self
    where
        I: IntoIterator<Item = &'a Recipient>,
    {
        let mut stats = recipients
            .into_iter()
            .fold(Self::default(), |mut acc, r| {
                acc.recipient_count += 1;
                acc.sent_count += u64::from(r.sent_at.is_some());
                acc.opened_count += u64::from(r.opened_at.is_some());
                acc.clicked_count += u64::from(r.clicked_at.is_some());
                acc.total_opens += non_negative(r.opened_count);
                acc.total_clicks += non_negative(r.clicked_count);
                acc
            });

        stats.open_rate = rate(stats.opened_count, stats.sent_count);
        stats.click_rate = rate(stats.clicked_count, stats.sent_count);
        stats
    }
}

fn non_negative(count: i32) -> u64 {
    u64::try_from(count).unwrap_or(0)
}

/// Percentage rounded to one decimal place; zero when nothing was sent
pub fn rate(part: u64, sent: u64) -> f64 {
    if sent == 0 {
        return 0.0;
    }
    let pct = part as f64 / sent as f64 * 100.0;
    (pct * 10.0).round() / 10.0
}
