//! Prometheus counters for tracking ingestion

use mailpulse_common::types::EventType;
use mailpulse_common::{Error, Result};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Tracking counters registered on a private registry
#[derive(Clone)]
pub struct TrackingMetrics {
    registry: Registry,
    events: IntCounterVec,
    degraded: IntCounterVec,
    unknown_recipient: IntCounterVec,
}

impl TrackingMetrics {
    /// Create and register the tracking counters
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let events = counter(
            &registry,
            "mailpulse_tracking_events_total",
            "Tracking events recorded against a known recipient",
        )?;
        let degraded = counter(
            &registry,
            "mailpulse_tracking_degraded_total",
            "Tracking requests served without a complete datastore write",
        )?;
        let unknown_recipient = counter(
            &registry,
            "mailpulse_tracking_unknown_recipient_total",
            "Tracking requests for an unknown recipient id",
        )?;

        Ok(Self {
            registry,
            events,
            degraded,
            unknown_recipient,
        })
    }

    pub fn recorded(&self, event: EventType) {
        self.events.with_label_values(&[event.as_str()]).inc();
    }

    pub fn degraded(&self, event: EventType) {
        self.degraded.with_label_values(&[event.as_str()]).inc();
    }

    pub fn unknown_recipient(&self, event: EventType) {
        self.unknown_recipient
            .with_label_values(&[event.as_str()])
            .inc();
    }

    /// Current value of a recorded-events counter
    pub fn recorded_count(&self, event: EventType) -> u64 {
        self.events.with_label_values(&[event.as_str()]).get()
    }

    /// Current value of a degraded counter
    pub fn degraded_count(&self, event: EventType) -> u64 {
        self.degraded.with_label_values(&[event.as_str()]).get()
    }

    /// Render all counters in the Prometheus text format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| Error::Internal(format!("Failed to encode metrics: {}", e)))?;
        String::from_utf8(buffer)
            .map_err(|e| Error::Internal(format!("Metrics output is not UTF-8: {}", e)))
    }
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounterVec> {
    let vec = IntCounterVec::new(Opts::new(name, help), &["event_type"])
        .map_err(|e| Error::Internal(format!("Invalid metric {}: {}", name, e)))?;
    registry
        .register(Box::new(vec.clone()))
        .map_err(|e| Error::Internal(format!("Failed to register {}: {}", name, e)))?;
    Ok(vec)
}
