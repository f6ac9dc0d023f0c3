//! The event publisher.

use std::sync::Arc;

use uuid::Uuid;

use makan_core::bus::EventBus;
use makan_core::clock::Clock;
use makan_core::envelope::{ENVELOPE_VERSION, Envelope, EventKind, EventStatus};

/// Constructs standardized envelopes for domain occurrences and publishes
/// them to the bus.
pub struct EventPublisher {
    bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    source: String,
}

impl EventPublisher {
    /// Creates a publisher stamping `source` on every envelope.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>, clock: Arc<dyn Clock>, source: impl Into<String>) -> Self {
        Self {
            bus,
            clock,
            source: source.into(),
        }
    }

    /// Wraps `kind` in a fresh envelope and publishes it.
    ///
    /// A fresh `event_id` is generated per call; `trace_id` is propagated
    /// from the caller's context when present, otherwise minted here. When
    /// the bus rejects the publish, the failure is logged with the full
    /// serialized envelope so it can be replayed manually, and the envelope
    /// is still returned: the caller's domain action has already committed
    /// and must not be rolled back.
    pub async fn publish(
        &self,
        user_id: &str,
        trace_id: Option<String>,
        kind: EventKind,
    ) -> Envelope {
        let envelope = Envelope {
            event_id: Uuid::new_v4().to_string(),
            timestamp: self.clock.now(),
            source: self.source.clone(),
            version: ENVELOPE_VERSION,
            trace_id: trace_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            user_id: user_id.to_owned(),
            status: EventStatus::Confirmed,
            kind,
            metadata: serde_json::Map::new(),
        };

        if let Err(error) = self.bus.publish(&envelope).await {
            tracing::error!(
                event_id = %envelope.event_id,
                trace_id = %envelope.trace_id,
                event_type = envelope.event_type(),
                envelope = %envelope.to_wire(),
                %error,
                "event publish failed; envelope preserved for manual replay"
            );
        } else {
            tracing::debug!(
                event_id = %envelope.event_id,
                trace_id = %envelope.trace_id,
                event_type = envelope.event_type(),
                "event published"
            );
        }

        envelope
    }
}
