//! Event bus doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use makan_core::bus::EventBus;
use makan_core::envelope::Envelope;
use makan_core::error::PipelineError;

/// An `EventBus` that records every published envelope.
#[derive(Debug, Default)]
pub struct RecordingEventBus {
    published: Mutex<Vec<Envelope>>,
}

impl RecordingEventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all published envelopes.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn published(&self) -> Vec<Envelope> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, envelope: &Envelope) -> Result<(), PipelineError> {
        self.published.lock().unwrap().push(envelope.clone());
        Ok(())
    }
}

/// An `EventBus` that always fails, for exercising the publisher's
/// swallow-on-failure policy.
#[derive(Debug, Default)]
pub struct FailingEventBus;

#[async_trait]
impl EventBus for FailingEventBus {
    async fn publish(&self, _envelope: &Envelope) -> Result<(), PipelineError> {
        Err(PipelineError::Transient("bus unreachable".into()))
    }
}
