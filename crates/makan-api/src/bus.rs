//! HTTP transport for the event bus seam.

use async_trait::async_trait;
use reqwest::Client;

use makan_core::bus::EventBus;
use makan_core::envelope::Envelope;
use makan_core::error::PipelineError;

/// Publishes envelopes by POSTing their wire JSON to the bus endpoint.
pub struct HttpEventBus {
    client: Client,
    endpoint: String,
}

impl HttpEventBus {
    /// Creates a bus transport targeting `endpoint`.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EventBus for HttpEventBus {
    async fn publish(&self, envelope: &Envelope) -> Result<(), PipelineError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&envelope.to_wire())
            .send()
            .await
            .map_err(|error| PipelineError::Transient(error.to_string()))?;

        response
            .error_for_status()
            .map_err(|error| PipelineError::Transient(error.to_string()))?;
        Ok(())
    }
}
