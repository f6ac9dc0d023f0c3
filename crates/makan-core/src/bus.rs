//! Event bus abstraction.

use async_trait::async_trait;

use crate::envelope::Envelope;
use crate::error::PipelineError;

/// Seam over the durable event bus the publisher emits onto.
///
/// The bus substrate is an external collaborator: it delivers at least once,
/// with no cross-partition ordering guarantee.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes one envelope.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` when the bus is unreachable. The
    /// publisher's policy decides whether that propagates.
    async fn publish(&self, envelope: &Envelope) -> Result<(), PipelineError>;
}
