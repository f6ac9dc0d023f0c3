//! Makan ranking pipeline — dead-letter capture and bounded retry.
//!
//! Transient failures get a bounded exponential-backoff retry budget;
//! validation and business-rule failures are terminal and route straight to
//! the durable holding area. Nothing in the holding area re-enters the main
//! processing path automatically.

mod coordinator;
mod retry;

pub use coordinator::{DeadLetterCoordinator, Outcome};
pub use retry::RetryPolicy;
