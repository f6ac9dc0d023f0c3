//! Makan Publisher — producer-side envelope construction.
//!
//! Wraps a domain occurrence into the standardized envelope and emits it
//! onto the event bus. Publish failures are observable through telemetry but
//! never abort the domain action that triggered them: by the time an event
//! is published, the local state change has already committed.

mod publisher;

pub use publisher::EventPublisher;
