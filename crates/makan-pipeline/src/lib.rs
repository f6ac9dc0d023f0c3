//! Makan ranking pipeline — consumer middleware and delivery dispatch.
//!
//! Sits between the push-based delivery substrate and the business
//! handlers: parses and structurally validates each queue record
//! independently, dispatches validated events to the ranking aggregator and
//! search synchronizer, and isolates per-record failures so one bad record
//! never blocks its batch.

pub mod delivery;
pub mod middleware;
pub mod pipeline;

pub use pipeline::{BatchReport, DeliveryPipeline, RecordOutcome, RecordStatus};
