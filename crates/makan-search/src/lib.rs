//! Makan ranking pipeline — search index synchronization.
//!
//! Projects canonical dish state (catalog metadata plus the aggregate
//! ranking view) into the denormalized search document schema and keeps the
//! index eventually consistent with the aggregator's output. The index is
//! allowed to lag; no client may assume read-after-write consistency with
//! the ranking aggregate.

pub mod meili;
pub mod projection;
pub mod synchronizer;

pub use synchronizer::SearchSynchronizer;
