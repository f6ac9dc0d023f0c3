//! Makan ranking pipeline — HTTP surface.
//!
//! Exposes the producer-side domain actions, the push-based delivery
//! ingestion endpoint, and the read-side ranking views.

pub mod bus;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
