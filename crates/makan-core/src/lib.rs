//! Makan Core — shared domain abstractions.
//!
//! This crate defines the event envelope, the structural validator, the
//! error taxonomy, and the trait seams (storage, bus, search index) that all
//! pipeline stages depend on. It contains no infrastructure code.

pub mod bus;
pub mod clock;
pub mod envelope;
pub mod error;
pub mod index;
pub mod repository;
pub mod validate;
