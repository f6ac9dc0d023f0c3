//! Domain logic for the ranking context.

pub mod aggregates;
