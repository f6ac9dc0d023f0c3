//! Application-level handlers for the ranking context.

pub mod command_handlers;
pub mod query_handlers;
