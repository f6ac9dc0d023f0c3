//! Makan ranking pipeline — `PostgreSQL`-backed storage.
//!
//! All conditional vote mutations run as single guarded statements so the
//! idempotency and last-writer-wins checks happen atomically in the row.
//! No locks are held across network calls.

pub mod pg_aggregate_store;
pub mod pg_dead_letter_store;
pub mod pg_dish_catalog;
pub mod pg_vote_store;
pub mod schema;

pub use pg_aggregate_store::PgAggregateStore;
pub use pg_dead_letter_store::PgDeadLetterStore;
pub use pg_dish_catalog::PgDishCatalog;
pub use pg_vote_store::PgVoteStore;
pub use schema::create_schema;
