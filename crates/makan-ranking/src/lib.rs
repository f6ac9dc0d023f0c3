//! Makan ranking pipeline — vote aggregation bounded context.
//!
//! Responsible for the one-vote-per-user-per-category invariant, idempotent
//! last-writer-wins vote application, retraction, and recomputation of the
//! derived per-dish ranking view.

pub mod application;
pub mod domain;

pub use application::command_handlers::{RankingAggregator, VoteApplication, VoteRetraction};
pub use application::query_handlers::{ActiveVoteView, DishRankingView};
