//! Query handlers for the ranking context.
//!
//! Read-only views over the active vote set and the derived per-dish
//! summaries.

use chrono::{DateTime, Utc};
use serde::Serialize;

use makan_core::error::PipelineError;
use makan_core::repository::{AggregateStore, VoteStore};

/// Read-only view of a user's active vote in a category.
#[derive(Debug, Serialize)]
pub struct ActiveVoteView {
    /// The voter.
    pub user_id: String,
    /// The category.
    pub category: String,
    /// The dish currently holding the vote.
    pub dish_id: String,
    /// Rating/position assigned by the voter.
    pub rank: u32,
    /// Timestamp of the event that produced this state.
    pub cast_at: DateTime<Utc>,
    /// When the vote row was last mutated.
    pub updated_at: DateTime<Utc>,
}

/// Read-only view of a dish's ranking summary.
#[derive(Debug, Serialize)]
pub struct DishRankingView {
    /// The dish.
    pub dish_id: String,
    /// Number of active votes.
    pub vote_count: i64,
    /// Mean rank across active votes.
    pub average_rank: f64,
    /// When the summary was last recomputed.
    pub updated_at: DateTime<Utc>,
}

/// Retrieves a user's active vote in a category, if one exists.
///
/// # Errors
///
/// Returns `PipelineError::Transient` on storage failure.
pub async fn get_active_vote(
    user_id: &str,
    category: &str,
    votes: &dyn VoteStore,
) -> Result<Option<ActiveVoteView>, PipelineError> {
    let vote = votes.get(user_id, category).await?;
    Ok(vote.map(|vote| ActiveVoteView {
        user_id: vote.user_id,
        category: vote.category,
        dish_id: vote.dish_id,
        rank: vote.rank,
        cast_at: vote.cast_at,
        updated_at: vote.updated_at,
    }))
}

/// Retrieves the ranking summary for a dish, if one has been computed.
///
/// # Errors
///
/// Returns `PipelineError::Transient` on storage failure.
pub async fn get_dish_ranking(
    dish_id: &str,
    aggregates: &dyn AggregateStore,
) -> Result<Option<DishRankingView>, PipelineError> {
    let aggregate = aggregates.get(dish_id).await?;
    Ok(aggregate.map(|aggregate| DishRankingView {
        dish_id: aggregate.dish_id,
        vote_count: aggregate.vote_count,
        average_rank: aggregate.average_rank,
        updated_at: aggregate.updated_at,
    }))
}
