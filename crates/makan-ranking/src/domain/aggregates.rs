//! The aggregate ranking view and its recomputation.

use chrono::{DateTime, Utc};
use makan_core::repository::{DishAggregate, Vote};

/// Recomputes a dish's ranking summary from the full current vote set.
///
/// Deriving from the complete set (rather than trusting an incremental
/// delta) lets the pipeline self-heal from any missed update: replaying a
/// recomputation always converges on the same summary.
#[must_use]
pub fn recompute(dish_id: &str, votes: &[Vote], now: DateTime<Utc>) -> DishAggregate {
    let vote_count = votes.len();
    let average_rank = if vote_count == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let count = vote_count as f64;
        votes.iter().map(|vote| f64::from(vote.rank)).sum::<f64>() / count
    };

    DishAggregate {
        dish_id: dish_id.to_owned(),
        vote_count: i64::try_from(vote_count).unwrap_or(i64::MAX),
        average_rank,
        updated_at: now,
    }
}
