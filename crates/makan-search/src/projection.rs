//! Projection from canonical dish state into the search document schema.

use chrono::{DateTime, Utc};

use makan_core::index::SearchDocument;
use makan_core::repository::{DishAggregate, DishRecord};

/// Normalizes a timestamp to epoch milliseconds, the single numeric
/// representation the index sorts and filters on.
#[must_use]
pub fn epoch_ms(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp_millis()
}

/// Projects a dish and its ranking summary into a search document.
///
/// The projection is total: missing optional attributes are substituted
/// with defined defaults (empty string, zero, empty set) so an entry is
/// always indexable. A dish with no computed summary projects with zero
/// rating and review count.
#[must_use]
pub fn project(dish: &DishRecord, aggregate: Option<&DishAggregate>) -> SearchDocument {
    SearchDocument {
        id: dish.id.clone(),
        name: dish.name.clone(),
        description: dish.description.clone().unwrap_or_default(),
        restaurant_id: dish.restaurant_id.clone(),
        restaurant_name: dish.restaurant_name.clone(),
        price: dish.price.unwrap_or(0.0),
        category: dish.category.clone().unwrap_or_default(),
        tags: dish.tags.iter().cloned().collect(),
        rating: aggregate.map_or(0.0, |a| a.average_rank),
        review_count: aggregate.map_or(0, |a| a.vote_count),
        image_url: dish.image_url.clone().unwrap_or_default(),
        created_at: epoch_ms(dish.created_at),
        updated_at: epoch_ms(dish.updated_at),
    }
}
