//! Integration tests for the ranking read view.

mod common;

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use makan_core::repository::{AggregateStore, DishAggregate};

#[tokio::test]
async fn test_ranking_view_returns_the_aggregate() {
    let harness = common::build_test_app(&["d1"]);
    harness
        .aggregates
        .put(DishAggregate {
            dish_id: "d1".to_owned(),
            vote_count: 3,
            average_rank: 1.5,
            updated_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        })
        .await
        .unwrap();

    let (status, body) = common::get_json(harness.app, "/api/v1/rankings/d1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vote_count"], 3);
    assert!((body["average_rank"].as_f64().unwrap() - 1.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_ranking_view_returns_404_for_unranked_dish() {
    let harness = common::build_test_app(&[]);

    let (status, body) = common::get_json(harness.app, "/api/v1/rankings/d404").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
