//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use makan_api::routes;
use makan_api::state::AppState;
use makan_deadletter::{DeadLetterCoordinator, RetryPolicy};
use makan_pipeline::DeliveryPipeline;
use makan_publisher::EventPublisher;
use makan_ranking::RankingAggregator;
use makan_search::SearchSynchronizer;
use makan_test_support::{
    FixedClock, InMemoryAggregateStore, InMemoryDishCatalog, InMemoryVoteStore,
    RecordingDeadLetterStore, RecordingEventBus, RecordingIndexWriter, sample_dish,
};

/// The full app wired over in-memory fakes, with handles kept for
/// assertions.
pub struct TestApp {
    pub app: Router,
    pub votes: Arc<InMemoryVoteStore>,
    pub aggregates: Arc<InMemoryAggregateStore>,
    pub letters: Arc<RecordingDeadLetterStore>,
    pub index: Arc<RecordingIndexWriter>,
    pub bus: Arc<RecordingEventBus>,
}

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router over in-memory fakes, seeding the catalog with
/// `dish_ids`. Uses the same route structure as `main.rs`.
pub fn build_test_app(dish_ids: &[&str]) -> TestApp {
    let bus = Arc::new(RecordingEventBus::new());
    let (app, votes, aggregates, letters, index) = wire(dish_ids, bus.clone());
    TestApp {
        app,
        votes,
        aggregates,
        letters,
        index,
        bus,
    }
}

/// Build the app over a custom event bus, e.g. one that always fails.
pub fn build_test_app_with_bus(
    dish_ids: &[&str],
    bus: Arc<dyn makan_core::bus::EventBus>,
) -> Router {
    wire(dish_ids, bus).0
}

type Wired = (
    Router,
    Arc<InMemoryVoteStore>,
    Arc<InMemoryAggregateStore>,
    Arc<RecordingDeadLetterStore>,
    Arc<RecordingIndexWriter>,
);

fn wire(dish_ids: &[&str], bus: Arc<dyn makan_core::bus::EventBus>) -> Wired {
    let clock = fixed_clock();
    let votes = Arc::new(InMemoryVoteStore::new());
    let aggregates = Arc::new(InMemoryAggregateStore::new());
    let letters = Arc::new(RecordingDeadLetterStore::new());
    let index = Arc::new(RecordingIndexWriter::new());

    let mut catalog = InMemoryDishCatalog::new();
    for dish_id in dish_ids {
        catalog = catalog.with_dish(sample_dish(dish_id));
    }
    let catalog = Arc::new(catalog);

    let aggregator = Arc::new(RankingAggregator::new(
        votes.clone(),
        aggregates.clone(),
        catalog.clone(),
        clock.clone(),
    ));
    let synchronizer = Arc::new(SearchSynchronizer::new(
        catalog,
        aggregates.clone(),
        index.clone(),
    ));
    let coordinator = Arc::new(DeadLetterCoordinator::new(
        letters.clone(),
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        },
        clock.clone(),
    ));
    let pipeline = Arc::new(DeliveryPipeline::new(
        aggregator,
        synchronizer,
        coordinator,
        "dishes",
    ));
    let publisher = Arc::new(EventPublisher::new(bus, clock, "makan.api"));

    let app_state = AppState::new(pipeline, publisher, votes.clone(), aggregates.clone());

    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::deliveries::router())
        .nest("/api/v1", routes::votes::router())
        .nest("/api/v1", routes::registrations::router())
        .nest("/api/v1", routes::rankings::router())
        .with_state(app_state);

    (app, votes, aggregates, letters, index)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
