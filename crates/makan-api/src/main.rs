//! Makan ranking pipeline API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use makan_api::bus::HttpEventBus;
use makan_api::config::Config;
use makan_api::error::AppError;
use makan_api::routes;
use makan_api::state::AppState;
use makan_core::clock::SystemClock;
use makan_deadletter::{DeadLetterCoordinator, RetryPolicy};
use makan_pipeline::DeliveryPipeline;
use makan_publisher::EventPublisher;
use makan_ranking::RankingAggregator;
use makan_search::SearchSynchronizer;
use makan_search::meili::MeiliIndexWriter;
use makan_store::{
    PgAggregateStore, PgDeadLetterStore, PgDishCatalog, PgVoteStore, create_schema,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        environment = %config.environment,
        "Starting Makan ranking pipeline API server"
    );

    // Create database connection pool and ensure the schema.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    create_schema(&pool).await?;

    // Connect the search index and apply its settings.
    let index = MeiliIndexWriter::new(
        &config.search_url,
        config.search_api_key.as_deref(),
        config.search_index.clone(),
    )?;
    index.apply_settings().await?;
    let index = Arc::new(index);

    // Wire the pipeline.
    let clock = Arc::new(SystemClock);
    let votes = Arc::new(PgVoteStore::new(pool.clone()));
    let aggregates = Arc::new(PgAggregateStore::new(pool.clone()));
    let catalog = Arc::new(PgDishCatalog::new(pool.clone()));
    let letters = Arc::new(PgDeadLetterStore::new(pool.clone()));

    let aggregator = Arc::new(RankingAggregator::new(
        votes.clone(),
        aggregates.clone(),
        catalog.clone(),
        clock.clone(),
    ));
    let synchronizer = Arc::new(SearchSynchronizer::new(catalog, aggregates.clone(), index));
    let coordinator = Arc::new(DeadLetterCoordinator::new(
        letters,
        RetryPolicy::default(),
        clock.clone(),
    ));
    let pipeline = Arc::new(DeliveryPipeline::new(
        aggregator,
        synchronizer,
        coordinator,
        config.dish_table.clone(),
    ));

    let bus = Arc::new(HttpEventBus::new(config.bus_endpoint.clone()));
    let publisher = Arc::new(EventPublisher::new(bus, clock, config.event_source.clone()));

    let app_state = AppState::new(pipeline, publisher, votes, aggregates);

    // Build router.
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::deliveries::router())
        .nest("/api/v1", routes::votes::router())
        .nest("/api/v1", routes::registrations::router())
        .nest("/api/v1", routes::rankings::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server.
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
