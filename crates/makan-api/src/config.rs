//! Environment-driven server configuration.

use crate::error::AppError;

/// Runtime configuration read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Meilisearch endpoint.
    pub search_url: String,
    /// Meilisearch API key, when the instance requires one.
    pub search_api_key: Option<String>,
    /// Name of the dish search index.
    pub search_index: String,
    /// Event bus endpoint envelopes are posted to.
    pub bus_endpoint: String,
    /// Deployment environment tag (dev/staging/prod).
    pub environment: String,
    /// `source` value stamped on published envelopes.
    pub event_source: String,
    /// Catalog table whose change notifications trigger re-indexing.
    pub dish_table: String,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when a required variable is missing or a
    /// numeric variable does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = required("DATABASE_URL")?;
        let search_url = required("MEILISEARCH_URL")?;
        let bus_endpoint = required("EVENT_BUS_URL")?;

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_owned())
            .parse()
            .map_err(|error| AppError::Config(format!("PORT must be a valid u16: {error}")))?;

        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_owned()),
            port,
            database_url,
            search_url,
            search_api_key: std::env::var("MEILISEARCH_API_KEY").ok(),
            search_index: std::env::var("MEILISEARCH_INDEX").unwrap_or_else(|_| "dishes".to_owned()),
            bus_endpoint,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_owned()),
            event_source: std::env::var("EVENT_SOURCE").unwrap_or_else(|_| "makan.api".to_owned()),
            dish_table: std::env::var("DISH_TABLE").unwrap_or_else(|_| "dishes".to_owned()),
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    std::env::var(name)
        .map_err(|_| AppError::Config(format!("{name} environment variable must be set")))
}
