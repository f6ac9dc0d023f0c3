//! Meilisearch-backed implementation of the `SearchIndexWriter` seam.

use async_trait::async_trait;
use meilisearch_sdk::{
    client::Client,
    settings::{MinWordSizeForTypos, Settings, TypoToleranceSettings},
};

use makan_core::error::PipelineError;
use makan_core::index::{SearchDocument, SearchIndexWriter};

/// Primary key of the dish index; equals the dish identifier so repeated
/// upserts converge.
pub const DOCUMENT_ID: &str = "id";
const FIELD_NAME: &str = "name";
const FIELD_DESCRIPTION: &str = "description";
const FIELD_RESTAURANT_NAME: &str = "restaurant_name";
const FIELD_CATEGORY: &str = "category";
const FIELD_TAGS: &str = "tags";
const FIELD_RATING: &str = "rating";
const FIELD_UPDATED_AT: &str = "updated_at";

/// Writes search documents to a Meilisearch index.
pub struct MeiliIndexWriter {
    client: Client,
    index_name: String,
}

impl MeiliIndexWriter {
    /// Connects to a Meilisearch instance.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` when the client cannot be
    /// constructed from the given endpoint.
    pub fn new(
        url: &str,
        api_key: Option<&str>,
        index_name: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let client =
            Client::new(url, api_key).map_err(|error| PipelineError::Transient(error.to_string()))?;
        Ok(Self {
            client,
            index_name: index_name.into(),
        })
    }

    /// Applies the index settings: `rating` is the sortable default sort
    /// field, `category`/`tags` are filterable, and typo tolerance is tuned
    /// for short dish names.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Transient` when the index is unreachable.
    pub async fn apply_settings(&self) -> Result<(), PipelineError> {
        self.client
            .index(&self.index_name)
            .set_settings(&index_settings())
            .await
            .map_err(|error| PipelineError::Transient(error.to_string()))?;
        Ok(())
    }
}

fn index_settings() -> Settings {
    Settings::new()
        .with_ranking_rules([
            "words",
            "typo",
            "proximity",
            "exactness",
            "attribute",
            "sort",
        ])
        .with_searchable_attributes([FIELD_NAME, FIELD_DESCRIPTION, FIELD_RESTAURANT_NAME])
        .with_filterable_attributes([FIELD_CATEGORY, FIELD_TAGS])
        .with_sortable_attributes([FIELD_RATING, FIELD_UPDATED_AT])
        .with_typo_tolerance(TypoToleranceSettings {
            enabled: Some(true),
            disable_on_attributes: None,
            disable_on_words: None,
            min_word_size_for_typos: Some(MinWordSizeForTypos {
                one_typo: Some(5),
                two_typos: Some(9),
            }),
        })
}

#[async_trait]
impl SearchIndexWriter for MeiliIndexWriter {
    async fn upsert(&self, documents: &[SearchDocument]) -> Result<(), PipelineError> {
        self.client
            .index(&self.index_name)
            .add_or_update(documents, Some(DOCUMENT_ID))
            .await
            .map_err(|error| PipelineError::Transient(error.to_string()))?;
        Ok(())
    }
}
