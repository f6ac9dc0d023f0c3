//! Search index doubles.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use makan_core::error::PipelineError;
use makan_core::index::{SearchDocument, SearchIndexWriter};

/// A `SearchIndexWriter` that keeps documents keyed by id, so upserts
/// converge exactly like the production index.
#[derive(Debug, Default)]
pub struct RecordingIndexWriter {
    documents: Mutex<HashMap<String, SearchDocument>>,
}

impl RecordingIndexWriter {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the indexed document for `id`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn document(&self, id: &str) -> Option<SearchDocument> {
        self.documents.lock().unwrap().get(id).cloned()
    }

    /// Returns the number of indexed documents.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    /// Returns whether the index holds no documents.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn is_empty(&self) -> bool {
        self.documents.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl SearchIndexWriter for RecordingIndexWriter {
    async fn upsert(&self, documents: &[SearchDocument]) -> Result<(), PipelineError> {
        let mut indexed = self.documents.lock().unwrap();
        for document in documents {
            indexed.insert(document.id.clone(), document.clone());
        }
        Ok(())
    }
}

/// A `SearchIndexWriter` that always fails, for retry tests.
#[derive(Debug, Default)]
pub struct FailingIndexWriter;

#[async_trait]
impl SearchIndexWriter for FailingIndexWriter {
    async fn upsert(&self, _documents: &[SearchDocument]) -> Result<(), PipelineError> {
        Err(PipelineError::Transient("index unreachable".into()))
    }
}

/// A `SearchIndexWriter` that fails the first `failures` upserts and then
/// records like [`RecordingIndexWriter`], for recovery tests.
#[derive(Debug)]
pub struct FlakyIndexWriter {
    failures_left: AtomicU32,
    inner: RecordingIndexWriter,
}

impl FlakyIndexWriter {
    /// Creates a writer whose first `failures` upserts fail transiently.
    #[must_use]
    pub fn new(failures: u32) -> Self {
        Self {
            failures_left: AtomicU32::new(failures),
            inner: RecordingIndexWriter::new(),
        }
    }

    /// Returns the indexed document for `id`, if any.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn document(&self, id: &str) -> Option<SearchDocument> {
        self.inner.document(id)
    }
}

#[async_trait]
impl SearchIndexWriter for FlakyIndexWriter {
    async fn upsert(&self, documents: &[SearchDocument]) -> Result<(), PipelineError> {
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                left.checked_sub(1)
            })
            .is_ok();
        if failed {
            return Err(PipelineError::Transient("index unreachable".into()));
        }
        self.inner.upsert(documents).await
    }
}
