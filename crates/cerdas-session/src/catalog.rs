//! Read-through cache of the backend's document list.

use std::sync::Arc;

use tracing::{debug, warn};

use cerdas_core::{Document, DocumentBackend, Error, EventBus, Result, SessionEvent};

/// Snapshot of the documents the backend knows about, in backend order.
///
/// A refresh replaces the whole snapshot at once. When a refresh fails the
/// snapshot becomes empty rather than keeping stale entries.
pub struct Catalog {
    documents: Arc<[Document]>,
    events: EventBus,
}

impl Catalog {
    pub fn new(events: EventBus) -> Self {
        Self {
            documents: Arc::from(Vec::new()),
            events,
        }
    }

    /// Fetch the full list and swap it in. Returns the new document count.
    pub async fn refresh(&mut self, backend: &dyn DocumentBackend) -> Result<usize> {
        match backend.list_documents().await {
            Ok(documents) => {
                let count = documents.len();
                self.documents = Arc::from(documents);
                debug!(document_count = count, "Catalog refreshed");
                self.events.emit(SessionEvent::CatalogRefreshed {
                    document_count: count,
                    ok: true,
                });
                Ok(count)
            }
            Err(e) => {
                self.documents = Arc::from(Vec::new());
                warn!(error = %e, "Catalog refresh failed, catalog cleared");
                self.events.emit(SessionEvent::CatalogRefreshed {
                    document_count: 0,
                    ok: false,
                });
                Err(e)
            }
        }
    }

    pub fn lookup(&self, id: &str) -> Result<&Document> {
        self.documents
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(format!("document {id}")))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.iter().any(|d| d.id == id)
    }

    /// Shared handle to the current snapshot.
    pub fn documents(&self) -> Arc<[Document]> {
        Arc::clone(&self.documents)
    }

    /// The first `n` documents in backend order.
    pub fn recent(&self, n: usize) -> &[Document] {
        &self.documents[..n.min(self.documents.len())]
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
