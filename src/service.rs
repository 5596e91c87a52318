//! Question answering over stored documents.
//!
//! [`DocumentChat`] wires the three components together: it probes the
//! [`ResponseCache`], falls back to the [`ResilientInvoker`] on a miss, and
//! stores the fresh answer for later requests.
//!
//! The cache is keyed by the query alone, so an answer computed for one
//! document is served for the same query against any other document while
//! it is fresh. See [`crate::cache::response`] for the keying notes.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::ResponseCache;
use crate::document::DocumentStore;
use crate::invoker::ResilientInvoker;
use crate::{DocQueryError, Result};

/// Answers queries about uploaded documents.
///
/// Cheap to share behind an `Arc`; concurrent calls do not serialise on
/// each other. A lookup followed by a store is not atomic, so two
/// concurrent misses for the same query may both reach the provider.
pub struct DocumentChat {
    documents: Arc<DocumentStore>,
    cache: Arc<ResponseCache>,
    invoker: ResilientInvoker,
}

impl DocumentChat {
    pub fn new(
        documents: Arc<DocumentStore>,
        cache: Arc<ResponseCache>,
        invoker: ResilientInvoker,
    ) -> Self {
        Self {
            documents,
            cache,
            invoker,
        }
    }

    /// The document store backing this service.
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// The response cache backing this service.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Answer `query` about the document stored under `document_id`.
    pub async fn ask(&self, document_id: Uuid, query: &str) -> Result<String> {
        info!(%document_id, "received chat request");

        let Some(document) = self.documents.get(&document_id) else {
            warn!(%document_id, "document not found");
            return Err(DocQueryError::DocumentNotFound(document_id));
        };

        if query.trim().is_empty() {
            warn!(%document_id, "empty query received");
            return Err(DocQueryError::EmptyQuery);
        }

        if let Some(cached) = self.cache.lookup(query).await {
            info!(%document_id, query, "serving cached response");
            return Ok(cached);
        }

        let response = self.invoker.invoke(&document.text, query).await?;
        self.cache.store(query, response.as_str()).await;
        Ok(response)
    }
}
