// Retriever module
// Thin composition: embed the question, then ask the index for neighbors

use std::sync::Arc;
use tracing::debug;

use crate::Result;
use crate::embeddings::chunking::Passage;
use crate::embeddings::watsonx::WatsonxEmbedder;
use crate::index::VectorStore;

/// Retrieves the passages most similar to a question.
///
/// No re-ranking, deduplication, or relevance filtering happens here; the
/// index's nearest-first ordering is returned as-is.
pub struct Retriever {
    embedder: Arc<WatsonxEmbedder>,
    store: Arc<VectorStore>,
    top_k: usize,
}

impl Retriever {
    #[inline]
    pub fn new(embedder: Arc<WatsonxEmbedder>, store: Arc<VectorStore>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    /// Embed the query text and return the `top_k` nearest passages.
    #[inline]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<Passage>> {
        let query_vector = self.embedder.embed(query)?;
        let hits = self.store.search(&query_vector, self.top_k).await?;

        debug!("Retrieved {} passages for query", hits.len());
        Ok(hits.into_iter().map(|hit| hit.passage).collect())
    }
}
