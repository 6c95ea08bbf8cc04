// Vector index module
// LanceDB-backed storage and nearest-neighbor search over passage vectors

pub mod vector_store;

use crate::embeddings::chunking::Passage;

pub use vector_store::{SearchResult, VectorStore};

/// One entry of the persisted index: a passage paired with its embedding.
#[derive(Debug, Clone)]
pub struct PassageRecord {
    /// Unique identifier for this entry.
    pub id: String,
    /// The passage's embedding vector.
    pub vector: Vec<f32>,
    /// The passage text and metadata stored alongside the vector.
    pub passage: Passage,
    /// Timestamp when this entry was created, RFC 3339.
    pub created_at: String,
}
