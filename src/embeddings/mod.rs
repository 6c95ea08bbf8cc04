// Embeddings module
// Content chunking plus the hosted watsonx.ai embedding client

pub mod chunking;
pub mod watsonx;

pub use chunking::{ChunkingConfig, Passage, chunk_pages};
pub use watsonx::WatsonxEmbedder;
