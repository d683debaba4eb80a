// Embeddings module
// Content chunking and the OpenAI-compatible embedding/completion client

pub mod chunking;
pub mod openai;

pub use chunking::split_into_chunks;
pub use openai::OpenAiClient;

use crate::Result;

/// Produces fixed-dimension embedding vectors for text.
///
/// The same provider (same model and dimensionality) must be used at indexing
/// time and at query time, otherwise similarity scores are meaningless.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Synthesizes a natural-language answer from a system and user prompt
pub trait CompletionProvider: Send + Sync {
    fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}
