// Vector store module
// Serialized chunk records and the in-memory, load-once store

#[cfg(test)]
mod tests;

pub mod similarity;
pub mod vector_store;

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub use similarity::cosine_similarity;
pub use vector_store::{LoadedStore, VectorStore};

/// Serialization format version written by the indexer and checked by the loader
pub const STORE_FORMAT_VERSION: u32 = 1;

/// The unit of retrieval: one overlapping slice of a blog post plus its
/// embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// A contiguous slice of the post body
    pub text: String,
    /// Human-readable title of the source post
    pub title: String,
    /// URL-safe identifier of the source post
    pub slug: String,
    /// Zero-based position of this chunk within its post
    #[serde(rename = "chunkIndex")]
    pub chunk_index: usize,
    /// Dense vector representation of `text`
    pub embedding: Vec<f32>,
}

/// On-disk representation of the complete vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreFile {
    pub version: u32,
    /// Embedding model the vectors were produced with
    pub model: String,
    /// Dimensionality every record's embedding must have
    pub dimensions: usize,
    pub generated_at: String,
    pub records: Vec<ChunkRecord>,
}

impl StoreFile {
    #[inline]
    pub fn new(model: String, dimensions: usize, records: Vec<ChunkRecord>) -> Self {
        Self {
            version: STORE_FORMAT_VERSION,
            model,
            dimensions,
            generated_at: Utc::now().to_rfc3339(),
            records,
        }
    }

    /// Drop records whose embedding does not match the declared dimension.
    ///
    /// Returns the surviving records and the number quarantined. A malformed
    /// record must never reach the similarity scorer.
    #[inline]
    pub fn validated_records(self) -> (Vec<ChunkRecord>, usize) {
        let expected = self.dimensions;
        let total = self.records.len();
        let records: Vec<ChunkRecord> = self
            .records
            .into_iter()
            .filter(|record| record.embedding.len() == expected)
            .collect();
        let quarantined = total - records.len();
        (records, quarantined)
    }
}
