// Indexer module
// Offline pipeline that turns the blog corpus into the vector store file


use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::Config;
use crate::content::discover_documents;
use crate::embeddings::EmbeddingProvider;
use crate::embeddings::chunking::split_into_chunks;
use crate::store::{ChunkRecord, StoreFile};

/// A chunk waiting for its embedding
struct PendingChunk {
    text: String,
    title: String,
    slug: String,
    chunk_index: usize,
}

/// Statistics about a completed indexing run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexingStats {
    pub documents_processed: usize,
    pub chunks_created: usize,
    pub embeddings_generated: usize,
    pub failed_batches: usize,
}

/// Offline indexer that embeds the blog corpus and writes the store file
pub struct CorpusIndexer {
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl CorpusIndexer {
    #[inline]
    pub fn new(config: Config, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { config, embedder }
    }

    /// Run the full pipeline: discover, chunk, embed in batches, write the
    /// store file atomically.
    ///
    /// A failed embedding batch is logged and its chunks are left out of the
    /// store; the run keeps going so one transient API error does not throw
    /// away the rest of the corpus.
    #[inline]
    pub async fn build_store(&self) -> Result<IndexingStats> {
        let documents = discover_documents(&self.config.content.content_dirs)?;
        info!("Discovered {} published documents", documents.len());

        let mut stats = IndexingStats {
            documents_processed: documents.len(),
            ..IndexingStats::default()
        };

        let mut pending = Vec::new();
        for document in &documents {
            let chunks = split_into_chunks(&document.body, &self.config.chunking);
            debug!("Split '{}' into {} chunks", document.slug, chunks.len());
            for (chunk_index, text) in chunks.into_iter().enumerate() {
                pending.push(PendingChunk {
                    text,
                    title: document.title.clone(),
                    slug: document.slug.clone(),
                    chunk_index,
                });
            }
        }
        stats.chunks_created = pending.len();

        let records = self.embed_pending(pending, &mut stats).await;
        stats.embeddings_generated = records.len();

        let store = StoreFile::new(
            self.config.openai.embedding_model.clone(),
            self.config.openai.embedding_dimension,
            records,
        );
        self.write_store_file(&store).await?;

        info!(
            "Indexed {} chunks from {} documents ({} failed batches)",
            stats.embeddings_generated, stats.documents_processed, stats.failed_batches
        );
        Ok(stats)
    }

    async fn embed_pending(
        &self,
        pending: Vec<PendingChunk>,
        stats: &mut IndexingStats,
    ) -> Vec<ChunkRecord> {
        let batch_size = self.config.openai.batch_size;
        let batch_delay = Duration::from_millis(self.config.openai.batch_delay_ms);

        let progress = ProgressBar::new(pending.len() as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{bar:40} {pos}/{len} chunks embedded {msg}")
        {
            progress.set_style(style);
        }

        let mut records = Vec::with_capacity(pending.len());
        let batches: Vec<&[PendingChunk]> = pending.chunks(batch_size).collect();
        let batch_count = batches.len();

        for (batch_number, batch) in batches.into_iter().enumerate() {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();

            match self.embedder.embed_batch(&texts) {
                Ok(embeddings) => {
                    for (chunk, embedding) in batch.iter().zip(embeddings) {
                        records.push(ChunkRecord {
                            text: chunk.text.clone(),
                            title: chunk.title.clone(),
                            slug: chunk.slug.clone(),
                            chunk_index: chunk.chunk_index,
                            embedding,
                        });
                    }
                }
                Err(e) => {
                    warn!(
                        "Embedding batch {}/{} failed, excluding {} chunks: {}",
                        batch_number + 1,
                        batch_count,
                        batch.len(),
                        e
                    );
                    stats.failed_batches += 1;
                }
            }

            progress.inc(batch.len() as u64);

            // Rate limiting between batches, skipped after the last one
            if batch_number + 1 < batch_count {
                sleep(batch_delay).await;
            }
        }

        progress.finish_and_clear();
        records
    }

    /// Write the store as JSON via a temp file and rename so readers never
    /// observe a half-written store
    async fn write_store_file(&self, store: &StoreFile) -> Result<()> {
        let path = self.config.store_path();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let json = serde_json::to_string(store).context("Failed to serialize vector store")?;
        let tmp_path = tmp_sibling(&path);
        fs::write(&tmp_path, &json)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path)
            .await
            .with_context(|| format!("Failed to move store into place at {}", path.display()))?;

        info!("Wrote vector store to {}", path.display());
        Ok(())
    }
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let mut name = path.file_name().map_or_else(
        || std::ffi::OsString::from("store"),
        std::ffi::OsStr::to_os_string,
    );
    name.push(".tmp");
    path.with_file_name(name)
}
