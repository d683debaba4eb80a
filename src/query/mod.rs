// Query module
// Retrieval-augmented answering: embed the question, rank stored chunks,
// ground the chat model in the best matches


use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BotConfig, RetrievalConfig};
use crate::embeddings::{CompletionProvider, EmbeddingProvider};
use crate::store::{ChunkRecord, VectorStore, cosine_similarity};
use crate::{KokobotError, Result};

/// Canned reply when retrieval produces nothing to ground an answer in
pub const NO_INFORMATION_ANSWER: &str =
    "Leider konnte ich keine relevanten Informationen zu deiner Frage in unseren Blogposts finden.";

/// A blog post referenced by an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub title: String,
    pub slug: String,
}

/// The result of answering one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<Source>,
}

/// A chunk together with its similarity to the query
#[derive(Debug, Clone)]
pub(crate) struct ScoredChunk<'a> {
    pub record: &'a ChunkRecord,
    pub score: f32,
}

/// Answers questions about the blog using the vector store and an LLM
pub struct QueryEngine {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<dyn CompletionProvider>,
    top_k: usize,
    bot: BotConfig,
}

impl QueryEngine {
    #[inline]
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        retrieval: &RetrievalConfig,
        bot: BotConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            completer,
            top_k: retrieval.top_k,
            bot,
        }
    }

    /// Answer a user question grounded in the indexed blog corpus.
    ///
    /// Validation happens before any store or API access, so a blank query
    /// costs nothing. An empty store (or one whose chunks were all
    /// quarantined) short-circuits to a canned reply without calling the
    /// chat model.
    #[inline]
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(KokobotError::InvalidQuery(
                "Query must not be empty".to_string(),
            ));
        }

        let store = self.store.load().await?;

        if store.records.is_empty() {
            debug!("Vector store has no usable records, returning canned answer");
            return Ok(Answer {
                answer: NO_INFORMATION_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        // Provider calls are blocking HTTP; keep them off the async threads
        let embedder = Arc::clone(&self.embedder);
        let query_owned = query.to_string();
        let query_embedding = tokio::task::spawn_blocking(move || embedder.embed(&query_owned))
            .await
            .map_err(|e| anyhow::anyhow!("Embedding task failed: {e}"))??;
        if query_embedding.len() != store.dimensions {
            return Err(KokobotError::EmbeddingService(format!(
                "Query embedding has {} dimensions but the store expects {}",
                query_embedding.len(),
                store.dimensions
            )));
        }

        let ranked = rank_chunks(&store.records, &query_embedding, self.top_k)?;
        debug!(
            "Top {} chunks scored between {:.3} and {:.3}",
            ranked.len(),
            ranked.last().map_or(0.0, |c| c.score),
            ranked.first().map_or(0.0, |c| c.score)
        );

        let context = build_context(&ranked);
        let user_prompt = format!(
            "Basierend auf den folgenden Textabschnitten, beantworte bitte diese Frage direkt und knapp:\n\nFRAGE: {query}\n\n{context}"
        );

        let completer = Arc::clone(&self.completer);
        let system_prompt = self.system_prompt();
        let answer =
            tokio::task::spawn_blocking(move || completer.complete(&system_prompt, &user_prompt))
                .await
                .map_err(|e| anyhow::anyhow!("Completion task failed: {e}"))??;

        Ok(Answer {
            answer,
            sources: collect_sources(&ranked),
        })
    }

    /// Number of records resident in memory, if the one-time load happened
    #[inline]
    pub fn loaded_record_count(&self) -> Option<usize> {
        self.store.loaded().map(|store| store.records.len())
    }

    fn system_prompt(&self) -> String {
        format!(
            "Du bist {name}, ein hilfreicher Assistent für den Blog {site}. Deine Aufgabe ist es, Fragen direkt zu beantworten, indem du dich auf die bereitgestellten Textabschnitte stützt.\n\nWichtige Regeln:\n1. Antworte DIREKT auf die Frage, ohne Formulierungen wie \"Der Artikel beschreibt...\" oder \"Laut dem Text...\". Sprich als ob du selbst die Expertise hast.\n2. Antworte NUR auf Basis der bereitgestellten Textabschnitte.\n3. Wenn die Frage nicht mit den bereitgestellten Informationen beantwortet werden kann, sage höflich, dass du dazu keine Informationen hast.\n4. Erfinde KEINE Informationen.\n5. Formuliere deine Antworten in einem freundlichen, informativen Stil.\n6. Verwende Markdown für die Formatierung, wenn sinnvoll.\n7. Berücksichtige die Schweizer Tastatur bei deinen Antworten (z.B. ä, ö, ü und andere Schweizer Schreibweisen).\n\nDie Frage bezieht sich auf Inhalte des {site} Blogs, der sich mit Themen wie Tiny Houses, nachhaltigem Leben und Minimalismus beschäftigt.",
            name = self.bot.name,
            site = self.bot.site,
        )
    }
}

/// Score every record against the query embedding and keep the best `top_k`.
///
/// The sort is stable, so records that tie keep their store order.
pub(crate) fn rank_chunks<'a>(
    records: &'a [ChunkRecord],
    query_embedding: &[f32],
    top_k: usize,
) -> Result<Vec<ScoredChunk<'a>>> {
    let mut scored = Vec::with_capacity(records.len());
    for record in records {
        let score = cosine_similarity(query_embedding, &record.embedding)?;
        scored.push(ScoredChunk { record, score });
    }

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(top_k);
    Ok(scored)
}

fn build_context(ranked: &[ScoredChunk<'_>]) -> String {
    ranked
        .iter()
        .map(|chunk| {
            format!(
                "TEXTABSCHNITT [Aus Artikel: {}]:\n{}\n---",
                chunk.record.title, chunk.record.text
            )
        })
        .join("\n\n")
}

/// Sources in rank order, one entry per post even when several of its chunks
/// made the cut
fn collect_sources(ranked: &[ScoredChunk<'_>]) -> Vec<Source> {
    let mut sources = Vec::new();
    for chunk in ranked {
        if !sources
            .iter()
            .any(|source: &Source| source.slug == chunk.record.slug)
        {
            sources.push(Source {
                title: chunk.record.title.clone(),
                slug: chunk.record.slug.clone(),
            });
        }
    }
    sources
}
