use std::path::Path;
use std::sync::Arc;

use console::style;
use tracing::info;

use crate::Result;
use crate::config::Config;
use crate::embeddings::openai::OpenAiClient;
use crate::embeddings::{CompletionProvider, EmbeddingProvider};
use crate::indexer::CorpusIndexer;
use crate::query::QueryEngine;
use crate::server;
use crate::store::VectorStore;

/// Build the blog corpus into the vector store file
#[inline]
pub async fn run_index(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let client = Arc::new(OpenAiClient::new(&config.openai)?);

    let indexer = CorpusIndexer::new(config.clone(), client as Arc<dyn EmbeddingProvider>);
    let stats = indexer.build_store().await?;

    println!("{}", style("Indexing complete").green().bold());
    println!("  Documents processed: {}", stats.documents_processed);
    println!("  Chunks created: {}", stats.chunks_created);
    println!("  Embeddings generated: {}", stats.embeddings_generated);
    if stats.failed_batches > 0 {
        println!(
            "  {}",
            style(format!(
                "Failed batches: {} (their chunks were left out of the store)",
                stats.failed_batches
            ))
            .yellow()
        );
    }
    println!("  Store written to: {}", config.store_path().display());

    Ok(())
}

/// Answer a single question on the command line
#[inline]
pub async fn run_ask(config_path: Option<&Path>, query: &str) -> Result<()> {
    let config = Config::load(config_path)?;
    let engine = build_engine(&config)?;

    let answer = engine.answer(query).await?;

    println!("{}", answer.answer);
    if !answer.sources.is_empty() {
        println!();
        println!("{}", style("Quellen:").bold());
        for source in &answer.sources {
            println!("  - {} ({})", source.title, source.slug);
        }
    }

    Ok(())
}

/// Start the HTTP server
#[inline]
pub async fn run_serve(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let engine = build_engine(&config)?;

    info!("Starting {} server", config.bot.name);
    server::serve(&config.server, engine).await
}

/// Print the state of the on-disk vector store
#[inline]
pub async fn run_status(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path)?;
    let store = VectorStore::new(config.store_path());

    match store.load().await {
        Ok(loaded) => {
            println!("{}", style("Vector store").bold());
            println!("  Path: {}", store.path().display());
            println!("  Records: {}", loaded.records.len());
            println!("  Model: {}", loaded.model);
            println!("  Dimensions: {}", loaded.dimensions);
            println!("  Generated: {}", loaded.generated_at);
        }
        Err(e) => {
            println!("{}", style("Vector store unavailable").red().bold());
            println!("  {}", e);
            println!("  Run `kokobot index` to build it.");
        }
    }

    Ok(())
}

/// Wire up the query engine from configuration.
///
/// The live query path gets a single request attempt per API call; a user
/// waiting on an answer should see the failure, not a silent retry loop.
fn build_engine(config: &Config) -> Result<QueryEngine> {
    let client = Arc::new(OpenAiClient::new(&config.openai)?.with_retry_attempts(1));
    let store = Arc::new(VectorStore::new(config.store_path()));

    Ok(QueryEngine::new(
        store,
        Arc::clone(&client) as Arc<dyn EmbeddingProvider>,
        client as Arc<dyn CompletionProvider>,
        &config.retrieval,
        config.bot.clone(),
    ))
}
