use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input};
use std::path::Path;

use super::{Config, OpenAiConfig};

#[inline]
pub fn run_interactive_config(config_path: Option<&Path>) -> Result<()> {
    eprintln!("{}", style("🔧 KOKOBOT Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = Config::load(config_path)?;

    eprintln!("{}", style("OpenAI Configuration").bold().yellow());
    eprintln!("Embedding and chat completion settings for indexing and answering.");
    eprintln!();

    configure_openai(&mut config.openai)?;

    eprintln!();
    eprintln!("{}", style("Retrieval").bold().yellow());
    config.retrieval.top_k = Input::new()
        .with_prompt("Chunks of context per answer (top-k)")
        .default(config.retrieval.top_k)
        .interact_text()?;

    if std::env::var("OPENAI_API_KEY").is_err() {
        eprintln!();
        eprintln!(
            "{}",
            style("⚠ OPENAI_API_KEY is not set in the environment").yellow()
        );
        eprintln!("The API key is read from the environment and never stored in the config file.");
    }

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_path.display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    openai.api_base = Input::new()
        .with_prompt("API base URL")
        .default(openai.api_base.clone())
        .interact_text()?;

    openai.embedding_model = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .interact_text()?;

    openai.embedding_dimension = Input::new()
        .with_prompt("Embedding dimensions")
        .default(openai.embedding_dimension)
        .interact_text()?;

    openai.chat_model = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .interact_text()?;

    Ok(())
}

#[inline]
pub fn show_config(config_path: Option<&Path>) -> Result<()> {
    let config = Config::load(config_path).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("OpenAI Settings:").bold().yellow());
    eprintln!("  API base: {}", style(&config.openai.api_base).cyan());
    eprintln!(
        "  Embedding model: {} ({} dims)",
        style(&config.openai.embedding_model).cyan(),
        style(config.openai.embedding_dimension).cyan()
    );
    eprintln!("  Chat model: {}", style(&config.openai.chat_model).cyan());
    eprintln!(
        "  Batch size: {} ({}ms between batches)",
        style(config.openai.batch_size).cyan(),
        style(config.openai.batch_delay_ms).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Chunking:").bold().yellow());
    eprintln!(
        "  Chunk size: {} chars, overlap {} chars",
        style(config.chunking.chunk_size).cyan(),
        style(config.chunking.overlap).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Content:").bold().yellow());
    for dir in &config.content.content_dirs {
        eprintln!("  Content dir: {}", style(dir.display()).cyan());
    }
    eprintln!(
        "  Store file: {}",
        style(config.content.store_path.display()).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval:").bold().yellow());
    eprintln!("  Top-k: {}", style(config.retrieval.top_k).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_path.display()).dim()
    );

    Ok(())
}
