// Configuration management module
// TOML configuration for the indexer, retrieval engine, and HTTP server

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    BotConfig, ChunkingConfig, Config, ConfigError, ContentConfig, OpenAiConfig, RetrievalConfig,
    ServerConfig,
};
