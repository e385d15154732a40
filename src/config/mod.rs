// Configuration management module
// TOML settings for the embedding server, the hosted LLM and local paths

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    API_KEY_ENV, API_KEY_PLACEHOLDER, Config, ConfigError, LlmConfig, OllamaConfig, PathsConfig,
    RetrievalConfig, ServerConfig, resolve_api_key,
};

/// Directory searched for `config.toml` when none is given on the command line
pub const DEFAULT_CONFIG_DIR: &str = "config";
