// Configuration management module
// TOML settings plus credentials pulled from the process environment

pub mod settings;

pub use settings::{
    Config, ConfigError, Credentials, RetrievalConfig, ServerConfig, WatsonxConfig, ENV_API_KEY,
    ENV_PROJECT_ID,
};
