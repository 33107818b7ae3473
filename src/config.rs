// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub index: IndexConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_body_mb: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub call_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_concurrent_calls: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    pub max_entries: usize,
    pub top_k: usize,
    pub min_score: f32,
    pub snippet_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub max_file_size_mb: usize,
    #[serde(default)]
    pub skip_patterns: Vec<String>,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl GenerationConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    /// Built-in defaults, then the TOML file, then `DOC_SYNTH__*` variables.
    /// An explicit path must exist; the default path is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        match path {
            Some(path) => Self::load_layered(path, true),
            None => Self::load_layered(Path::new(DEFAULT_CONFIG_PATH), false),
        }
    }

    fn load_layered(path: &Path, required: bool) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::from(path).required(required))
            .add_source(
                config::Environment::with_prefix("DOC_SYNTH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                request_timeout_secs: 120,
                max_body_mb: 16,
            },
            generation: GenerationConfig {
                api_key: None,
                base_url: "https://api.groq.com/openai/v1".to_string(),
                model: "openai/gpt-oss-120b".to_string(),
                max_tokens: 1000,
                temperature: 0.2,
                call_timeout_secs: 60,
                max_retries: 1,
                retry_delay_ms: 1000,
                max_concurrent_calls: 4,
            },
            index: IndexConfig {
                max_entries: 10_000,
                top_k: 3,
                min_score: 0.1,
                snippet_chars: 400,
            },
            pipeline: PipelineConfig {
                max_file_size_mb: 2,
                skip_patterns: vec![
                    "node_modules".to_string(),
                    "target/".to_string(),
                    "*.min.js".to_string(),
                ],
            },
        }
    }

    fn validate(&self) -> Result<()> {
        Validator::validate_port(self.server.port)?;
        Validator::validate_url(&self.generation.base_url)?;

        if self.server.request_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.generation.call_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "call_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.generation.max_retries > MAX_RETRIES_LIMIT {
            return Err(PipelineError::Config(format!(
                "max_retries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }

        if self.generation.max_concurrent_calls == 0 {
            return Err(PipelineError::Config(
                "max_concurrent_calls must be greater than 0".to_string(),
            ));
        }

        if self.index.max_entries == 0 {
            return Err(PipelineError::Config(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        if self.index.top_k == 0 {
            return Err(PipelineError::Config(
                "top_k must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.index.min_score) {
            return Err(PipelineError::Config(
                "min_score must be within [0, 1]".to_string(),
            ));
        }

        Ok(())
    }
}
