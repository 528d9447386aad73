use config::{Config as ConfigLoader, ConfigError, Environment, File};
use hanron_debate::{DebateConfig, ThreadMode};
use hanron_llm::{ProviderConfig, ProviderType};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub session: SessionConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub mongodb: MongoDbConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderType,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Overrides the provider's default endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub thread_mode: ThreadMode,
    pub store_timeout_secs: u64,
    /// Path to a custom system instruction template
    #[serde(default)]
    pub system_template: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Mongodb,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub sweep_batch_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            database: "hanron".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Environment variable holding the API key for `provider`
pub fn api_key_var(provider: ProviderType) -> &'static str {
    match provider {
        ProviderType::HuggingFace => "HF_TOKEN",
        ProviderType::OpenAI => "OPENAI_API_KEY",
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables prefixed with HANRON_ (e.g. HANRON_LLM__MODEL)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let config = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("HANRON")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: Config = config.try_deserialize()?;
        cfg.load_secrets()?;

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?;
        config.try_deserialize()
    }

    fn load_secrets(&mut self) -> Result<(), ConfigError> {
        let key_var = api_key_var(self.llm.provider);
        self.api_key = std::env::var(key_var).map_err(|_| {
            ConfigError::Message(format!("{} environment variable is required", key_var))
        })?;

        if self.store.backend == StoreBackend::Mongodb {
            let uri = std::env::var("MONGODB_URI").map_err(|_| {
                ConfigError::Message(
                    "MONGODB_URI environment variable is required for the mongodb backend"
                        .to_string(),
                )
            })?;
            self.mongodb_uri = Some(uri);
        }
        Ok(())
    }

    pub fn provider_config(&self) -> ProviderConfig {
        let provider = match self.llm.provider {
            ProviderType::HuggingFace => ProviderConfig::huggingface(self.api_key.clone()),
            ProviderType::OpenAI => ProviderConfig::openai(self.api_key.clone()),
        };
        match &self.llm.base_url {
            Some(url) => provider.with_base_url(url.clone()),
            None => provider,
        }
    }

    pub fn debate_config(&self) -> DebateConfig {
        DebateConfig::new()
            .with_model(self.llm.model.clone())
            .with_temperature(self.llm.temperature)
            .with_max_tokens(self.llm.max_tokens)
            .with_completion_timeout(Duration::from_secs(self.llm.timeout_secs))
            .with_store_timeout(Duration::from_secs(self.session.store_timeout_secs))
            .with_thread_mode(self.session.thread_mode)
    }
}
