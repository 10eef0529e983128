use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::services::llm_provider::is_supported_provider;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub documents: DocumentConfig,
    pub embedding: EmbeddingConfig,
    pub quiz: QuizConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub default_model: String,
    #[serde(default)]
    pub hr_model: Option<String>,
    /// Model for answers drawn from the opening excerpt.
    #[serde(default)]
    pub excerpt_model: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DocumentConfig {
    /// Words per chunk.
    pub chunk_size: usize,
    pub top_k: usize,
    /// Characters of document text sent for study plans, quizzes and excerpt answers.
    pub excerpt_chars: usize,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    Fastembed,
    Hashing,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    #[serde(default)]
    pub cache_dir: Option<String>,
    pub index_cache_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuizConfig {
    pub default_count: usize,
    pub max_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let run_env = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());
        Self::load_from(&run_env, Environment::with_prefix("APP").separator("__"))
    }

    /// Layers `config/default`, `config/{run_env}` and `env` in that order.
    pub fn load_from(run_env: &str, env: Environment) -> Result<Self, ConfigError> {
        let mut config: AppConfig = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{run_env}")).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()?;

        if config.llm.api_key.as_deref().is_none_or(str::is_empty) {
            config.llm.api_key = std::env::var(provider_key_var(&config.llm.provider)).ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_supported_provider(&self.llm.provider) {
            return Err(ConfigError::Message(format!(
                "llm.provider '{}' is not supported",
                self.llm.provider
            )));
        }
        if self.documents.chunk_size == 0 {
            return Err(ConfigError::Message(
                "documents.chunk_size must be greater than zero".into(),
            ));
        }
        if self.documents.top_k == 0 {
            return Err(ConfigError::Message(
                "documents.top_k must be greater than zero".into(),
            ));
        }
        if self.quiz.max_count == 0 {
            return Err(ConfigError::Message(
                "quiz.max_count must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Model used for HR feedback, falling back to the default model.
    pub fn hr_model(&self) -> &str {
        self.model_or_default(self.llm.hr_model.as_deref())
    }

    pub fn excerpt_model(&self) -> &str {
        self.model_or_default(self.llm.excerpt_model.as_deref())
    }

    fn model_or_default<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        model
            .filter(|m| !m.is_empty())
            .unwrap_or(&self.llm.default_model)
    }
}

/// Environment variable holding the provider credential, e.g. `GROQ_API_KEY`.
pub fn provider_key_var(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_uppercase())
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            static_dir: "static".into(),
        },
        llm: LlmConfig {
            provider: "groq".into(),
            api_key: Some("test-key".into()),
            default_model: "llama-3.3-70b-versatile".into(),
            hr_model: None,
            excerpt_model: None,
        },
        documents: DocumentConfig {
            chunk_size: 500,
            top_k: 3,
            excerpt_chars: 3000,
            max_upload_bytes: 1024 * 1024,
        },
        embedding: EmbeddingConfig {
            backend: EmbeddingBackend::Hashing,
            cache_dir: None,
            index_cache_capacity: 4,
        },
        quiz: QuizConfig {
            default_count: 5,
            max_count: 20,
        },
        session: SessionConfig {
            idle_timeout_secs: 3600,
            sweep_interval_secs: 300,
        },
    }
}
