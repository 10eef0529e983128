use async_trait::async_trait;
use rig::client::completion::CompletionClientDyn;
use rig::client::{ProviderClient, ProviderValue};
use rig::completion::Prompt;
use rig::providers::{deepseek, groq, mistral, openai, openrouter, together};

use crate::config::{LlmConfig, provider_key_var};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("no API key configured for provider '{0}' (set {key})", key = provider_key_var(.0))]
    MissingApiKey(String),

    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("{0}")]
    Request(String),
}

/// One chat-completion call: a fixed system instruction plus one user prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f64,
    /// Overrides the configured default model.
    pub model: Option<String>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the text of the first choice.
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;
}

fn create_provider_boxed(provider: &str, api_key: &str) -> Result<Box<dyn ProviderClient>, LlmError> {
    let value = ProviderValue::Simple(api_key.to_string());

    let boxed: Box<dyn ProviderClient> = match provider.to_lowercase().as_str() {
        "groq" => {
            let c: groq::Client<reqwest::Client> = groq::Client::from_val(value);
            c.boxed()
        }
        "openai" => {
            let c: openai::Client<reqwest::Client> = openai::Client::from_val(value);
            c.boxed()
        }
        "openrouter" => {
            let c: openrouter::Client<reqwest::Client> = openrouter::Client::from_val(value);
            c.boxed()
        }
        "together" => {
            let c: together::Client<reqwest::Client> = together::Client::from_val(value);
            c.boxed()
        }
        "mistral" => {
            let c: mistral::Client<reqwest::Client> = mistral::Client::from_val(value);
            c.boxed()
        }
        "deepseek" => {
            let c: deepseek::Client<reqwest::Client> = deepseek::Client::from_val(value);
            c.boxed()
        }
        other => return Err(LlmError::UnsupportedProvider(other.to_string())),
    };

    Ok(boxed)
}

pub fn create_completion_client(
    provider: &str,
    api_key: &str,
) -> Result<Box<dyn CompletionClientDyn>, LlmError> {
    let boxed = create_provider_boxed(provider, api_key)?;
    boxed.as_completion().ok_or_else(|| {
        LlmError::UnsupportedProvider(format!("{provider} (no completion support)"))
    })
}

pub fn is_supported_provider(provider: &str) -> bool {
    matches!(
        provider.to_lowercase().as_str(),
        "groq" | "openai" | "openrouter" | "together" | "mistral" | "deepseek"
    )
}

/// Hosted chat completion through a rig provider client. A client is built per
/// call from the configured provider and key.
pub struct RigChatModel {
    provider: String,
    api_key: Option<String>,
    default_model: String,
}

impl RigChatModel {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            default_model: config.default_model.clone(),
        }
    }
}

#[async_trait]
impl ChatModel for RigChatModel {
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::MissingApiKey(self.provider.clone()))?;

        let completion_client = create_completion_client(&self.provider, api_key)?;
        let model_name = request.model.as_deref().unwrap_or(&self.default_model);

        tracing::debug!(
            "chat completion via {} model={model_name} temperature={}",
            self.provider,
            request.temperature
        );

        let agent = completion_client
            .agent(model_name)
            .preamble(&request.system)
            .temperature(request.temperature)
            .build();

        agent
            .prompt(request.prompt.as_str())
            .await
            .map_err(|e| LlmError::Request(e.to_string()))
    }
}
