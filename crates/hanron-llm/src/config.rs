// Configuration layer for provider-agnostic chat client creation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::openai::{OpenAIClient, HUGGINGFACE_ROUTER_BASE, OPENAI_API_BASE};
use crate::traits::ChatClient;

/// Type of LLM provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAI,
    HuggingFace,
}

impl Default for ProviderType {
    fn default() -> Self {
        ProviderType::HuggingFace
    }
}

/// Credentials and endpoint for an OpenAI-compatible provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub api_key: String,
    /// Overrides the provider's default base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Provider-specific configuration details
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderDetails {
    OpenAI(EndpointConfig),
    HuggingFace(EndpointConfig),
}

/// Complete provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(flatten)]
    pub details: ProviderDetails,
}

impl ProviderConfig {
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::OpenAI(EndpointConfig {
                api_key: api_key.into(),
                base_url: None,
            }),
        }
    }

    /// Hugging Face inference router (OpenAI-compatible)
    pub fn huggingface(token: impl Into<String>) -> Self {
        Self {
            details: ProviderDetails::HuggingFace(EndpointConfig {
                api_key: token.into(),
                base_url: None,
            }),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        match &mut self.details {
            ProviderDetails::OpenAI(c) | ProviderDetails::HuggingFace(c) => {
                c.base_url = Some(base_url.into());
            }
        }
        self
    }

    pub fn provider_type(&self) -> ProviderType {
        match self.details {
            ProviderDetails::OpenAI(_) => ProviderType::OpenAI,
            ProviderDetails::HuggingFace(_) => ProviderType::HuggingFace,
        }
    }

    /// Effective base URL (explicit override or provider default)
    pub fn base_url(&self) -> &str {
        match &self.details {
            ProviderDetails::OpenAI(c) => c.base_url.as_deref().unwrap_or(OPENAI_API_BASE),
            ProviderDetails::HuggingFace(c) => {
                c.base_url.as_deref().unwrap_or(HUGGINGFACE_ROUTER_BASE)
            }
        }
    }

    fn api_key(&self) -> &str {
        match &self.details {
            ProviderDetails::OpenAI(c) | ProviderDetails::HuggingFace(c) => &c.api_key,
        }
    }
}

/// Factory for creating chat clients from configuration
pub struct ClientFactory;

impl ClientFactory {
    pub fn create_chat_client(config: &ProviderConfig) -> Result<Arc<dyn ChatClient>> {
        tracing::info!(
            provider = ?config.provider_type(),
            base_url = config.base_url(),
            "creating chat client"
        );
        let client = OpenAIClient::with_base_url(config.api_key(), config.base_url())?;
        Ok(Arc::new(client))
    }
}
