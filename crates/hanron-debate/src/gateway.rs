use async_trait::async_trait;
use hanron_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Generation options sent with every completion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 200,
        }
    }
}

#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Completion provider error: {0}")]
    Provider(String),

    #[error("Completion returned no content")]
    EmptyResponse,
}

/// One call-and-response cycle with a language model
///
/// Messages are borrowed, so an implementation cannot alter the caller's
/// prompt.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError>;
}

/// Gateway backed by a [`ChatClient`] and a fixed model id
pub struct LlmGateway {
    client: Arc<dyn ChatClient>,
    model: String,
}

impl LlmGateway {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionGateway for LlmGateway {
    async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let request = ChatRequest::new(self.model.clone(), messages.to_vec()).with_options(
            ChatOptions::new()
                .temperature(options.temperature)
                .max_tokens(options.max_tokens),
        );

        let response = self
            .client
            .chat(request)
            .await
            .map_err(|e| CompletionError::Provider(format!("{:#}", e)))?;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                model = %self.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "completion usage"
            );
        }

        response
            .content
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// Deterministic gateway: always answers with the same text and records
/// every prompt it receives.
pub struct FixedGateway {
    reply: String,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl FixedGateway {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far, oldest first
    pub async fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().await.clone()
    }

    pub async fn last_call(&self) -> Option<Vec<Message>> {
        self.calls.lock().await.last().cloned()
    }
}

#[async_trait]
impl CompletionGateway for FixedGateway {
    async fn complete(
        &self,
        messages: &[Message],
        _options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        self.calls.lock().await.push(messages.to_vec());
        Ok(self.reply.clone())
    }
}
