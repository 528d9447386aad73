use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::gateway::CompletionOptions;

/// Default chat model, served by the Hugging Face router.
pub const DEFAULT_MODEL: &str = "meta-llama/Llama-3.1-8B-Instruct";

/// How a signed-in user's threads are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadMode {
    /// One implicit thread per user, reattached on login.
    Single,
    /// Named threads the user lists, creates and switches between.
    Multiple,
}

impl Default for ThreadMode {
    fn default() -> Self {
        ThreadMode::Multiple
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub completion_timeout: Duration,
    pub store_timeout: Duration,
    #[serde(default)]
    pub thread_mode: ThreadMode,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 200,
            completion_timeout: Duration::from_secs(30),
            store_timeout: Duration::from_secs(10),
            thread_mode: ThreadMode::default(),
        }
    }
}

impl DebateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn with_thread_mode(mut self, mode: ThreadMode) -> Self {
        self.thread_mode = mode;
        self
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
