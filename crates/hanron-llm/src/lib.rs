pub mod types;
pub mod traits;
pub mod openai;
pub mod config;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, TokenUsage};
pub use openai::OpenAIClient;
pub use config::{ClientFactory, ProviderConfig, ProviderType};
pub use types::Message;
