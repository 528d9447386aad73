pub mod config;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod prompt;
pub mod session;
pub mod state;
pub mod topic;

pub use config::{DebateConfig, ThreadMode};
pub use error::{DebateError, Result};
pub use gateway::{CompletionError, CompletionGateway, CompletionOptions, FixedGateway, LlmGateway};
pub use identity::{AuthError, Identity, IdentityProvider, LocalIdentityProvider};
pub use prompt::PromptAssembler;
pub use session::{AssistantTurn, ConversationSession};
pub use state::{GuestTranscript, SessionPhase, SessionState, ThreadContext};
pub use topic::{Binding, TopicBinder, DEFAULT_SYSTEM_INSTRUCTION_TEMPLATE, OFF_TOPIC_DEFLECTION};

pub use hanron_llm;
pub use hanron_persist;
