use hanron_persist::PersistError;
use thiserror::Error;

use crate::gateway::CompletionError;
use crate::identity::AuthError;

#[derive(Error, Debug)]
pub enum DebateError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("No user is signed in")]
    NotAuthenticated,

    #[error("Store operation {} failed (thread {}): {}", .operation, .thread_id.as_deref().unwrap_or("none"), .source)]
    Store {
        operation: &'static str,
        thread_id: Option<String>,
        #[source]
        source: PersistError,
    },

    #[error("Completion failed (thread {}): {}", .thread_id.as_deref().unwrap_or("guest"), .source)]
    Completion {
        thread_id: Option<String>,
        #[source]
        source: CompletionError,
    },

    #[error("Topic already bound: {0}")]
    AlreadyBound(String),

    #[error("Active thread has no topic")]
    TopicMissing,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DebateError {
    /// Whether resubmitting the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store { source, .. } => source.is_unavailable(),
            Self::Completion { .. } => true,
            Self::Auth(AuthError::ProviderUnavailable(_)) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, DebateError>;
