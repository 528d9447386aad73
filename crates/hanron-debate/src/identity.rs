use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Firebase-style minimum accepted by the development provider.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque owner key for threads
    pub user_id: String,
    pub email: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserExists,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

/// External identity provider (sign-in and registration)
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    /// Create the account and sign straight in
    async fn register_and_sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        self.register(email, password).await?;
        self.sign_in(email, password).await
    }
}

struct Account {
    user_id: String,
    password: String,
}

/// In-process provider for development and tests only
///
/// Passwords are kept in plaintext and accounts live only as long as the
/// process. Production deployments plug a hosted provider into
/// [`IdentityProvider`].
#[derive(Default)]
pub struct LocalIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        let accounts = self.accounts.read().await;
        match accounts.get(&email) {
            Some(account) if account.password == password => Ok(Identity {
                user_id: account.user_id.clone(),
                email,
            }),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        if !email.contains('@') || password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AuthError::InvalidCredentials);
        }

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&email) {
            return Err(AuthError::UserExists);
        }

        let user_id = uuid::Uuid::new_v4().to_string();
        accounts.insert(
            email.clone(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        tracing::info!(user_id = %user_id, "account registered");

        Ok(Identity { user_id, email })
    }
}
