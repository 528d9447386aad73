use std::future::Future;
use std::sync::Arc;

use hanron_persist::{Message, MessageRole, PersistError, ThreadStore, ThreadSummary};
use tracing::{debug, error, info, warn};

use crate::config::{DebateConfig, ThreadMode};
use crate::error::{DebateError, Result};
use crate::gateway::{CompletionError, CompletionGateway};
use crate::identity::Identity;
use crate::prompt::PromptAssembler;
use crate::state::{SessionState, ThreadContext};
use crate::topic::TopicBinder;

/// Result of a successful submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantTurn {
    /// `None` for guest threads
    pub thread_id: Option<String>,
    /// Sequence of the user message this turn answers
    pub user_sequence: u64,
    /// Sequence of the stored assistant reply
    pub sequence: u64,
    pub content: String,
}

/// Drives the debate turn lifecycle for one caller-owned [`SessionState`]
///
/// The session itself holds only shared collaborators, so a single instance
/// can serve any number of states.
pub struct ConversationSession {
    store: Arc<dyn ThreadStore>,
    gateway: Arc<dyn CompletionGateway>,
    assembler: PromptAssembler,
    config: DebateConfig,
}

/// Drop a trailing user message without a reply when it matches `text`.
/// Returns the reused sequence if one was found.
fn take_dangling(history: &mut Vec<Message>, text: &str) -> Option<u64> {
    match history.last() {
        Some(last) if last.role == MessageRole::User && last.content == text => {
            let sequence = last.sequence;
            history.pop();
            Some(sequence)
        }
        _ => None,
    }
}

fn replayable(messages: impl IntoIterator<Item = Message>) -> Vec<Message> {
    messages
        .into_iter()
        .filter(|m| m.role != MessageRole::System)
        .collect()
}

impl ConversationSession {
    pub fn new(
        store: Arc<dyn ThreadStore>,
        gateway: Arc<dyn CompletionGateway>,
        config: DebateConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            assembler: PromptAssembler::default(),
            config,
        }
    }

    /// Use a custom system instruction template
    pub fn with_binder(mut self, binder: TopicBinder) -> Self {
        self.assembler = PromptAssembler::new(binder);
        self
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    pub fn binder(&self) -> &TopicBinder {
        self.assembler.binder()
    }

    /// Submit one user message and return the assistant's reply
    ///
    /// The first submission on a thread binds its topic. Guests keep their
    /// history in `state`; signed-in users go through the store.
    pub async fn submit(&self, state: &mut SessionState, text: &str) -> Result<AssistantTurn> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DebateError::Validation("message cannot be empty".to_string()));
        }

        if state.active.is_none() {
            debug!("starting draft thread");
            state.active = Some(ThreadContext::draft());
        }

        match state.owner_id() {
            None => self.submit_guest(state, text).await,
            Some(owner_id) => self.submit_persisted(state, &owner_id, text).await,
        }
    }

    async fn submit_guest(&self, state: &mut SessionState, text: &str) -> Result<AssistantTurn> {
        let mut thread = state.active.clone().unwrap_or_default();
        if !thread.is_bound() {
            self.assembler.binder().bind(&mut thread, text)?;
        }
        state.active = Some(thread.clone());

        let mut history = state.guest.messages().to_vec();
        let reused = take_dangling(&mut history, text);
        let prompt = self.assembler.build(&thread, &history, text)?;

        let user_sequence = match reused {
            Some(sequence) => {
                debug!(sequence, "retrying dangling guest message");
                sequence
            }
            None => state.guest.push(MessageRole::User, text),
        };

        let content = self.complete(None, &prompt).await?;
        let sequence = state.guest.push(MessageRole::Assistant, &content);

        Ok(AssistantTurn {
            thread_id: None,
            user_sequence,
            sequence,
            content,
        })
    }

    async fn submit_persisted(
        &self,
        state: &mut SessionState,
        owner_id: &str,
        text: &str,
    ) -> Result<AssistantTurn> {
        // Work on a copy; the session only sees the thread once it is stored.
        let mut thread = state.active.clone().unwrap_or_default();

        let existing_id = thread.thread_id().map(str::to_string);
        let (thread_id, created) = match existing_id {
            Some(id) => {
                if !thread.is_bound() {
                    self.bind_stored(owner_id, &id, &mut thread, text).await?;
                }
                (id, false)
            }
            None => {
                if !thread.is_bound() {
                    self.assembler.binder().bind(&mut thread, text)?;
                }
                let title = thread.title().unwrap_or(text).to_string();
                let topic = thread.topic().unwrap_or(text).to_string();
                let id = self
                    .store_call(
                        "create_thread",
                        None,
                        self.store.create_thread(owner_id, &title, &topic),
                    )
                    .await?;
                info!(thread_id = %id, owner_id, "thread created");
                thread.set_thread_id(id.clone());
                (id, true)
            }
        };

        let mut history = if created {
            Vec::new()
        } else {
            self.store_call(
                "list_messages",
                Some(&thread_id),
                self.store.list_messages(owner_id, &thread_id),
            )
            .await?
        };
        let reused = take_dangling(&mut history, text);
        let prompt = self.assembler.build(&thread, &history, text)?;

        let user_sequence = match reused {
            Some(sequence) => {
                debug!(thread_id = %thread_id, sequence, "retrying dangling user message");
                sequence
            }
            None => {
                let appended = self
                    .store_call(
                        "append_message",
                        Some(&thread_id),
                        self.store
                            .append_message(owner_id, &thread_id, MessageRole::User, text),
                    )
                    .await;
                match appended {
                    Ok(sequence) => sequence,
                    Err(e) => {
                        if created {
                            self.roll_back(owner_id, &thread_id).await;
                        }
                        return Err(e);
                    }
                }
            }
        };
        state.active = Some(thread);

        let content = self.complete(Some(&thread_id), &prompt).await?;
        let sequence = self
            .store_call(
                "append_message",
                Some(&thread_id),
                self.store
                    .append_message(owner_id, &thread_id, MessageRole::Assistant, &content),
            )
            .await?;

        debug!(thread_id = %thread_id, user_sequence, sequence, "turn completed");

        Ok(AssistantTurn {
            thread_id: Some(thread_id),
            user_sequence,
            sequence,
            content,
        })
    }

    /// Bind the topic of a stored thread that has none (legacy data).
    ///
    /// If another writer bound it first, the stored topic wins and `text`
    /// becomes a regular turn.
    async fn bind_stored(
        &self,
        owner_id: &str,
        thread_id: &str,
        thread: &mut ThreadContext,
        text: &str,
    ) -> Result<()> {
        let mut candidate = thread.clone();
        let binding = self.assembler.binder().bind(&mut candidate, text)?;

        let bound = self
            .store_call(
                "bind_topic",
                Some(thread_id),
                self.store.bind_topic(owner_id, thread_id, &binding.topic),
            )
            .await?;
        if bound {
            info!(thread_id, "topic bound on existing thread");
            *thread = candidate;
            return Ok(());
        }

        let stored = self
            .store_call(
                "get_thread",
                Some(thread_id),
                self.store.get_thread(owner_id, thread_id),
            )
            .await?;
        *thread = ThreadContext::from_thread(&stored);
        if !thread.is_bound() {
            return Err(DebateError::TopicMissing);
        }
        debug!(thread_id, "topic already bound elsewhere, reloaded");
        Ok(())
    }

    /// Remove a thread whose first message never made it to the store.
    async fn roll_back(&self, owner_id: &str, thread_id: &str) {
        let outcome = self
            .store_call(
                "delete_thread",
                Some(thread_id),
                self.store.delete_thread(owner_id, thread_id),
            )
            .await;
        if let Err(e) = outcome {
            warn!(thread_id, error = %e, "failed to roll back empty thread");
        }
    }

    /// Clear the active thread's messages and topic and return to idle
    ///
    /// Persisted threads are deleted. If the store fails the thread stays
    /// active so the reset can be run again.
    pub async fn reset(&self, state: &mut SessionState) -> Result<()> {
        let owner_id = state.owner_id();
        let thread_id = state
            .active
            .as_ref()
            .and_then(|t| t.thread_id())
            .map(str::to_string);

        if let (Some(owner_id), Some(thread_id)) = (owner_id, thread_id) {
            self.store_call(
                "delete_thread",
                Some(&thread_id),
                self.store.delete_thread(&owner_id, &thread_id),
            )
            .await?;
            info!(thread_id = %thread_id, "thread reset");
        }

        state.detach();
        Ok(())
    }

    /// Make one of the user's threads active
    pub async fn switch_thread(
        &self,
        state: &mut SessionState,
        thread_id: &str,
    ) -> Result<ThreadContext> {
        let owner_id = state.owner_id().ok_or(DebateError::NotAuthenticated)?;
        let thread = self
            .store_call(
                "get_thread",
                Some(thread_id),
                self.store.get_thread(&owner_id, thread_id),
            )
            .await?;

        let context = ThreadContext::from_thread(&thread);
        state.guest.clear();
        state.active = Some(context.clone());
        info!(thread_id, "switched thread");

        Ok(context)
    }

    /// Detach the active thread without deleting anything
    pub fn new_thread(&self, state: &mut SessionState) {
        state.detach();
    }

    pub async fn list_threads(&self, state: &SessionState) -> Result<Vec<ThreadSummary>> {
        let owner_id = state.owner_id().ok_or(DebateError::NotAuthenticated)?;
        self.store_call("list_threads", None, self.store.list_threads(&owner_id))
            .await
    }

    /// Delete one of the user's threads; deleting the active one returns the
    /// session to idle.
    pub async fn delete_thread(&self, state: &mut SessionState, thread_id: &str) -> Result<()> {
        let owner_id = state.owner_id().ok_or(DebateError::NotAuthenticated)?;
        self.store_call(
            "delete_thread",
            Some(thread_id),
            self.store.delete_thread(&owner_id, thread_id),
        )
        .await?;
        info!(thread_id, "thread deleted");

        let is_active = state
            .active
            .as_ref()
            .and_then(|t| t.thread_id())
            .is_some_and(|id| id == thread_id);
        if is_active {
            state.active = None;
        }
        Ok(())
    }

    /// Messages of the active thread for replay, without system rows
    pub async fn history(&self, state: &SessionState) -> Result<Vec<Message>> {
        let Some(owner_id) = state.owner_id() else {
            return Ok(replayable(state.guest.messages().iter().cloned()));
        };
        let Some(thread_id) = state.active.as_ref().and_then(|t| t.thread_id()) else {
            return Ok(Vec::new());
        };

        let messages = self
            .store_call(
                "list_messages",
                Some(thread_id),
                self.store.list_messages(&owner_id, thread_id),
            )
            .await?;
        Ok(replayable(messages))
    }

    /// Sign `identity` in, discarding guest data
    ///
    /// In [`ThreadMode::Single`] the user's most recent thread is reattached.
    /// A store failure there leaves the user signed in with no active thread.
    pub async fn login(&self, state: &mut SessionState, identity: Identity) -> Result<()> {
        info!(user_id = %identity.user_id, "user signed in");
        state.sign_in(identity);

        if self.config.thread_mode == ThreadMode::Single {
            let threads = self.list_threads(state).await?;
            if let Some(latest) = threads.last() {
                self.switch_thread(state, &latest.id).await?;
            }
        }
        Ok(())
    }

    /// Sign out; persisted threads are untouched
    pub fn logout(&self, state: &mut SessionState) {
        if let Some(user) = state.user() {
            info!(user_id = %user.user_id, "user signed out");
        }
        state.sign_out();
    }

    async fn store_call<T, F>(
        &self,
        operation: &'static str,
        thread_id: Option<&str>,
        call: F,
    ) -> Result<T>
    where
        F: Future<Output = hanron_persist::Result<T>>,
    {
        let timeout = self.config.store_timeout;
        let outcome = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(PersistError::Unavailable(format!(
                "{} timed out after {:?}",
                operation, timeout
            ))),
        };

        outcome.map_err(|source| {
            error!(
                operation,
                thread_id = thread_id.unwrap_or("none"),
                error = %source,
                "store operation failed"
            );
            DebateError::Store {
                operation,
                thread_id: thread_id.map(str::to_string),
                source,
            }
        })
    }

    async fn complete(
        &self,
        thread_id: Option<&str>,
        prompt: &[hanron_llm::Message],
    ) -> Result<String> {
        let timeout = self.config.completion_timeout;
        let options = self.config.completion_options();
        let outcome = match tokio::time::timeout(timeout, self.gateway.complete(prompt, &options))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout(timeout)),
        };

        outcome.map_err(|source| {
            error!(
                thread_id = thread_id.unwrap_or("guest"),
                error = %source,
                "completion failed"
            );
            DebateError::Completion {
                thread_id: thread_id.map(str::to_string),
                source,
            }
        })
    }
}
