#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hanron_debate::hanron_llm::Message as LlmMessage;
use hanron_debate::hanron_persist::{
    InMemoryThreadStore, Message, MessageRole, PersistError, Result as PersistResult, Thread,
    ThreadStore, ThreadSummary,
};
use hanron_debate::{
    CompletionError, CompletionGateway, CompletionOptions, ConversationSession, DebateConfig,
    FixedGateway, Identity,
};

pub const REPLY: &str = "Dogs are more loyal and easier to train.";

/// Longer than any timeout the tests configure
const STALL: Duration = Duration::from_secs(5);

/// Gateway that can be switched between answering and failing
pub struct SwitchableGateway {
    inner: FixedGateway,
    failing: AtomicBool,
    stalled: AtomicBool,
}

impl SwitchableGateway {
    pub fn new(reply: &str) -> Self {
        Self {
            inner: FixedGateway::new(reply),
            failing: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
        }
    }

    /// Hang every completion well past the configured timeout
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<Vec<LlmMessage>> {
        self.inner.calls().await
    }

    pub async fn last_call(&self) -> Vec<LlmMessage> {
        self.inner.last_call().await.unwrap_or_default()
    }
}

#[async_trait]
impl CompletionGateway for SwitchableGateway {
    async fn complete(
        &self,
        messages: &[LlmMessage],
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        if self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(CompletionError::Provider("503 model is loading".to_string()));
        }
        self.inner.complete(messages, options).await
    }
}

/// In-memory store whose appends and deletes can be made to fail
///
/// Threads passed to [`FlakyStore::forget_topic`] are reported without a
/// topic until one is bound again, like documents written before topics
/// were stored.
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: InMemoryThreadStore,
    fail_appends: Arc<AtomicBool>,
    fail_deletes: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
    topics: Arc<Mutex<HashMap<String, Option<String>>>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_appends(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, failing: bool) {
        self.fail_deletes.store(failing, Ordering::SeqCst);
    }

    /// Hang every call well past the configured timeout
    pub fn stall(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn forget_topic(&self, thread_id: &str) {
        self.topics.lock().unwrap().insert(thread_id.to_string(), None);
    }

    fn topic_override(&self, thread_id: &str) -> Option<Option<String>> {
        self.topics.lock().unwrap().get(thread_id).cloned()
    }

    async fn pause(&self) {
        if self.stalled.load(Ordering::SeqCst) {
            tokio::time::sleep(STALL).await;
        }
    }
}

fn unavailable() -> PersistError {
    PersistError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl ThreadStore for FlakyStore {
    async fn list_threads(&self, owner_id: &str) -> PersistResult<Vec<ThreadSummary>> {
        self.pause().await;
        let mut threads = self.inner.list_threads(owner_id).await?;
        for thread in &mut threads {
            if let Some(topic) = self.topic_override(&thread.id) {
                thread.topic = topic;
            }
        }
        Ok(threads)
    }

    async fn get_thread(&self, owner_id: &str, thread_id: &str) -> PersistResult<Thread> {
        self.pause().await;
        let mut thread = self.inner.get_thread(owner_id, thread_id).await?;
        if let Some(topic) = self.topic_override(thread_id) {
            thread.topic = topic;
        }
        Ok(thread)
    }

    async fn create_thread(&self, owner_id: &str, title: &str, topic: &str) -> PersistResult<String> {
        self.pause().await;
        self.inner.create_thread(owner_id, title, topic).await
    }

    async fn bind_topic(&self, owner_id: &str, thread_id: &str, topic: &str) -> PersistResult<bool> {
        self.pause().await;
        // Ownership and existence checks come from the wrapped store.
        let bound_inner = self.inner.bind_topic(owner_id, thread_id, topic).await?;
        let mut topics = self.topics.lock().unwrap();
        match topics.get(thread_id) {
            Some(None) => {
                topics.insert(thread_id.to_string(), Some(topic.to_string()));
                Ok(true)
            }
            Some(Some(_)) => Ok(false),
            None => Ok(bound_inner),
        }
    }

    async fn append_message(
        &self,
        owner_id: &str,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> PersistResult<u64> {
        self.pause().await;
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner
            .append_message(owner_id, thread_id, role, content)
            .await
    }

    async fn list_messages(&self, owner_id: &str, thread_id: &str) -> PersistResult<Vec<Message>> {
        self.pause().await;
        self.inner.list_messages(owner_id, thread_id).await
    }

    async fn delete_thread(&self, owner_id: &str, thread_id: &str) -> PersistResult<()> {
        self.pause().await;
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.delete_thread(owner_id, thread_id).await
    }
}

pub fn alice() -> Identity {
    Identity {
        user_id: "alice".to_string(),
        email: "alice@example.com".to_string(),
    }
}

pub fn bob() -> Identity {
    Identity {
        user_id: "bob".to_string(),
        email: "bob@example.com".to_string(),
    }
}

pub struct Harness {
    pub store: FlakyStore,
    pub gateway: Arc<SwitchableGateway>,
    pub session: ConversationSession,
}

pub fn harness(config: DebateConfig) -> Harness {
    let store = FlakyStore::new();
    let gateway = Arc::new(SwitchableGateway::new(REPLY));
    let session = ConversationSession::new(Arc::new(store.clone()), gateway.clone(), config);
    Harness {
        store,
        gateway,
        session,
    }
}
