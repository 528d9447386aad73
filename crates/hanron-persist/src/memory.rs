use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{Message, MessageRole, Thread, ThreadSummary};
use crate::store::ThreadStore;
use crate::sweep::{sweep_messages, MessageSweeper, DEFAULT_SWEEP_BATCH_SIZE};

/// Process-local store, used for development, guest-only deployments and tests
///
/// Cloning shares the underlying data.
#[derive(Clone)]
pub struct InMemoryThreadStore {
    inner: Arc<RwLock<Inner>>,
    sweep_batch_size: usize,
}

#[derive(Default)]
struct Inner {
    threads: HashMap<String, ThreadRecord>,
    messages: HashMap<String, Vec<Message>>,
    next_ordinal: u64,
}

struct ThreadRecord {
    thread: Thread,
    ordinal: u64,
    next_sequence: u64,
}

impl Inner {
    fn owned(&self, owner_id: &str, thread_id: &str) -> Result<&ThreadRecord> {
        let record = self
            .threads
            .get(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        check_owner(&record.thread, owner_id)?;
        Ok(record)
    }
}

fn check_owner(thread: &Thread, owner_id: &str) -> Result<()> {
    if thread.owner_id != owner_id {
        return Err(PersistError::Forbidden {
            thread_id: thread.id.clone(),
            owner_id: owner_id.to_string(),
        });
    }
    Ok(())
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::with_sweep_batch_size(DEFAULT_SWEEP_BATCH_SIZE)
    }

    pub fn with_sweep_batch_size(sweep_batch_size: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            sweep_batch_size,
        }
    }

    /// Number of stored messages across all threads
    pub async fn message_count(&self) -> usize {
        self.inner.read().await.messages.values().map(Vec::len).sum()
    }
}

impl Default for InMemoryThreadStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSweeper for InMemoryThreadStore {
    async fn delete_message_batch(&self, thread_id: &str, limit: usize) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let Some(messages) = inner.messages.get_mut(thread_id) else {
            return Ok(0);
        };
        let take = messages.len().min(limit);
        messages.drain(..take);
        if messages.is_empty() {
            inner.messages.remove(thread_id);
        }
        Ok(take)
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn list_threads(&self, owner_id: &str) -> Result<Vec<ThreadSummary>> {
        let inner = self.inner.read().await;
        let mut records: Vec<&ThreadRecord> = inner
            .threads
            .values()
            .filter(|r| r.thread.owner_id == owner_id)
            .collect();
        records.sort_by_key(|r| r.ordinal);
        Ok(records.into_iter().map(|r| ThreadSummary::from(&r.thread)).collect())
    }

    async fn get_thread(&self, owner_id: &str, thread_id: &str) -> Result<Thread> {
        let inner = self.inner.read().await;
        Ok(inner.owned(owner_id, thread_id)?.thread.clone())
    }

    async fn create_thread(&self, owner_id: &str, title: &str, topic: &str) -> Result<String> {
        let now = Utc::now();
        let thread = Thread {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            topic: Some(topic.to_string()),
            created_at: now,
            updated_at: now,
        };
        let thread_id = thread.id.clone();

        let mut inner = self.inner.write().await;
        let ordinal = inner.next_ordinal;
        inner.next_ordinal += 1;
        inner.threads.insert(
            thread_id.clone(),
            ThreadRecord {
                thread,
                ordinal,
                next_sequence: 1,
            },
        );

        tracing::debug!(thread_id = %thread_id, owner_id, "thread created");
        Ok(thread_id)
    }

    async fn bind_topic(&self, owner_id: &str, thread_id: &str, topic: &str) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let record = inner
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        check_owner(&record.thread, owner_id)?;

        if record.thread.topic.is_some() {
            return Ok(false);
        }
        record.thread.topic = Some(topic.to_string());
        record.thread.updated_at = Utc::now();
        Ok(true)
    }

    async fn append_message(
        &self,
        owner_id: &str,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let record = inner
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?;
        check_owner(&record.thread, owner_id)?;

        let sequence = record.next_sequence;
        record.next_sequence += 1;
        record.thread.updated_at = Utc::now();

        inner
            .messages
            .entry(thread_id.to_string())
            .or_default()
            .push(Message::new(thread_id, role, content, sequence));

        Ok(sequence)
    }

    async fn list_messages(&self, owner_id: &str, thread_id: &str) -> Result<Vec<Message>> {
        let inner = self.inner.read().await;
        inner.owned(owner_id, thread_id)?;

        let mut messages = inner.messages.get(thread_id).cloned().unwrap_or_default();
        messages.sort_by_key(|m| m.sequence);
        Ok(messages)
    }

    async fn delete_thread(&self, owner_id: &str, thread_id: &str) -> Result<()> {
        {
            let inner = self.inner.read().await;
            match inner.threads.get(thread_id) {
                None => {
                    tracing::debug!(thread_id, "delete of missing thread ignored");
                    return Ok(());
                }
                Some(record) => check_owner(&record.thread, owner_id)?,
            }
        }

        let report = sweep_messages(self, thread_id, self.sweep_batch_size).await?;

        // Appends that slipped in after the sweep go with the thread.
        let mut inner = self.inner.write().await;
        inner.threads.remove(thread_id);
        inner.messages.remove(thread_id);
        drop(inner);

        tracing::info!(
            thread_id,
            deleted = report.deleted,
            rounds = report.rounds,
            "thread deleted"
        );
        Ok(())
    }
}
