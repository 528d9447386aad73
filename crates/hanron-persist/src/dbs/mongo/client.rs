use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use mongodb::Client;

use crate::dbs::mongo::models::MongoMessage;
use crate::dbs::mongo::repositories::{MongoMessageRepository, MongoThreadRepository};
use crate::error::{PersistError, Result};
use crate::models::{Message, MessageRole, Thread, ThreadSummary};
use crate::store::ThreadStore;
use crate::sweep::{sweep_messages, MessageSweeper, DEFAULT_SWEEP_BATCH_SIZE};

/// MongoDB-backed [`ThreadStore`] (collections `threads` and `messages`)
pub struct MongoThreadStore {
    thread_repo: MongoThreadRepository,
    message_repo: MongoMessageRepository,
    sweep_batch_size: usize,
}

fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|e| PersistError::InvalidId(format!("{}: {}", id, e)))
}

impl MongoThreadStore {
    /// Connect to MongoDB and create the store
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Unavailable(e.to_string()))?;

        let store = Self {
            thread_repo: MongoThreadRepository::new(&client, database),
            message_repo: MongoMessageRepository::new(&client, database),
            sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
        };
        store.message_repo.ensure_indexes().await?;

        tracing::info!(database, "connected to MongoDB");
        Ok(store)
    }

    pub fn with_sweep_batch_size(mut self, sweep_batch_size: usize) -> Self {
        self.sweep_batch_size = sweep_batch_size;
        self
    }

    /// Load a thread and verify its owner
    async fn owned_thread(&self, owner_id: &str, thread_id: &str) -> Result<Thread> {
        let object_id = parse_id(thread_id)?;
        let thread: Thread = self
            .thread_repo
            .get_thread(object_id)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))?
            .into();

        if thread.owner_id != owner_id {
            return Err(PersistError::Forbidden {
                thread_id: thread_id.to_string(),
                owner_id: owner_id.to_string(),
            });
        }
        Ok(thread)
    }
}

#[async_trait]
impl MessageSweeper for MongoThreadStore {
    async fn delete_message_batch(&self, thread_id: &str, limit: usize) -> Result<usize> {
        let object_id = parse_id(thread_id)?;
        self.message_repo.delete_batch(object_id, limit).await
    }
}

#[async_trait]
impl ThreadStore for MongoThreadStore {
    async fn list_threads(&self, owner_id: &str) -> Result<Vec<ThreadSummary>> {
        let threads = self.thread_repo.list_threads(owner_id).await?;
        Ok(threads
            .into_iter()
            .map(|t| ThreadSummary::from(&Thread::from(t)))
            .collect())
    }

    async fn get_thread(&self, owner_id: &str, thread_id: &str) -> Result<Thread> {
        self.owned_thread(owner_id, thread_id).await
    }

    async fn create_thread(&self, owner_id: &str, title: &str, topic: &str) -> Result<String> {
        let thread = self.thread_repo.create_thread(owner_id, title, topic).await?;
        Ok(thread.id.to_hex())
    }

    async fn bind_topic(&self, owner_id: &str, thread_id: &str, topic: &str) -> Result<bool> {
        self.owned_thread(owner_id, thread_id).await?;
        let bound = self
            .thread_repo
            .bind_topic(parse_id(thread_id)?, owner_id, topic)
            .await?;

        if bound {
            tracing::info!(thread_id, "topic bound on stored thread");
        }
        Ok(bound)
    }

    async fn append_message(
        &self,
        owner_id: &str,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<u64> {
        let object_id = parse_id(thread_id)?;

        let sequence = match self.thread_repo.allocate_sequence(object_id, owner_id).await? {
            Some(sequence) => sequence,
            None => {
                // Distinguish a foreign thread from a missing one.
                self.owned_thread(owner_id, thread_id).await?;
                return Err(PersistError::Internal(format!(
                    "sequence allocation failed for thread {}",
                    thread_id
                )));
            }
        };

        let message = MongoMessage {
            id: ObjectId::new(),
            thread_id: object_id,
            owner_id: owner_id.to_string(),
            role,
            content: content.to_string(),
            sequence,
            created_at: Utc::now(),
        };
        self.message_repo.save_message(&message).await?;

        Ok(sequence as u64)
    }

    async fn list_messages(&self, owner_id: &str, thread_id: &str) -> Result<Vec<Message>> {
        self.owned_thread(owner_id, thread_id).await?;
        let object_id = parse_id(thread_id)?;

        let messages = self.message_repo.get_messages(object_id).await?;
        Ok(messages.into_iter().map(Message::from).collect())
    }

    async fn delete_thread(&self, owner_id: &str, thread_id: &str) -> Result<()> {
        match self.owned_thread(owner_id, thread_id).await {
            Ok(_) => {}
            Err(PersistError::ThreadNotFound(_)) => {
                tracing::debug!(thread_id, "delete of missing thread ignored");
                return Ok(());
            }
            Err(e) => return Err(e),
        }

        let report = sweep_messages(self, thread_id, self.sweep_batch_size).await?;
        self.thread_repo.delete_thread(parse_id(thread_id)?, owner_id).await?;

        tracing::info!(
            thread_id,
            deleted = report.deleted,
            rounds = report.rounds,
            "thread deleted"
        );
        Ok(())
    }
}
