use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Message, MessageRole, Thread, ThreadSummary};

/// Persistence operations for threads and their messages
///
/// Every thread-scoped operation takes the caller's `owner_id`; a thread
/// owned by someone else yields [`PersistError::Forbidden`](crate::PersistError::Forbidden).
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Threads owned by `owner_id`, oldest first
    async fn list_threads(&self, owner_id: &str) -> Result<Vec<ThreadSummary>>;

    async fn get_thread(&self, owner_id: &str, thread_id: &str) -> Result<Thread>;

    /// Create a thread with its topic already bound; returns the thread id
    async fn create_thread(&self, owner_id: &str, title: &str, topic: &str) -> Result<String>;

    /// Set the topic of a thread stored without one
    ///
    /// Returns `false` and leaves the thread untouched when a topic is
    /// already bound.
    async fn bind_topic(&self, owner_id: &str, thread_id: &str, topic: &str) -> Result<bool>;

    /// Append a message and return its sequence number
    ///
    /// Sequence numbers are allocated atomically per thread, so concurrent
    /// appends never share or reorder a value.
    async fn append_message(
        &self,
        owner_id: &str,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<u64>;

    /// All messages of a thread ordered by sequence
    async fn list_messages(&self, owner_id: &str, thread_id: &str) -> Result<Vec<Message>>;

    /// Delete a thread and all its messages
    ///
    /// Messages are removed first in bounded batches, then the thread
    /// itself. Deleting a thread that no longer exists is a no-op.
    async fn delete_thread(&self, owner_id: &str, thread_id: &str) -> Result<()>;
}
