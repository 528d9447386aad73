use async_trait::async_trait;

use crate::error::Result;

pub const DEFAULT_SWEEP_BATCH_SIZE: usize = 100;

/// Backend primitive used by [`sweep_messages`]
#[async_trait]
pub trait MessageSweeper: Send + Sync {
    /// Delete up to `limit` messages of `thread_id`.
    ///
    /// Returns how many messages the batch fetched for deletion. Messages
    /// that vanished in the meantime count as deleted.
    async fn delete_message_batch(&self, thread_id: &str, limit: usize) -> Result<usize>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: usize,
    pub rounds: usize,
}

/// Delete every message of a thread in batches of `batch_size`.
///
/// Stops after the first batch that comes back short, so an empty thread
/// costs exactly one round. Safe to re-run after an interruption.
pub async fn sweep_messages<S>(sweeper: &S, thread_id: &str, batch_size: usize) -> Result<SweepReport>
where
    S: MessageSweeper + ?Sized,
{
    let batch_size = batch_size.max(1);
    let mut report = SweepReport::default();

    loop {
        let fetched = sweeper.delete_message_batch(thread_id, batch_size).await?;
        report.rounds += 1;
        report.deleted += fetched;

        tracing::debug!(thread_id, round = report.rounds, fetched, "sweep round");

        if fetched < batch_size {
            break;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        remaining: AtomicUsize,
        calls: AtomicUsize,
    }

    impl Counter {
        fn new(n: usize) -> Self {
            Self {
                remaining: AtomicUsize::new(n),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl MessageSweeper for Counter {
        async fn delete_message_batch(&self, _thread_id: &str, limit: usize) -> Result<usize> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.remaining.load(Ordering::SeqCst);
            let take = remaining.min(limit);
            self.remaining.store(remaining - take, Ordering::SeqCst);
            Ok(take)
        }
    }

    #[tokio::test]
    async fn test_empty_thread_single_round() {
        let counter = Counter::new(0);
        let report = sweep_messages(&counter, "t", 10).await.unwrap();
        assert_eq!(report, SweepReport { deleted: 0, rounds: 1 });
    }

    #[tokio::test]
    async fn test_exact_multiple_needs_trailing_empty_round() {
        let counter = Counter::new(20);
        let report = sweep_messages(&counter, "t", 10).await.unwrap();
        assert_eq!(report, SweepReport { deleted: 20, rounds: 3 });
        assert_eq!(counter.remaining.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_partial_last_batch() {
        let counter = Counter::new(25);
        let report = sweep_messages(&counter, "t", 10).await.unwrap();
        assert_eq!(report, SweepReport { deleted: 25, rounds: 3 });
        assert_eq!(counter.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_batch_size_still_terminates() {
        let counter = Counter::new(3);
        let report = sweep_messages(&counter, "t", 0).await.unwrap();
        assert_eq!(report.deleted, 3);
        assert_eq!(report.rounds, 4);
    }
}
