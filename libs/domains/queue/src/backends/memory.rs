//! In-memory queue backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{RetryPolicy, offset, prepare_publish};
use crate::error::{QueueError, QueueResult};
use crate::models::Task;
use crate::port::{Acknowledgement, QueuePort, TaskHandler};

#[derive(Debug)]
struct Entry {
    task: Task,
    eligible_at: DateTime<Utc>,
}

/// Process-local queues, one publish-ordered list per configured name.
///
/// Nothing survives a restart.
#[derive(Debug)]
pub struct MemoryQueue {
    queues: Mutex<HashMap<String, Vec<Entry>>>,
    retry_policy: RetryPolicy,
}

impl MemoryQueue {
    pub fn new(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::with_retry_policy(names, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        names: impl IntoIterator<Item = impl Into<String>>,
        retry_policy: RetryPolicy,
    ) -> Self {
        let queues = names
            .into_iter()
            .map(|name| (name.into(), Vec::new()))
            .collect();
        Self {
            queues: Mutex::new(queues),
            retry_policy,
        }
    }

    /// Number of tasks held for `queue`, eligible or not.
    pub async fn len(&self, queue: &str) -> QueueResult<usize> {
        let queues = self.queues.lock().await;
        queues
            .get(queue)
            .map(Vec::len)
            .ok_or_else(|| QueueError::UnknownQueue(queue.to_string()))
    }

    async fn with_queue<T>(
        &self,
        queue: &str,
        f: impl FnOnce(&mut Vec<Entry>) -> QueueResult<T>,
    ) -> QueueResult<T> {
        let mut queues = self.queues.lock().await;
        let entries = queues
            .get_mut(queue)
            .ok_or_else(|| QueueError::UnknownQueue(queue.to_string()))?;
        f(entries)
    }
}

#[async_trait]
impl QueuePort for MemoryQueue {
    async fn publish(&self, queue: &str, mut task: Task) -> QueueResult<Task> {
        self.with_queue(queue, |entries| {
            let eligible_at = prepare_publish(&mut task, Utc::now())?;
            entries.push(Entry {
                task: task.clone(),
                eligible_at,
            });
            tracing::debug!(queue, task_id = %task.id, %eligible_at, "task published");
            Ok(task)
        })
        .await
    }

    async fn pop(&self, queue: &str, handler: &dyn TaskHandler) -> QueueResult<()> {
        self.with_queue(queue, |entries| {
            let now = Utc::now();
            let Some(index) = entries.iter().position(|entry| entry.eligible_at <= now) else {
                return Ok(());
            };

            let mut entry = entries.remove(index);
            entry.task.attempts = entry.task.attempts.saturating_add(1);

            let ack = handler.handle(&entry.task).unwrap_or_else(|err| {
                tracing::warn!(queue, task_id = %entry.task.id, error = %err, "task handler failed, requeueing");
                Acknowledgement::Requeue
            });

            if ack == Acknowledgement::Requeue {
                let requeue_at = offset(now, self.retry_policy.delay_for(&entry.task));
                if let Ok(eligible_at) = requeue_at {
                    entry.eligible_at = eligible_at;
                }
                tracing::debug!(queue, task_id = %entry.task.id, eligible_at = %entry.eligible_at, "task requeued");
                entries.insert(index, entry);
                requeue_at?;
            }

            Ok(())
        })
        .await
    }

    async fn purge(&self, queue: &str) -> QueueResult<()> {
        self.with_queue(queue, |entries| {
            tracing::debug!(queue, purged = entries.len(), "queue purged");
            entries.clear();
            Ok(())
        })
        .await
    }

    async fn purge_matching(&self, queue: &str, matching: &str) -> QueueResult<()> {
        self.with_queue(queue, |entries| {
            let before = entries.len();
            entries.retain(|entry| !entry.task.body.contains(matching));
            tracing::debug!(queue, matching, purged = before - entries.len(), "queue purged by match");
            Ok(())
        })
        .await
    }
}
