//! Redis queue backend.
//!
//! Each queue is a sorted set `kewpie:<queue>` whose members are task JSON
//! documents scored by their eligibility instant in epoch milliseconds.

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client, Script};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;

use super::{RetryPolicy, offset, prepare_publish};
use crate::error::{QueueError, QueueResult};
use crate::models::Task;
use crate::port::{Acknowledgement, QueuePort, TaskHandler};

const KEY_PREFIX: &str = "kewpie:";

/// Removes and returns the first member with a score at or below `ARGV[1]`.
const TAKE_ELIGIBLE: &str = r#"
local members = redis.call('ZRANGEBYSCORE', KEYS[1], '-inf', ARGV[1], 'LIMIT', 0, 1)
if #members == 0 then
  return false
end
redis.call('ZREM', KEYS[1], members[1])
return members[1]
"#;

/// Removes members whose `body` contains `ARGV[1]` as a plain substring.
const PURGE_MATCHING: &str = r#"
local removed = 0
for _, member in ipairs(redis.call('ZRANGE', KEYS[1], 0, -1)) do
  local ok, task = pcall(cjson.decode, member)
  if ok and type(task.body) == 'string' and string.find(task.body, ARGV[1], 1, true) then
    removed = removed + redis.call('ZREM', KEYS[1], member)
  end
end
return removed
"#;

fn key(queue: &str) -> String {
    format!("{KEY_PREFIX}{queue}")
}

/// Connect to Redis and verify the connection with `PING`.
pub async fn connect_manager(url: &str) -> ::redis::RedisResult<ConnectionManager> {
    tracing::info!("Attempting to connect to Redis at {}", url);

    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;

    let mut conn = manager.clone();
    let _: String = ::redis::cmd("PING").query_async(&mut conn).await?;

    tracing::info!("Successfully connected to Redis");
    Ok(manager)
}

#[derive(Clone)]
pub struct RedisQueue {
    manager: ConnectionManager,
    queues: BTreeSet<String>,
    retry_policy: RetryPolicy,
}

impl RedisQueue {
    pub async fn connect(
        url: &str,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> QueueResult<Self> {
        let manager = connect_manager(url).await?;
        Ok(Self::from_manager(manager, names))
    }

    pub fn from_manager(
        manager: ConnectionManager,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            manager,
            queues: names.into_iter().map(Into::into).collect(),
            retry_policy: RetryPolicy::default(),
        }
    }

    fn key_for(&self, queue: &str) -> QueueResult<String> {
        if self.queues.contains(queue) {
            Ok(key(queue))
        } else {
            Err(QueueError::UnknownQueue(queue.to_string()))
        }
    }

    async fn schedule(&self, key: &str, task: &Task, score: i64) -> QueueResult<()> {
        let member = serde_json::to_string(task)?;
        let mut conn = self.manager.clone();
        let _: i64 = conn.zadd(key, member, score).await?;
        Ok(())
    }
}

#[async_trait]
impl QueuePort for RedisQueue {
    async fn publish(&self, queue: &str, mut task: Task) -> QueueResult<Task> {
        let key = self.key_for(queue)?;
        let eligible_at = prepare_publish(&mut task, Utc::now())?;
        self.schedule(&key, &task, eligible_at.timestamp_millis()).await?;
        tracing::debug!(queue, task_id = %task.id, %eligible_at, "task published");
        Ok(task)
    }

    async fn pop(&self, queue: &str, handler: &dyn TaskHandler) -> QueueResult<()> {
        let key = self.key_for(queue)?;
        let now = Utc::now();

        let mut conn = self.manager.clone();
        let member: Option<String> = Script::new(TAKE_ELIGIBLE)
            .key(key.as_str())
            .arg(now.timestamp_millis())
            .invoke_async(&mut conn)
            .await?;
        let Some(member) = member else {
            return Ok(());
        };

        let mut task: Task = serde_json::from_str(&member)?;
        task.attempts = task.attempts.saturating_add(1);

        let ack = handler.handle(&task).unwrap_or_else(|err| {
            tracing::warn!(queue, task_id = %task.id, error = %err, "task handler failed, requeueing");
            Acknowledgement::Requeue
        });

        if ack == Acknowledgement::Requeue {
            // The task is already off the set: put it back even when the
            // backoff instant is out of range.
            let requeue_at = offset(now, self.retry_policy.delay_for(&task));
            let eligible_at = requeue_at.as_ref().map_or(now, |at| *at);
            self.schedule(&key, &task, eligible_at.timestamp_millis()).await?;
            tracing::debug!(queue, task_id = %task.id, %eligible_at, "task requeued");
            requeue_at?;
        }

        Ok(())
    }

    async fn purge(&self, queue: &str) -> QueueResult<()> {
        let key = self.key_for(queue)?;
        let mut conn = self.manager.clone();
        let _: i64 = conn.del(key.as_str()).await?;
        Ok(())
    }

    async fn purge_matching(&self, queue: &str, matching: &str) -> QueueResult<()> {
        let key = self.key_for(queue)?;
        let mut conn = self.manager.clone();
        let removed: i64 = Script::new(PURGE_MATCHING)
            .key(key.as_str())
            .arg(matching)
            .invoke_async(&mut conn)
            .await?;
        tracing::debug!(queue, matching, removed, "queue purged by match");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::YoloHandler;
    use uuid::Uuid;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
    }

    async fn fresh_queue() -> (RedisQueue, String) {
        let name = format!("test-{}", Uuid::new_v4());
        let queue = RedisQueue::connect(&redis_url(), [name.clone()]).await.unwrap();
        (queue, name)
    }

    #[test]
    fn test_key_prefix() {
        assert_eq!(key("emails"), "kewpie:emails");
    }

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_publish_pop_round_trip() {
        let (queue, name) = fresh_queue().await;

        let published = queue
            .publish(&name, Task::new("hello").with_tag("k", "v"))
            .await
            .unwrap();

        let handler = YoloHandler::new();
        queue.pop(&name, &handler).await.unwrap();
        let popped = handler.into_task();

        assert_eq!(popped.id, published.id);
        assert_eq!(popped.tags, published.tags);

        let empty = YoloHandler::new();
        queue.pop(&name, &empty).await.unwrap();
        assert_eq!(empty.into_task(), Task::default());
    }

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_purge_matching() {
        let (queue, name) = fresh_queue().await;
        queue.publish(&name, Task::new("keep-abc")).await.unwrap();
        queue.publish(&name, Task::new("drop-xyz")).await.unwrap();

        queue.purge_matching(&name, "xyz").await.unwrap();

        let handler = YoloHandler::new();
        queue.pop(&name, &handler).await.unwrap();
        assert_eq!(handler.into_task().body, "keep-abc");
        queue.purge(&name).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Requires actual Redis
    async fn test_unknown_queue_is_rejected() {
        let (queue, _) = fresh_queue().await;
        assert!(matches!(
            queue.purge("not-configured").await,
            Err(QueueError::UnknownQueue(_))
        ));
    }
}
