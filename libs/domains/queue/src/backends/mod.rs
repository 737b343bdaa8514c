//! Queue backends behind [`QueuePort`](crate::port::QueuePort).

pub mod backoff;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

use chrono::{DateTime, TimeDelta, Utc};
use core_config::queue::Backend;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{QueueError, QueueResult};
use crate::models::Task;
use crate::port::QueuePort;

pub use backoff::RetryPolicy;
pub use memory::MemoryQueue;

/// Build the configured backend for `queues`.
pub async fn connect(backend: &Backend, queues: &[String]) -> QueueResult<Arc<dyn QueuePort>> {
    match backend {
        Backend::Memory => {
            tracing::info!(queues = ?queues, "using in-memory queue backend");
            Ok(Arc::new(MemoryQueue::new(queues.iter().cloned())))
        }
        #[cfg(feature = "redis")]
        Backend::Redis { url } => {
            let queue = redis::RedisQueue::connect(url, queues.iter().cloned()).await?;
            Ok(Arc::new(queue))
        }
        #[cfg(not(feature = "redis"))]
        Backend::Redis { .. } => Err(QueueError::Unsupported(
            "redis backend requested but this build lacks the `redis` feature".to_string(),
        )),
    }
}

pub(crate) fn offset(instant: DateTime<Utc>, delay: Duration) -> QueueResult<DateTime<Utc>> {
    TimeDelta::from_std(delay)
        .ok()
        .and_then(|delta| instant.checked_add_signed(delta))
        .ok_or_else(|| QueueError::InvalidTask(format!("delay {:?} is out of range", delay)))
}

/// Assign an id and work out when a new task first becomes eligible.
///
/// A non-zero `delay` wins over `run_at` and is written back as `run_at`.
pub(crate) fn prepare_publish(task: &mut Task, now: DateTime<Utc>) -> QueueResult<DateTime<Utc>> {
    task.id = Uuid::new_v4().to_string();

    if !task.delay.is_zero() {
        let eligible_at = offset(now, task.delay)?;
        task.run_at = Some(eligible_at.fixed_offset());
        return Ok(eligible_at);
    }

    Ok(task
        .run_at
        .map(|run_at| run_at.with_timezone(&Utc))
        .unwrap_or(now))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_publish_assigns_fresh_id() {
        let mut task = Task::new("x");
        task.id = "caller-chosen".to_string();

        let now = Utc::now();
        assert_eq!(prepare_publish(&mut task, now).unwrap(), now);
        assert_ne!(task.id, "caller-chosen");
        assert!(Uuid::parse_str(&task.id).is_ok());
        assert_eq!(task.run_at, None);
    }

    #[test]
    fn test_delay_sets_run_at() {
        let now = Utc::now();
        let mut task = Task::new("x").with_delay(Duration::from_secs(10));

        let eligible_at = prepare_publish(&mut task, now).unwrap();

        assert_eq!(eligible_at, now + TimeDelta::seconds(10));
        assert_eq!(task.run_at, Some(eligible_at.fixed_offset()));
    }

    #[test]
    fn test_run_at_is_kept_verbatim() {
        let run_at = DateTime::parse_from_rfc3339("2040-01-02T03:04:05+09:00").unwrap();
        let mut task = Task::new("x").with_run_at(run_at);

        let eligible_at = prepare_publish(&mut task, Utc::now()).unwrap();

        assert_eq!(eligible_at, run_at.with_timezone(&Utc));
        assert_eq!(task.run_at, Some(run_at));
    }

    #[test]
    fn test_huge_delay_is_rejected() {
        let mut task = Task::new("x").with_delay(Duration::from_secs(u64::MAX));
        assert!(matches!(
            prepare_publish(&mut task, Utc::now()),
            Err(QueueError::InvalidTask(_))
        ));
    }

    #[cfg(not(feature = "redis"))]
    #[tokio::test]
    async fn test_connect_redis_without_feature_is_unsupported() {
        let backend = Backend::Redis {
            url: "redis://127.0.0.1:6379".to_string(),
        };
        assert!(matches!(
            connect(&backend, &["q".to_string()]).await,
            Err(QueueError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let queue = connect(&Backend::Memory, &["q".to_string()]).await.unwrap();
        let task = queue.publish("q", Task::new("x")).await.unwrap();
        assert!(task.is_published());
    }
}
