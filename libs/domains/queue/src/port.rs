use async_trait::async_trait;
use std::sync::OnceLock;

use crate::error::{BoxError, QueueResult};
use crate::models::Task;

/// What the queue should do with a task once its handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Remove the task for good
    Complete,
    /// Put the task back for another delivery
    Requeue,
}

/// Callback run by [`QueuePort::pop`] on the task it takes.
///
/// A handler error is treated like [`Acknowledgement::Requeue`].
pub trait TaskHandler: Send + Sync {
    fn handle(&self, task: &Task) -> Result<Acknowledgement, BoxError>;
}

/// Queue backend the gateway publishes to and pops from.
///
/// Implementations are shared by every in-flight request and must be safe
/// for concurrent use.
#[async_trait]
pub trait QueuePort: Send + Sync {
    /// Persist a task and return it with its assigned `id`.
    async fn publish(&self, queue: &str, task: Task) -> QueueResult<Task>;

    /// Take at most one eligible task and run `handler` on it.
    ///
    /// Returns without calling the handler when nothing is eligible.
    async fn pop(&self, queue: &str, handler: &dyn TaskHandler) -> QueueResult<()>;

    /// Delete every task in the queue.
    async fn purge(&self, queue: &str) -> QueueResult<()>;

    /// Delete the tasks whose body contains `matching` (case-sensitive).
    async fn purge_matching(&self, queue: &str, matching: &str) -> QueueResult<()>;
}

/// Pop handler that keeps the task and acknowledges it at once.
///
/// The task is gone from the queue whether or not the caller goes on to
/// process it.
#[derive(Debug, Default)]
pub struct YoloHandler {
    task: OnceLock<Task>,
}

impl YoloHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The popped task, or an empty one if nothing was eligible.
    pub fn into_task(self) -> Task {
        self.task.into_inner().unwrap_or_default()
    }
}

impl TaskHandler for YoloHandler {
    fn handle(&self, task: &Task) -> Result<Acknowledgement, BoxError> {
        if self.task.set(task.clone()).is_err() {
            tracing::warn!(task_id = %task.id, "yolo handler invoked more than once, keeping the first task");
        }
        Ok(Acknowledgement::Complete)
    }
}
