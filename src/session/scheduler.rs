//! Delayed session tasks
//!
//! Each scheduled task sleeps, then posts one event back to the controller.
//! Tasks are keyed by purpose; scheduling under a live key aborts the older
//! task. Everything still pending is aborted on `cancel_all` or drop.

use super::SessionEvent;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    NotificationExpiry,
    ProgressRemoval(String),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: HashMap<TaskKey, JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Post `event` on `tx` after `delay`, replacing any task under `key`
    pub fn schedule(
        &mut self,
        key: TaskKey,
        delay: Duration,
        tx: UnboundedSender<SessionEvent>,
        event: SessionEvent,
    ) {
        // Deadline is fixed now, not when the task is first polled
        let deadline = Instant::now() + delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(event);
        });
        if let Some(previous) = self.tasks.insert(key, handle) {
            previous.abort();
        }
    }

    /// Forget a task whose event has been delivered
    pub fn finished(&mut self, key: &TaskKey) {
        self.tasks.remove(key);
    }

    pub fn pending(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            debug!(count = self.tasks.len(), "Cancelling scheduled tasks");
        }
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
