//! Deferred task scheduling.
//!
//! The lifecycle controller never sleeps inline: it hands the completion
//! step to a [`Scheduler`] and returns immediately. [`TokioScheduler`] runs
//! tasks on the tokio runtime after a real delay; [`ManualScheduler`] holds
//! them until the caller fires them, for deterministic tests.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// A deferred unit of work.
pub type Task = BoxFuture<'static, ()>;

/// Handle to a scheduled task.
///
/// Dropping the handle does not cancel the task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    token: CancellationToken,
    done: watch::Receiver<bool>,
}

impl TaskHandle {
    fn new(token: CancellationToken) -> (Self, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { token, done: rx }, tx)
    }

    /// Prevent the task from running if it has not started yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// `true` once the task body has run to completion.
    pub fn is_finished(&self) -> bool {
        *self.done.borrow()
    }

    /// Wait for the task to finish. Returns `false` if it was cancelled (or
    /// its scheduler dropped it) before running.
    pub async fn wait(mut self) -> bool {
        self.done.wait_for(|finished| *finished).await.is_ok()
    }
}

/// Runs tasks after a delay.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle;
}

// ---------------------------------------------------------------------------
// TokioScheduler
// ---------------------------------------------------------------------------

/// Spawns each task on the tokio runtime behind a `tokio::time::sleep`.
///
/// Must be used from within a runtime. [`shutdown`](Self::shutdown) cancels
/// every task that has not fired yet; tasks already running finish.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    root: CancellationToken,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel all pending tasks. Tasks scheduled afterwards are cancelled
    /// immediately.
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let token = self.root.child_token();
        let (handle, done) = TaskHandle::new(token.clone());

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Scheduled task cancelled before firing");
                }
                _ = tokio::time::sleep(delay) => {
                    task.await;
                    let _ = done.send(true);
                }
            }
        });

        handle
    }
}

// ---------------------------------------------------------------------------
// ManualScheduler
// ---------------------------------------------------------------------------

struct PendingTask {
    delay: Duration,
    token: CancellationToken,
    task: Task,
    done: watch::Sender<bool>,
}

/// Queues tasks until [`run_pending`](Self::run_pending) is called.
#[derive(Default)]
pub struct ManualScheduler {
    pending: Mutex<Vec<PendingTask>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks, including cancelled ones not yet drained.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Delays requested by the queued tasks, in scheduling order.
    pub fn delays(&self) -> Vec<Duration> {
        self.lock().iter().map(|p| p.delay).collect()
    }

    /// Run every queued task in scheduling order, skipping cancelled ones.
    /// Returns how many tasks ran.
    pub async fn run_pending(&self) -> usize {
        let queued: Vec<PendingTask> = std::mem::take(&mut *self.lock());

        let mut ran = 0;
        for pending in queued {
            if pending.token.is_cancelled() {
                continue;
            }
            pending.task.await;
            let _ = pending.done.send(true);
            ran += 1;
        }
        ran
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PendingTask>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TaskHandle {
        let token = CancellationToken::new();
        let (handle, done) = TaskHandle::new(token.clone());
        self.lock().push(PendingTask {
            delay,
            token,
            task,
            done,
        });
        handle
    }
}
