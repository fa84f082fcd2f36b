use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{
    BackgroundTask, BackgroundTaskListener, ProgressMonitor, StopToken, TaskEvent, TaskId,
    TaskOutcome,
};

/// Buffer size for the task event channel
const EVENT_CHANNEL_BUFFER: usize = 256;

/// Spawns background tasks and hands out handles to them
pub struct TaskRunner {
    event_tx: broadcast::Sender<TaskEvent>,
    next_id: AtomicU64,
    root: StopToken,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner {
    /// Runner with its own event channel
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_BUFFER);
        Self {
            event_tx,
            next_id: AtomicU64::new(1),
            root: StopToken::new(),
        }
    }

    /// Request cancellation of every task spawned by this runner
    ///
    /// Tasks stop at their next checkpoint. Tasks spawned afterwards are
    /// interrupted at their first one.
    pub fn shutdown(&self) {
        info!("cancelling all background tasks");
        self.root.cancel();
    }

    /// Whether [`TaskRunner::shutdown`] was called
    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Receive progress and completion events of every task spawned from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_tx.subscribe()
    }

    /// Run `task` as its own tokio task, reporting the outcome to `listener`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        &self,
        task: Arc<dyn BackgroundTask>,
        listener: Arc<dyn BackgroundTaskListener>,
    ) -> TaskHandle {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancel = self.root.child();
        let monitor = ProgressMonitor::new(id, cancel.clone(), self.event_tx.clone());
        let event_tx = self.event_tx.clone();
        let description = task.description().to_string();
        let worker = task.clone();

        info!(task_id = id.0, task = %description, "starting background task");
        let join = tokio::spawn(async move {
            listener.on_begin();
            let outcome = worker.start(&monitor).await;

            match outcome {
                TaskOutcome::Success => listener.on_success(),
                TaskOutcome::Failure => listener.on_failure(),
                TaskOutcome::Interrupted => listener.on_interruption(),
            }
            debug!(task_id = id.0, ?outcome, "background task finished");

            event_tx.send(TaskEvent::Finished { id, outcome }).ok();
            outcome
        });

        TaskHandle {
            id,
            description,
            cancel,
            task,
            join,
        }
    }
}

/// Handle to a spawned task
pub struct TaskHandle {
    id: TaskId,
    description: String,
    cancel: StopToken,
    task: Arc<dyn BackgroundTask>,
    join: JoinHandle<TaskOutcome>,
}

impl TaskHandle {
    /// Runner-assigned ID
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The task's label
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Request cancellation; returns immediately
    pub fn cancel(&self) {
        debug!(task_id = self.id.0, "cancel requested");
        self.cancel.cancel();
        self.task.stop();
    }

    /// Whether the task has finished
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the outcome
    ///
    /// A task that panicked counts as [`TaskOutcome::Failure`].
    pub async fn join(self) -> TaskOutcome {
        match self.join.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(task_id = self.id.0, error = %e, "background task panicked");
                TaskOutcome::Failure
            }
        }
    }
}
