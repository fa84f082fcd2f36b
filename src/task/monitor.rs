use std::sync::Mutex;
use tokio::sync::broadcast;

use super::{StopToken, TaskEvent, TaskId};

/// Progress sink handed to a running task
///
/// `start_progress` is called once before any `increment_progress`. The task polls
/// `is_cancel_requested` between blocking steps.
pub trait TaskStatusMonitor: Send + Sync {
    /// Announce the task's label and total number of steps
    fn start_progress(&self, description: &str, total_steps: u32);

    /// Advance by `steps`
    fn increment_progress(&self, steps: u32);

    /// Whether the user asked to cancel
    fn is_cancel_requested(&self) -> bool;
}

#[derive(Debug, Default)]
struct Progress {
    total: u32,
    done: u32,
}

/// [`TaskStatusMonitor`] that publishes progress as [`TaskEvent`]s
pub struct ProgressMonitor {
    id: TaskId,
    cancel: StopToken,
    event_tx: broadcast::Sender<TaskEvent>,
    progress: Mutex<Progress>,
}

impl ProgressMonitor {
    /// Monitor for task `id`, cancelled through `cancel`
    pub fn new(id: TaskId, cancel: StopToken, event_tx: broadcast::Sender<TaskEvent>) -> Self {
        Self {
            id,
            cancel,
            event_tx,
            progress: Mutex::new(Progress::default()),
        }
    }

    /// Steps completed so far
    pub fn completed_steps(&self) -> u32 {
        self.progress.lock().map(|p| p.done).unwrap_or(0)
    }
}

impl TaskStatusMonitor for ProgressMonitor {
    fn start_progress(&self, description: &str, total_steps: u32) {
        if let Ok(mut progress) = self.progress.lock() {
            *progress = Progress {
                total: total_steps,
                done: 0,
            };
        }
        // no subscribers is fine
        self.event_tx
            .send(TaskEvent::Started {
                id: self.id,
                description: description.to_string(),
                total_steps,
            })
            .ok();
    }

    fn increment_progress(&self, steps: u32) {
        let (done, total) = match self.progress.lock() {
            Ok(mut progress) => {
                progress.done = progress.done.saturating_add(steps);
                (progress.done, progress.total)
            }
            Err(_) => return,
        };
        self.event_tx
            .send(TaskEvent::Progress {
                id: self.id,
                completed_steps: done,
                total_steps: total,
            })
            .ok();
    }

    fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
