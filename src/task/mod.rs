//! Background task execution
//!
//! Long operations (submitting, sending feedback, downloading exercises) run as
//! [`BackgroundTask`]s on the tokio runtime so the IDE stays responsive.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──start──> Running ──> Succeeded
//!                            ├─> Failed
//!                            └─> Interrupted
//! ```
//!
//! A task instance runs at most once; retries construct a fresh one.
//!
//! ## Cancellation
//!
//! Cancellation is cooperative. [`TaskHandle::cancel`] flips the monitor's
//! cancel flag and calls [`BackgroundTask::stop`]; the task notices at its next
//! checkpoint, after the network call in flight has returned. Long waits take a
//! [`StopStatus`] so they can end early.
//!
//! ## Progress
//!
//! [`ProgressMonitor`] publishes [`TaskEvent`]s on a broadcast channel, which
//! hosts read through [`TaskRunner::subscribe`].

mod code_review;
mod download;
mod feedback;
mod listener;
mod monitor;
mod pastebin;
mod runner;
mod stop;
mod uploader;


pub use code_review::{CodeReviewRequestListener, CodeReviewRequestTask, code_review_params};
pub use download::ExerciseDownloadTask;
pub use feedback::FeedbackSubmissionTask;
pub use listener::{BackgroundTaskListener, NoopListener};
pub use monitor::{ProgressMonitor, TaskStatusMonitor};
pub use pastebin::{PastebinTask, PastebinTaskListener, pastebin_params};
pub use runner::{TaskHandle, TaskRunner};
pub use stop::{StopStatus, StopToken};
pub use uploader::{SubmissionListener, UploaderTask};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Identifier the runner assigns to each spawned task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a task run ended
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutcome {
    /// Work completed
    Success,
    /// Work failed; the user has been told why unless the failure was a stop
    Failure,
    /// Stopped at a checkpoint on user request
    Interrupted,
}

/// Event published while tasks run
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// Task announced its label and step count
    Started {
        /// Task ID
        id: TaskId,
        /// Task label
        description: String,
        /// Number of steps
        total_steps: u32,
    },

    /// Task completed steps
    Progress {
        /// Task ID
        id: TaskId,
        /// Steps done so far
        completed_steps: u32,
        /// Number of steps
        total_steps: u32,
    },

    /// Task reached a terminal state
    Finished {
        /// Task ID
        id: TaskId,
        /// Outcome
        outcome: TaskOutcome,
    },
}

/// Per-instance state of a task
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TaskState {
    /// Constructed, not started
    #[default]
    Created,
    /// `start` in progress
    Running,
    /// Finished with [`TaskOutcome::Success`]
    Succeeded,
    /// Finished with [`TaskOutcome::Failure`]
    Failed,
    /// Finished with [`TaskOutcome::Interrupted`]
    Interrupted,
}

impl TaskState {
    /// Whether the task has finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::Interrupted
        )
    }
}

impl From<TaskOutcome> for TaskState {
    fn from(outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Success => TaskState::Succeeded,
            TaskOutcome::Failure => TaskState::Failed,
            TaskOutcome::Interrupted => TaskState::Interrupted,
        }
    }
}

/// Guards the `Created → Running → terminal` transitions of one task instance
#[derive(Debug, Default)]
pub struct TaskLifecycle {
    state: Mutex<TaskState>,
}

impl TaskLifecycle {
    /// Lifecycle in [`TaskState::Created`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn state(&self) -> TaskState {
        self.state.lock().map(|s| *s).unwrap_or(TaskState::Failed)
    }

    /// Move to `Running`; returns false if the task was already started
    pub fn begin(&self) -> bool {
        match self.state.lock() {
            Ok(mut state) if *state == TaskState::Created => {
                *state = TaskState::Running;
                true
            }
            _ => false,
        }
    }

    /// Record the terminal outcome and pass it through
    pub fn finish(&self, outcome: TaskOutcome) -> TaskOutcome {
        if let Ok(mut state) = self.state.lock() {
            *state = outcome.into();
        }
        outcome
    }
}

/// A unit of background work
///
/// `start` runs the work to completion on whatever task the caller placed it on.
/// `stop` may be called concurrently from any thread and only flips a flag that
/// `start` observes at its next checkpoint.
#[async_trait]
pub trait BackgroundTask: Send + Sync {
    /// Run the task, reporting progress to `monitor`
    async fn start(&self, monitor: &dyn TaskStatusMonitor) -> TaskOutcome;

    /// Ask the task to stop at its next checkpoint; never blocks
    fn stop(&self);

    /// Fixed human-readable label
    fn description(&self) -> &str;
}
