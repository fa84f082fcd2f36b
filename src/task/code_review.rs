use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::uploader::{StepResult, zip_and_upload};
use super::{
    BackgroundTask, BackgroundTaskListener, StopStatus, StopToken, TaskLifecycle, TaskOutcome,
    TaskStatusMonitor,
};
use crate::error::{ErrorKind, OBSOLETE_CLIENT_MESSAGE};
use crate::services::SubmissionPipeline;
use crate::ui::IdeUiInvoker;

const DESCRIPTION: &str = "Sending code review request";
const FAILURE_MESSAGE: &str = "Failed to create the code review request.";

/// Form fields that turn a submission into a code review request
pub fn code_review_params(message_for_reviewer: &str) -> Vec<(String, String)> {
    vec![
        ("request_review".to_string(), "1".to_string()),
        (
            "message_for_reviewer".to_string(),
            message_for_reviewer.to_string(),
        ),
    ]
}

/// Submits a project with a request for a human review
///
/// Runs the zip and upload steps only; nothing waits for grading.
pub struct CodeReviewRequestTask {
    pipeline: Arc<dyn SubmissionPipeline>,
    stop: StopToken,
    lifecycle: TaskLifecycle,
    failure: Mutex<Option<ErrorKind>>,
}

impl CodeReviewRequestTask {
    /// Task driving `pipeline`, which must carry [`code_review_params`]
    pub fn new(pipeline: Arc<dyn SubmissionPipeline>) -> Self {
        Self {
            pipeline,
            stop: StopToken::new(),
            lifecycle: TaskLifecycle::new(),
            failure: Mutex::new(None),
        }
    }

    /// Kind of the error that failed the last run
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        self.failure.lock().ok().and_then(|f| *f)
    }
}

#[async_trait]
impl BackgroundTask for CodeReviewRequestTask {
    async fn start(&self, monitor: &dyn TaskStatusMonitor) -> TaskOutcome {
        if !self.lifecycle.begin() {
            warn!(task = DESCRIPTION, "task instance already started");
            return TaskOutcome::Failure;
        }
        monitor.start_progress(DESCRIPTION, 2);

        let must_stop = || self.stop.must_stop() || monitor.is_cancel_requested();
        let outcome = match zip_and_upload(self.pipeline.as_ref(), monitor, &must_stop).await {
            StepResult::Completed => {
                info!(exercise = %self.pipeline.exercise_name(), "code review requested");
                TaskOutcome::Success
            }
            StepResult::Interrupted => TaskOutcome::Interrupted,
            StepResult::Failed(e) => {
                warn!(exercise = %self.pipeline.exercise_name(), error = %e, "code review request failed");
                if let Ok(mut failure) = self.failure.lock() {
                    *failure = Some(e.kind());
                }
                TaskOutcome::Failure
            }
        };
        self.lifecycle.finish(outcome)
    }

    fn stop(&self) {
        self.stop.cancel();
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }
}

/// Tells the user whether the review request went through
pub struct CodeReviewRequestListener {
    task: Arc<CodeReviewRequestTask>,
    ui: Arc<dyn IdeUiInvoker>,
}

impl CodeReviewRequestListener {
    /// Listener for `task`
    pub fn new(task: Arc<CodeReviewRequestTask>, ui: Arc<dyn IdeUiInvoker>) -> Self {
        Self { task, ui }
    }
}

impl BackgroundTaskListener for CodeReviewRequestListener {
    fn on_success(&self) {
        self.ui.invoke_code_review_request_successfully_sent_window();
    }

    fn on_failure(&self) {
        match self.task.failure_kind() {
            Some(ErrorKind::ObsoleteClient) => self.ui.raise_visible_exception(OBSOLETE_CLIENT_MESSAGE),
            _ => self.ui.raise_visible_exception(FAILURE_MESSAGE),
        }
    }
}
