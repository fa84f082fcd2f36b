use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    BackgroundTask, BackgroundTaskListener, StopStatus, StopToken, TaskLifecycle,
    TaskStatusMonitor, TaskOutcome,
};
use crate::domain::SubmissionStatus;
use crate::error::Error;
use crate::services::SubmissionPipeline;
use crate::ui::IdeUiInvoker;

const DESCRIPTION: &str = "Uploading exercises";
const FAILURE_CONTEXT: &str = "An error occurred while uploading exercises";

/// Result of running the zip and upload steps
pub(super) enum StepResult {
    /// Both steps done
    Completed,
    /// Stopped at a checkpoint
    Interrupted,
    /// A step failed
    Failed(Error),
}

/// Steps 1 and 2 of a submission, each followed by a progress tick and a cancel check
pub(super) async fn zip_and_upload(
    pipeline: &dyn SubmissionPipeline,
    monitor: &dyn TaskStatusMonitor,
    stop: &dyn StopStatus,
) -> StepResult {
    if let Err(e) = pipeline.zip_projects().await {
        return StepResult::Failed(e);
    }
    monitor.increment_progress(1);
    if stop.must_stop() {
        return StepResult::Interrupted;
    }

    if let Err(e) = pipeline.handle_submission_response().await {
        return StepResult::Failed(e);
    }
    monitor.increment_progress(1);
    if stop.must_stop() {
        return StepResult::Interrupted;
    }

    StepResult::Completed
}

/// Zips, uploads and waits for the grading result of one project
pub struct UploaderTask {
    pipeline: Arc<dyn SubmissionPipeline>,
    ui: Arc<dyn IdeUiInvoker>,
    stop: StopToken,
    lifecycle: TaskLifecycle,
}

impl UploaderTask {
    /// Task driving `pipeline`, reporting errors through `ui`
    pub fn new(pipeline: Arc<dyn SubmissionPipeline>, ui: Arc<dyn IdeUiInvoker>) -> Self {
        Self {
            pipeline,
            ui,
            stop: StopToken::new(),
            lifecycle: TaskLifecycle::new(),
        }
    }

    /// Lifecycle of this instance
    pub fn lifecycle(&self) -> &TaskLifecycle {
        &self.lifecycle
    }

    async fn run(&self, monitor: &dyn TaskStatusMonitor) -> TaskOutcome {
        let must_stop = || self.stop.must_stop() || monitor.is_cancel_requested();

        match zip_and_upload(self.pipeline.as_ref(), monitor, &must_stop).await {
            StepResult::Completed => {}
            StepResult::Interrupted => return TaskOutcome::Interrupted,
            StepResult::Failed(e) => return self.fail(e),
        }

        match self.pipeline.handle_submission_result(&must_stop).await {
            Ok(()) if must_stop() => {
                info!(exercise = %self.pipeline.exercise_name(), "cancelled while waiting for submission result");
                TaskOutcome::Failure
            }
            Ok(()) => {
                monitor.increment_progress(1);
                TaskOutcome::Success
            }
            Err(e) if e.is_cancelled() => {
                info!(exercise = %self.pipeline.exercise_name(), "stopped waiting for submission result");
                TaskOutcome::Failure
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&self, error: Error) -> TaskOutcome {
        warn!(exercise = %self.pipeline.exercise_name(), error = %error, "submission failed");
        self.ui
            .raise_visible_exception(&error.failure_message(FAILURE_CONTEXT));
        TaskOutcome::Failure
    }
}

#[async_trait]
impl BackgroundTask for UploaderTask {
    async fn start(&self, monitor: &dyn TaskStatusMonitor) -> TaskOutcome {
        if !self.lifecycle.begin() {
            warn!(task = DESCRIPTION, "task instance already started");
            return TaskOutcome::Failure;
        }
        monitor.start_progress(DESCRIPTION, 3);
        let outcome = self.run(monitor).await;
        self.lifecycle.finish(outcome)
    }

    fn stop(&self) {
        self.stop.cancel();
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }
}

/// Shows the grading result once an [`UploaderTask`] succeeds
pub struct SubmissionListener {
    pipeline: Arc<dyn SubmissionPipeline>,
    ui: Arc<dyn IdeUiInvoker>,
}

impl SubmissionListener {
    /// Listener reading the result from `pipeline`
    pub fn new(pipeline: Arc<dyn SubmissionPipeline>, ui: Arc<dyn IdeUiInvoker>) -> Self {
        Self { pipeline, ui }
    }
}

impl BackgroundTaskListener for SubmissionListener {
    fn on_success(&self) {
        let Some(result) = self.pipeline.result() else {
            return;
        };
        let exercise_name = self.pipeline.exercise_name();

        match result.status {
            SubmissionStatus::Error => {
                let message = result
                    .error
                    .as_deref()
                    .unwrap_or("The server reported an error while grading.");
                self.ui.raise_visible_exception(message);
            }
            SubmissionStatus::Pending => {}
            SubmissionStatus::AllPassed => {
                self.ui.invoke_test_result_window(&result.test_cases);
                self.ui.invoke_all_tests_passed_window(&result, &exercise_name);
            }
            SubmissionStatus::SomeFailed => {
                self.ui.invoke_test_result_window(&result.test_cases);
                self.ui.invoke_some_tests_failed_window(&result, &exercise_name);
            }
            SubmissionStatus::AllFailed => {
                self.ui.invoke_test_result_window(&result.test_cases);
                self.ui.invoke_all_tests_failed_window(&result, &exercise_name);
            }
        }
    }
}
