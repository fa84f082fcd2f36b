use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    BackgroundTask, StopStatus, StopToken, TaskLifecycle, TaskOutcome, TaskStatusMonitor,
};
use crate::domain::FeedbackAnswer;
use crate::services::FeedbackAnswerSubmitter;
use crate::ui::IdeUiInvoker;

const DESCRIPTION: &str = "Sending feedback";
const FAILURE_CONTEXT: &str = "An error occurred while submitting feedback";

/// Sends the survey answers that follow a graded submission
pub struct FeedbackSubmissionTask {
    submitter: FeedbackAnswerSubmitter,
    answers: Vec<FeedbackAnswer>,
    answer_url: Option<String>,
    ui: Arc<dyn IdeUiInvoker>,
    stop: StopToken,
    lifecycle: TaskLifecycle,
}

impl FeedbackSubmissionTask {
    /// Task posting `answers` to `answer_url`
    pub fn new(
        submitter: FeedbackAnswerSubmitter,
        answers: Vec<FeedbackAnswer>,
        answer_url: Option<String>,
        ui: Arc<dyn IdeUiInvoker>,
    ) -> Self {
        Self {
            submitter,
            answers,
            answer_url,
            ui,
            stop: StopToken::new(),
            lifecycle: TaskLifecycle::new(),
        }
    }
}

#[async_trait]
impl BackgroundTask for FeedbackSubmissionTask {
    async fn start(&self, monitor: &dyn TaskStatusMonitor) -> TaskOutcome {
        if !self.lifecycle.begin() {
            warn!(task = DESCRIPTION, "task instance already started");
            return TaskOutcome::Failure;
        }
        monitor.start_progress(DESCRIPTION, 1);
        if self.stop.must_stop() || monitor.is_cancel_requested() {
            return self.lifecycle.finish(TaskOutcome::Interrupted);
        }

        let outcome = match self
            .submitter
            .submit_feedback(&self.answers, self.answer_url.as_deref())
            .await
        {
            Ok(reply) => {
                debug!(sent = reply.is_some(), "feedback handled");
                monitor.increment_progress(1);
                TaskOutcome::Success
            }
            Err(e) => {
                warn!(error = %e, "feedback submission failed");
                self.ui
                    .raise_visible_exception(&e.failure_message(FAILURE_CONTEXT));
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
