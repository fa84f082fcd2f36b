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

const DESCRIPTION: &str = "Sending to pastebin";
const FAILURE_MESSAGE: &str = "Failed to create the requested pastebin.";
const NO_URL_MESSAGE: &str =
    "The server returned no URL for the paste. Please contact TMC support.";

/// Form fields that turn a submission into a paste
pub fn pastebin_params(message_for_paste: &str) -> Vec<(String, String)> {
    vec![
        ("paste".to_string(), "1".to_string()),
        (
            "message_for_paste".to_string(),
            message_for_paste.to_string(),
        ),
    ]
}

/// Uploads a project as a paste and keeps the resulting URL
pub struct PastebinTask {
    pipeline: Arc<dyn SubmissionPipeline>,
    stop: StopToken,
    lifecycle: TaskLifecycle,
    failure: Mutex<Option<ErrorKind>>,
}

impl PastebinTask {
    /// Task driving `pipeline`, which must carry [`pastebin_params`]
    pub fn new(pipeline: Arc<dyn SubmissionPipeline>) -> Self {
        Self {
            pipeline,
            stop: StopToken::new(),
            lifecycle: TaskLifecycle::new(),
            failure: Mutex::new(None),
        }
    }

    /// Paste URL, once the upload has succeeded
    pub fn paste_url(&self) -> Option<String> {
        self.pipeline.response().map(|r| r.paste_url.to_string())
    }

    /// Kind of the error that failed the last run
    pub fn failure_kind(&self) -> Option<ErrorKind> {
        self.failure.lock().ok().and_then(|f| *f)
    }
}

#[async_trait]
impl BackgroundTask for PastebinTask {
    async fn start(&self, monitor: &dyn TaskStatusMonitor) -> TaskOutcome {
        if !self.lifecycle.begin() {
            warn!(task = DESCRIPTION, "task instance already started");
            return TaskOutcome::Failure;
        }
        monitor.start_progress(DESCRIPTION, 2);

        let must_stop = || self.stop.must_stop() || monitor.is_cancel_requested();
        let outcome = match zip_and_upload(self.pipeline.as_ref(), monitor, &must_stop).await {
            StepResult::Completed => {
                info!(paste = ?self.paste_url(), "paste created");
                TaskOutcome::Success
            }
            StepResult::Interrupted => TaskOutcome::Interrupted,
            StepResult::Failed(e) => {
                warn!(exercise = %self.pipeline.exercise_name(), error = %e, "pastebin upload failed");
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

/// Shows the paste URL or explains why there is none
pub struct PastebinTaskListener {
    task: Arc<PastebinTask>,
    ui: Arc<dyn IdeUiInvoker>,
}

impl PastebinTaskListener {
    /// Listener for `task`
    pub fn new(task: Arc<PastebinTask>, ui: Arc<dyn IdeUiInvoker>) -> Self {
        Self { task, ui }
    }
}

impl BackgroundTaskListener for PastebinTaskListener {
    fn on_success(&self) {
        match self.task.paste_url() {
            Some(url) => self.ui.invoke_pastebin_result_dialog(&url),
            None => self.ui.raise_visible_exception(NO_URL_MESSAGE),
        }
    }

    fn on_failure(&self) {
        match self.task.failure_kind() {
            Some(ErrorKind::ObsoleteClient) => self.ui.raise_visible_exception(OBSOLETE_CLIENT_MESSAGE),
            _ => self.ui.raise_visible_exception(FAILURE_MESSAGE),
        }
    }
}
