use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::{
    BackgroundTask, StopStatus, StopToken, TaskLifecycle, TaskOutcome, TaskStatusMonitor,
};
use crate::domain::{Exercise, Project};
use crate::services::ProjectDownloader;
use crate::ui::IdeUiInvoker;

const DESCRIPTION: &str = "Downloading exercises";
const FAILURE_CONTEXT: &str = "An error occurred while downloading exercises";

/// Downloads and unpacks a batch of exercises, one step each
///
/// Exercises the server sent as empty archives are skipped and named together in
/// one message at the end.
pub struct ExerciseDownloadTask {
    downloader: Arc<ProjectDownloader>,
    exercises: Vec<Exercise>,
    existing: Vec<Project>,
    ui: Arc<dyn IdeUiInvoker>,
    stop: StopToken,
    lifecycle: TaskLifecycle,
    projects: Mutex<Vec<Project>>,
}

impl ExerciseDownloadTask {
    /// Task downloading `exercises`; `existing` are the projects already in the workspace
    pub fn new(
        downloader: Arc<ProjectDownloader>,
        exercises: Vec<Exercise>,
        existing: Vec<Project>,
        ui: Arc<dyn IdeUiInvoker>,
    ) -> Self {
        Self {
            downloader,
            exercises,
            existing,
            ui,
            stop: StopToken::new(),
            lifecycle: TaskLifecycle::new(),
            projects: Mutex::new(Vec::new()),
        }
    }

    /// Projects downloaded so far, leaving none behind
    pub fn take_projects(&self) -> Vec<Project> {
        self.projects
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }

    fn existing_project(&self, exercise: &Exercise) -> Option<&Project> {
        let root = self.downloader.project_root(exercise).ok()?;
        self.existing.iter().find(|p| p.root_path == root)
    }
}

#[async_trait]
impl BackgroundTask for ExerciseDownloadTask {
    async fn start(&self, monitor: &dyn TaskStatusMonitor) -> TaskOutcome {
        if !self.lifecycle.begin() {
            warn!(task = DESCRIPTION, "task instance already started");
            return TaskOutcome::Failure;
        }
        let total = u32::try_from(self.exercises.len()).unwrap_or(u32::MAX);
        monitor.start_progress(DESCRIPTION, total);

        let mut empty = Vec::new();
        for exercise in &self.exercises {
            if self.stop.must_stop() || monitor.is_cancel_requested() {
                return self.lifecycle.finish(TaskOutcome::Interrupted);
            }

            match self
                .downloader
                .download_exercise(exercise, self.existing_project(exercise))
                .await
            {
                Ok(Some(project)) => {
                    if let Ok(mut projects) = self.projects.lock() {
                        projects.push(project);
                    }
                }
                Ok(None) => empty.push(exercise.name.clone()),
                Err(e) => {
                    warn!(exercise = %exercise.name, error = %e, "exercise download failed");
                    self.ui
                        .raise_visible_exception(&e.failure_message(FAILURE_CONTEXT));
                    return self.lifecycle.finish(TaskOutcome::Failure);
                }
            }
            monitor.increment_progress(1);
        }

        if !empty.is_empty() {
            self.ui.invoke_message_box(&format!(
                "The server sent no content for these exercises: {}",
                empty.join(", ")
            ));
        }
        info!(
            requested = self.exercises.len(),
            empty = empty.len(),
            "exercise download finished"
        );
        self.lifecycle.finish(TaskOutcome::Success)
    }

    fn stop(&self) {
        self.stop.cancel();
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }
}
