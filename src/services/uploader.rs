use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

use crate::archive::{ProjectZipper, ZipPolicy};
use crate::domain::{
    Project, SubmissionResponse, SubmissionResult, SubmissionStatus, ZippedProject,
};
use crate::error::{Error, Result};
use crate::server::ServerManager;
use crate::task::StopStatus;

/// The three submission steps, called strictly in order for one submission
///
/// Each step keeps its product inside the pipeline so the task driving it can
/// check for cancellation between steps.
#[async_trait]
pub trait SubmissionPipeline: Send + Sync {
    /// Step 1: zip the project
    async fn zip_projects(&self) -> Result<()>;

    /// Step 2: upload the zip and parse the server's reply
    async fn handle_submission_response(&self) -> Result<()>;

    /// Step 3: poll for the grading result until it is ready or `stop` says so
    async fn handle_submission_result(&self, stop: &dyn StopStatus) -> Result<()>;

    /// Name of the exercise being submitted
    fn exercise_name(&self) -> String;

    /// Reply to the upload, once step 2 has succeeded
    fn response(&self) -> Option<SubmissionResponse>;

    /// Grading result, once step 3 has succeeded
    fn result(&self) -> Option<SubmissionResult>;
}

/// Zips a project, uploads it and waits for the verdict
///
/// The archive is owned by the uploader between steps 1 and 2 and released when
/// the upload step runs, whatever its outcome.
pub struct ProjectUploader {
    server: Arc<ServerManager>,
    zipper: ProjectZipper,
    extra_params: Vec<(String, String)>,
    project: Mutex<Project>,
    zipped: Mutex<Option<ZippedProject>>,
    response: Mutex<Option<SubmissionResponse>>,
    result: Mutex<Option<SubmissionResult>>,
}

impl ProjectUploader {
    /// Uploader for `project`; `extra_params` go into the multipart form
    pub fn new(
        server: Arc<ServerManager>,
        zipper: ProjectZipper,
        project: Project,
        extra_params: Vec<(String, String)>,
    ) -> Self {
        Self {
            server,
            zipper,
            extra_params,
            project: Mutex::new(project),
            zipped: Mutex::new(None),
            response: Mutex::new(None),
            result: Mutex::new(None),
        }
    }

    /// Current state of the project, including flags updated after grading
    pub fn project(&self) -> Result<Project> {
        Ok(lock(&self.project)?.clone())
    }

    /// Whether a zipped archive is still held
    pub fn holds_archive(&self) -> bool {
        lock(&self.zipped).map(|z| z.is_some()).unwrap_or(false)
    }
}

#[async_trait]
impl SubmissionPipeline for ProjectUploader {
    async fn zip_projects(&self) -> Result<()> {
        let project = self.project()?;
        if project.exercise.is_none() {
            return Err(Error::InvalidProject(format!(
                "{} is not a TMC project",
                project.root_path.display()
            )));
        }

        let zipper = self.zipper.clone();
        let zipped = tokio::task::spawn_blocking(move || {
            let policy = ZipPolicy::for_project(Some(&project));
            zipper.zip_project(&project, &policy)
        })
        .await
        .map_err(|e| Error::Io(std::io::Error::other(format!("zipping task failed: {e}"))))??;

        debug!(bytes = zipped.len(), "project zipped");
        *lock(&self.zipped)? = Some(zipped);
        Ok(())
    }

    async fn handle_submission_response(&self) -> Result<()> {
        let zipped = lock(&self.zipped)?
            .take()
            .ok_or_else(|| Error::InvalidState("nothing has been zipped for upload".to_string()))?;
        let exercise = self
            .project()?
            .exercise
            .ok_or_else(|| Error::InvalidProject("project has no exercise".to_string()))?;

        let response = self
            .server
            .upload_file(&exercise, zipped.into_bytes(), &self.extra_params)
            .await?;

        info!(exercise = %exercise.name, url = %response.submission_url, "submission accepted");
        *lock(&self.response)? = Some(response);
        Ok(())
    }

    async fn handle_submission_result(&self, stop: &dyn StopStatus) -> Result<()> {
        let response = lock(&self.response)?
            .clone()
            .ok_or_else(|| Error::InvalidState("submission has not been uploaded".to_string()))?;

        let result = self
            .server
            .wait_for_submission_result(&response.submission_url, stop)
            .await?;

        if let Some(exercise) = lock(&self.project)?.exercise.as_mut() {
            exercise.attempted = true;
            if result.status == SubmissionStatus::AllPassed {
                exercise.completed = true;
            }
        }
        *lock(&self.result)? = Some(result);
        Ok(())
    }

    fn exercise_name(&self) -> String {
        lock(&self.project).map(|p| p.name()).unwrap_or_default()
    }

    fn response(&self) -> Option<SubmissionResponse> {
        lock(&self.response).ok().and_then(|r| r.clone())
    }

    fn result(&self) -> Option<SubmissionResult> {
        lock(&self.result).ok().and_then(|r| r.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| Error::InvalidState("uploader state lock poisoned".to_string()))
}
