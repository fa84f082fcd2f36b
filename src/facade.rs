//! Composition root
//!
//! [`TmcCore`] builds the shared services once and turns each user action into a
//! task handed to the [`TaskRunner`]. Hosts keep one instance for the lifetime of
//! the IDE session and pass it by reference wherever actions start.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use crate::archive::ProjectZipper;
use crate::config::Settings;
use crate::domain::{Course, Exercise, FeedbackAnswer, Project, Review};
use crate::error::Result;
use crate::io::{FileIo, LocalFileIo};
use crate::server::ServerManager;
use crate::services::{
    FeedbackAnswerSubmitter, ProjectDownloader, ProjectUploader, ReviewChecker,
    SubmissionPipeline,
};
use crate::task::{
    CodeReviewRequestListener, CodeReviewRequestTask, ExerciseDownloadTask,
    FeedbackSubmissionTask, NoopListener, PastebinTask, PastebinTaskListener, SubmissionListener,
    TaskEvent, TaskHandle, TaskRunner, UploaderTask, code_review_params, pastebin_params,
};
use crate::ui::IdeUiInvoker;

/// Entry point for hosts
pub struct TmcCore {
    settings: Arc<Settings>,
    server: Arc<ServerManager>,
    io: Arc<dyn FileIo>,
    ui: Arc<dyn IdeUiInvoker>,
    runner: TaskRunner,
    downloader: Arc<ProjectDownloader>,
    reviews: ReviewChecker,
}

impl TmcCore {
    /// Validate `settings` and build the services on the local file system
    pub fn new(settings: Settings, ui: Arc<dyn IdeUiInvoker>) -> Result<Self> {
        Self::with_file_io(settings, ui, Arc::new(LocalFileIo))
    }

    /// Same as [`TmcCore::new`] with a custom file-system collaborator
    pub fn with_file_io(
        settings: Settings,
        ui: Arc<dyn IdeUiInvoker>,
        io: Arc<dyn FileIo>,
    ) -> Result<Self> {
        settings.validate()?;
        let settings = Arc::new(settings);
        let server = Arc::new(ServerManager::new(settings.clone())?);
        let downloader = Arc::new(ProjectDownloader::new(
            server.clone(),
            io.clone(),
            settings.workspace_dir.clone(),
        ));
        let reviews = ReviewChecker::new(server.clone(), ui.clone());

        info!(server = %settings.server_url, "tmc core ready");
        Ok(Self {
            settings,
            server,
            io,
            ui,
            runner: TaskRunner::new(),
            downloader,
            reviews,
        })
    }

    /// Shared settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Protocol client, for listings and other direct calls
    pub fn server(&self) -> &Arc<ServerManager> {
        &self.server
    }

    /// Task progress and completion events
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.runner.subscribe()
    }

    /// Courses visible to the configured user; empty when listing fails softly
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        self.server.get_courses().await
    }

    /// Exercises of one course; empty when listing fails softly
    pub async fn list_exercises(&self, course_id: u64) -> Result<Vec<Exercise>> {
        self.server.get_exercises(course_id).await
    }

    /// Uploader for `project`, for hosts that want to read its state afterwards
    pub fn uploader(&self, project: Project, extra_params: Vec<(String, String)>) -> Arc<ProjectUploader> {
        Arc::new(ProjectUploader::new(
            self.server.clone(),
            ProjectZipper::new(self.io.clone()),
            project,
            extra_params,
        ))
    }

    /// Submit `project` for grading; the result is shown through the UI
    pub fn submit(&self, project: Project) -> TaskHandle {
        self.submit_pipeline(self.uploader(project, Vec::new()))
    }

    /// Run the three submission steps on `pipeline`
    pub fn submit_pipeline(&self, pipeline: Arc<dyn SubmissionPipeline>) -> TaskHandle {
        let task = Arc::new(UploaderTask::new(pipeline.clone(), self.ui.clone()));
        let listener = Arc::new(SubmissionListener::new(pipeline, self.ui.clone()));
        self.runner.spawn(task, listener)
    }

    /// Send survey answers to the URL that came with a grading result
    pub fn send_feedback(&self, answers: Vec<FeedbackAnswer>, answer_url: Option<String>) -> TaskHandle {
        let task = Arc::new(FeedbackSubmissionTask::new(
            FeedbackAnswerSubmitter::new(self.server.clone()),
            answers,
            answer_url,
            self.ui.clone(),
        ));
        self.runner.spawn(task, Arc::new(NoopListener))
    }

    /// Submit `project` asking a human to review it
    pub fn request_code_review(&self, project: Project, message_for_reviewer: &str) -> TaskHandle {
        let pipeline = self.uploader(project, code_review_params(message_for_reviewer));
        let task = Arc::new(CodeReviewRequestTask::new(pipeline));
        let listener = Arc::new(CodeReviewRequestListener::new(task.clone(), self.ui.clone()));
        self.runner.spawn(task, listener)
    }

    /// Upload `project` as a paste and show its URL
    pub fn send_to_pastebin(&self, project: Project, message_for_paste: &str) -> TaskHandle {
        let pipeline = self.uploader(project, pastebin_params(message_for_paste));
        let task = Arc::new(PastebinTask::new(pipeline));
        let listener = Arc::new(PastebinTaskListener::new(task.clone(), self.ui.clone()));
        self.runner.spawn(task, listener)
    }

    /// Download `exercises` into the workspace
    ///
    /// `existing` are the projects already present; their student sources are kept.
    /// The returned task holds the downloaded projects once the handle completes.
    pub fn download_exercises(
        &self,
        exercises: Vec<Exercise>,
        existing: Vec<Project>,
    ) -> (TaskHandle, Arc<ExerciseDownloadTask>) {
        let task = Arc::new(ExerciseDownloadTask::new(
            self.downloader.clone(),
            exercises,
            existing,
            self.ui.clone(),
        ));
        let handle = self.runner.spawn(task.clone(), Arc::new(NoopListener));
        (handle, task)
    }

    /// Notify about unread reviews of `course` that were not announced yet
    pub async fn check_reviews(&self, course: &Course) -> Result<Vec<Review>> {
        self.reviews.check_for_new_reviews(course).await
    }

    /// Show `review` and mark it read
    pub async fn open_review(&self, review: &Review) -> Result<()> {
        self.reviews.open_review(review).await
    }

    /// Ask every running task to stop
    pub fn shutdown(&self) {
        self.runner.shutdown();
    }
}
