//! TMC server protocol client
//!
//! [`ServerManager`] is the one place the crate talks to the grading server. Every
//! call builds a URL carrying the client parameters, executes it through
//! [`RequestBuilder`], decodes the payload and maps failures to [`Error`]
//! variants. Listing calls are fail-soft: transport and protocol failures yield an
//! empty list, while authentication and version errors still propagate.

pub mod result_parser;
mod urls;

#[cfg(test)]
mod tests;

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Settings;
use crate::domain::{
    Course, CourseList, Exercise, ExerciseList, FeedbackAnswer, LoggableEvent, Review, ReviewList,
    SubmissionResponse, SubmissionResult, ZippedProject,
};
use crate::error::{Error, Result};
use crate::http::{RequestBuilder, SUBMISSION_FILE_FIELD};
use crate::retry::{Backoff, IsRetryable, sleep_unless_stopped};
use crate::task::StopStatus;

pub use result_parser::parse_submission_result;
pub(crate) use urls::{api_url, with_client_params};

/// Nanoseconds elapsed on a monotonic clock since the first call in this process
///
/// Sent as `client_nanotime` so the server can order submissions from one session.
pub fn monotonic_nanos() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    let epoch = EPOCH.get_or_init(Instant::now);
    u64::try_from(epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
}

/// Protocol client for the grading server
///
/// Cheap to share behind an `Arc`; holds the HTTP client and the read-only settings.
pub struct ServerManager {
    http: RequestBuilder,
    settings: Arc<Settings>,
}

impl ServerManager {
    /// Create a client for the server in `settings`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(settings: Arc<Settings>) -> Result<Self> {
        let http = RequestBuilder::new(settings.clone())?;
        Ok(Self { http, settings })
    }

    /// Settings this client was built with
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// List the courses visible to the user
    ///
    /// Returns an empty list if the server cannot be reached or answers garbage.
    pub async fn get_courses(&self) -> Result<Vec<Course>> {
        let url = api_url(&self.settings, "courses")?;
        let listed = self
            .get_json::<CourseList>(&url)
            .await
            .map(CourseList::into_courses);
        soft_listing(listed, "courses")
    }

    /// List the exercises of one course
    ///
    /// Deadlines are parsed and `course_name` is left as the server sent it.
    pub async fn get_exercises(&self, course_id: u64) -> Result<Vec<Exercise>> {
        let url = api_url(&self.settings, &format!("courses/{course_id}/exercises"))?;
        let listed = self
            .get_json::<ExerciseList>(&url)
            .await
            .map(ExerciseList::into_exercises);

        let mut exercises = soft_listing(listed, "exercises")?;
        for exercise in &mut exercises {
            exercise.finalize_deserialization();
        }
        Ok(exercises)
    }

    /// Download an exercise template or solution zip
    ///
    /// A transport failure yields an empty archive rather than an error; callers
    /// treat an empty archive as "nothing to unzip". Status errors still propagate.
    pub async fn get_exercise_zip(&self, zip_url: &str) -> Result<ZippedProject> {
        let url = with_client_params(&self.settings, zip_url)?;
        match self.http.get_for_binary(&url).await {
            Ok(bytes) => Ok(ZippedProject::new(bytes)),
            Err(e) if e.is_soft_listing_failure() => {
                warn!(%url, error = %e, "exercise download failed, treating as empty");
                Ok(ZippedProject::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Upload a submission archive to the exercise's return URL
    ///
    /// `extra_params` are appended after the standard metadata fields.
    pub async fn upload_file(
        &self,
        exercise: &Exercise,
        data: Vec<u8>,
        extra_params: &[(String, String)],
    ) -> Result<SubmissionResponse> {
        if exercise.return_url.trim().is_empty() {
            return Err(Error::InvalidProject(format!(
                "exercise {} has no submission URL",
                exercise.name
            )));
        }
        let url = with_client_params(&self.settings, &exercise.return_url)?;

        let mut fields = vec![
            ("client_time".to_string(), chrono::Utc::now().timestamp().to_string()),
            ("client_nanotime".to_string(), monotonic_nanos().to_string()),
            (
                "error_msg_locale".to_string(),
                self.settings.error_msg_locale.clone(),
            ),
        ];
        fields.extend(extra_params.iter().cloned());

        info!(exercise = %exercise.name, bytes = data.len(), "uploading submission");
        let body = self
            .http
            .upload_file_for_text(&url, fields, SUBMISSION_FILE_FIELD, data)
            .await?;
        SubmissionResponse::from_json(&body)
    }

    /// Fetch the grading result once
    pub async fn get_submission_result(&self, submission_url: &Url) -> Result<SubmissionResult> {
        let url = with_client_params(&self.settings, submission_url.as_str())?;
        let body = self.http.get_for_text(&url).await?;
        Ok(parse_submission_result(&body))
    }

    /// Poll the grading result until it is terminal, `stop` asks to stop, or the
    /// polling budget runs out
    ///
    /// Transient failures (connect errors, timeouts, HTTP 500) use up polls from the
    /// same budget. A stop request returns [`Error::Cancelled`] without another request.
    pub async fn wait_for_submission_result(
        &self,
        submission_url: &Url,
        stop: &dyn StopStatus,
    ) -> Result<SubmissionResult> {
        let polling = &self.settings.polling;
        let mut backoff = Backoff::new(polling);

        for attempt in 1..=polling.max_attempts {
            if stop.must_stop() {
                return Err(Error::Cancelled);
            }

            match self.get_submission_result(submission_url).await {
                Ok(result) if result.status.is_terminal() => {
                    debug!(url = %submission_url, attempt, status = ?result.status, "submission graded");
                    return Ok(result);
                }
                Ok(_) => debug!(url = %submission_url, attempt, "submission still processing"),
                Err(e) if e.is_retryable() => {
                    warn!(url = %submission_url, attempt, error = %e, "result poll failed, retrying");
                }
                Err(e) => return Err(e),
            }

            if attempt < polling.max_attempts {
                sleep_unless_stopped(backoff.next_delay(), stop).await?;
            }
        }

        Err(Error::ResultTimeout {
            polls: polling.max_attempts,
        })
    }

    /// Post survey answers to `answer_url` and return the server's reply text
    pub async fn submit_feedback(&self, answer_url: &str, answers: &[FeedbackAnswer]) -> Result<String> {
        let url = with_client_params(&self.settings, answer_url)?;
        let form: Vec<(String, String)> = answers
            .iter()
            .enumerate()
            .flat_map(|(i, answer)| {
                [
                    (
                        format!("answers[{i}][question_id]"),
                        answer.question.id.to_string(),
                    ),
                    (format!("answers[{i}][answer]"), answer.answer.clone()),
                ]
            })
            .collect();

        debug!(%url, answers = answers.len(), "submitting feedback");
        self.http.post_for_text(&url, &form).await
    }

    /// Send usage events as gzip-compressed JSON
    pub async fn send_event_logs(&self, event_log_url: &str, events: &[LoggableEvent]) -> Result<()> {
        let url = with_client_params(&self.settings, event_log_url)?;
        let body = gzip_json(events)?;
        let headers = [
            ("X-Tmc-Version", "1".to_string()),
            ("X-Tmc-Username", self.settings.username.clone()),
            ("X-Tmc-Password", self.settings.password.clone()),
        ];

        debug!(%url, events = events.len(), bytes = body.len(), "sending event logs");
        self.http.raw_post_for_text(&url, body, &headers).await?;
        Ok(())
    }

    /// Fetch the code reviews of a course
    pub async fn download_reviews(&self, course: &Course) -> Result<Vec<Review>> {
        let Some(reviews_url) = course.reviews_url.as_deref().filter(|u| !u.trim().is_empty())
        else {
            return Ok(Vec::new());
        };
        let url = with_client_params(&self.settings, reviews_url)?;
        Ok(self.get_json::<ReviewList>(&url).await?.into_reviews())
    }

    /// Mark a review read on the server
    pub async fn mark_review_as_read(&self, review: &Review) -> Result<()> {
        let url = with_client_params(&self.settings, &format!("{}.json", review.update_url))?;
        let form = [
            ("_method".to_string(), "put".to_string()),
            ("mark_as_read".to_string(), "1".to_string()),
        ];
        self.http.post_for_text(&url, &form).await?;
        Ok(())
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let body = self.http.get_for_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn soft_listing<T>(listed: Result<Vec<T>>, what: &str) -> Result<Vec<T>> {
    match listed {
        Ok(items) => Ok(items),
        Err(e) if e.is_soft_listing_failure() => {
            warn!(error = %e, "failed to list {what}, showing none");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

fn gzip_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(value)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}
