use serde::{Deserialize, Serialize};
use url::Url;

use super::FeedbackQuestion;
use crate::error::{Error, Result};

/// Reply to a successful upload: where to poll for results, and the paste link
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    /// Endpoint polled for the grading result
    pub submission_url: Url,
    /// Public paste of the submitted code
    pub paste_url: Url,
}

impl SubmissionResponse {
    /// Parse the upload reply
    ///
    /// Only a body with both URLs yields a response. An `error` field, a missing
    /// or malformed URL, or any other shape is an error, never a partial success.
    pub fn from_json(body: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| Error::Protocol(format!("upload reply is not JSON: {e}")))?;
        let object = json
            .as_object()
            .ok_or_else(|| Error::Protocol("upload reply is not a JSON object".to_string()))?;

        if let Some(error) = object.get("error").filter(|e| !e.is_null()) {
            let message = match error.as_str() {
                Some(text) => text.to_string(),
                None => error.to_string(),
            };
            return Err(Error::SubmissionRejected(message));
        }

        let Some(submission_url) = object.get("submission_url") else {
            return Err(Error::Protocol("server returned unknown response".to_string()));
        };

        let parse = |value: Option<&serde_json::Value>| {
            value
                .and_then(|v| v.as_str())
                .and_then(|s| Url::parse(s).ok())
                .ok_or_else(|| {
                    Error::Protocol("server responded with malformed submission url".to_string())
                })
        };

        Ok(Self {
            submission_url: parse(Some(submission_url))?,
            paste_url: parse(object.get("paste_url"))?,
        })
    }
}

/// Outcome class of a grading result; selects which UI path fires
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Grader has not finished
    #[default]
    Pending,
    /// Every test passed
    AllPassed,
    /// At least one test passed and at least one failed
    SomeFailed,
    /// No test passed (includes compilation failures)
    AllFailed,
    /// Grader or server reported an error
    Error,
}

impl SubmissionStatus {
    /// Whether polling can stop
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubmissionStatus::Pending)
    }
}

/// One test case of a grading result
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// Test name, usually `Class method`
    pub name: String,
    /// Whether the test passed
    pub successful: bool,
    /// Failure message
    #[serde(default)]
    pub message: Option<String>,
    /// Structured exception as reported by the test runner
    #[serde(default)]
    pub exception: Option<serde_json::Value>,
    /// Longer failure details such as a stack trace
    #[serde(default)]
    pub detailed_message: Option<String>,
}

/// The server's verdict on a submission
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Outcome class
    pub status: SubmissionStatus,
    /// Test cases in server order
    #[serde(default)]
    pub test_cases: Vec<TestCaseResult>,
    /// Points awarded
    #[serde(default)]
    pub points: Vec<String>,
    /// Points that still need a code review
    #[serde(default)]
    pub missing_review_points: Vec<String>,
    /// Error text for [`SubmissionStatus::Error`]
    #[serde(default)]
    pub error: Option<String>,
    /// Model solution, available after passing
    #[serde(default)]
    pub solution_url: Option<String>,
    /// Survey questions offered after the submission
    #[serde(default)]
    pub feedback_questions: Vec<FeedbackQuestion>,
    /// Where survey answers are posted
    #[serde(default)]
    pub feedback_answer_url: Option<String>,
}

impl SubmissionResult {
    /// Whether every test passed
    pub fn all_tests_passed(&self) -> bool {
        self.status == SubmissionStatus::AllPassed
    }

    /// Test cases that failed
    pub fn failed_test_cases(&self) -> impl Iterator<Item = &TestCaseResult> {
        self.test_cases.iter().filter(|t| !t.successful)
    }

    /// Classify test cases into [`SubmissionStatus::AllPassed`],
    /// [`SubmissionStatus::SomeFailed`] or [`SubmissionStatus::AllFailed`]
    pub fn status_from_test_cases(test_cases: &[TestCaseResult]) -> SubmissionStatus {
        let passed = test_cases.iter().filter(|t| t.successful).count();
        if test_cases.is_empty() || passed == 0 {
            SubmissionStatus::AllFailed
        } else if passed == test_cases.len() {
            SubmissionStatus::AllPassed
        } else {
            SubmissionStatus::SomeFailed
        }
    }
}
