//! Normalizes the grader's result JSON into a [`SubmissionResult`]
//!
//! The server answers a result poll with one of several shapes:
//!
//! - `{"status": "processing", ...}` while the grader is still running
//! - `{"status": "ok" | "fail", "test_cases": [...], "all_tests_passed": ..., ...}`
//! - `{"status": "error", "error": "..."}` when grading itself failed
//!
//! Anything else, including bodies that are not JSON, becomes
//! [`SubmissionStatus::Error`] so callers never have to handle a parse failure.

use serde::Deserialize;
use tracing::warn;

use crate::domain::{FeedbackQuestion, SubmissionResult, SubmissionStatus, TestCaseResult};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawResult {
    status: Option<String>,
    error: Option<String>,
    all_tests_passed: Option<bool>,
    test_cases: Vec<TestCaseResult>,
    points: Vec<String>,
    missing_review_points: Vec<String>,
    solution_url: Option<String>,
    feedback_questions: Vec<FeedbackQuestion>,
    feedback_answer_url: Option<String>,
}

/// Parse a result-poll body; never fails
pub fn parse_submission_result(body: &str) -> SubmissionResult {
    let raw: RawResult = match serde_json::from_str(body) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "malformed submission result");
            return error_result(format!("Malformed submission result from server: {e}"));
        }
    };

    let status = match raw.status.as_deref() {
        Some("processing") => SubmissionStatus::Pending,
        Some("error") => {
            let message = raw
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "The server reported an error while grading.".to_string());
            return error_result(message);
        }
        Some(outcome @ ("ok" | "fail")) => classify(outcome, raw.all_tests_passed, &raw.test_cases),
        other => {
            warn!(status = ?other, "unknown submission status");
            return error_result(format!(
                "Unknown submission status from server: {}",
                other.unwrap_or("<missing>")
            ));
        }
    };

    SubmissionResult {
        status,
        test_cases: raw.test_cases,
        points: raw.points,
        missing_review_points: raw.missing_review_points,
        error: raw.error,
        solution_url: raw.solution_url,
        feedback_questions: raw.feedback_questions,
        feedback_answer_url: raw.feedback_answer_url,
    }
}

fn classify(outcome: &str, all_tests_passed: Option<bool>, cases: &[TestCaseResult]) -> SubmissionStatus {
    if cases.is_empty() {
        // compile errors and similar come back as "fail" with no test cases
        return if outcome == "ok" && all_tests_passed.unwrap_or(true) {
            SubmissionStatus::AllPassed
        } else {
            SubmissionStatus::AllFailed
        };
    }

    match SubmissionResult::status_from_test_cases(cases) {
        SubmissionStatus::AllPassed if outcome == "fail" || all_tests_passed == Some(false) => {
            SubmissionStatus::SomeFailed
        }
        status => status,
    }
}

fn error_result(message: String) -> SubmissionResult {
    SubmissionResult {
        status: SubmissionStatus::Error,
        error: Some(message),
        ..SubmissionResult::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_is_pending() {
        let result = parse_submission_result(r#"{"status":"processing","sandbox_status":"created"}"#);
        assert_eq!(result.status, SubmissionStatus::Pending);
        assert!(!result.status.is_terminal());
    }

    #[test]
    fn ok_with_all_passing_cases() {
        let result = parse_submission_result(
            r#"{"status":"ok","all_tests_passed":true,
                "test_cases":[{"name":"A a","successful":true},{"name":"A b","successful":true}],
                "points":["1.1"],
                "feedback_questions":[{"id":1,"question":"Fun?","kind":"intrange[1..5]"}],
                "feedback_answer_url":"https://tmc.example.com/submissions/1/feedback"}"#,
        );

        assert_eq!(result.status, SubmissionStatus::AllPassed);
        assert_eq!(result.points, vec!["1.1"]);
        assert_eq!(result.feedback_questions.len(), 1);
        assert!(result.feedback_questions[0].is_int_range());
    }

    #[test]
    fn fail_with_mixed_cases_is_some_failed() {
        let result = parse_submission_result(
            r#"{"status":"fail","all_tests_passed":false,
                "test_cases":[{"name":"A a","successful":true},
                              {"name":"A b","successful":false,"message":"expected 1",
                               "exception":{"className":"AssertionError"}}]}"#,
        );

        assert_eq!(result.status, SubmissionStatus::SomeFailed);
        let failed: Vec<_> = result.failed_test_cases().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].message.as_deref(), Some("expected 1"));
        assert!(failed[0].exception.is_some());
    }

    #[test]
    fn fail_with_only_failing_cases_is_all_failed() {
        let result = parse_submission_result(
            r#"{"status":"fail","test_cases":[{"name":"A a","successful":false}]}"#,
        );
        assert_eq!(result.status, SubmissionStatus::AllFailed);
    }

    #[test]
    fn fail_without_cases_is_all_failed() {
        let result = parse_submission_result(r#"{"status":"fail","test_cases":[]}"#);
        assert_eq!(result.status, SubmissionStatus::AllFailed);
    }

    #[test]
    fn fail_with_passing_cases_is_some_failed() {
        let result = parse_submission_result(
            r#"{"status":"fail","test_cases":[{"name":"A a","successful":true}]}"#,
        );
        assert_eq!(result.status, SubmissionStatus::SomeFailed);
    }

    #[test]
    fn error_status_carries_server_text() {
        let result = parse_submission_result(r#"{"status":"error","error":"Compilation failed"}"#);
        assert_eq!(result.status, SubmissionStatus::Error);
        assert_eq!(result.error.as_deref(), Some("Compilation failed"));
    }

    #[test]
    fn unknown_and_malformed_bodies_are_errors() {
        for body in [r#"{"status":"weird"}"#, r#"{}"#, "<html>", r#"{"status":"ok","test_cases":7}"#] {
            let result = parse_submission_result(body);
            assert_eq!(result.status, SubmissionStatus::Error, "body: {body}");
            assert!(result.error.is_some());
        }
    }
}
