//! Shared fixtures for unit tests

use std::sync::Mutex;

use crate::domain::{Review, SubmissionResult, TestCaseResult};
use crate::ui::IdeUiInvoker;

/// One recorded UI call
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum UiCall {
    TestResults(usize),
    AllPassed(String),
    SomeFailed(String),
    AllFailed(String),
    PastebinResult(String),
    CodeReviewSent,
    CodeReviewDialog(u64),
    CodeReviewPopup(Vec<u64>),
    MessageBox(String),
    Error(String),
}

/// [`IdeUiInvoker`] that records every call in order
#[derive(Default)]
pub(crate) struct RecordingUi {
    calls: Mutex<Vec<UiCall>>,
}

impl RecordingUi {
    pub(crate) fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Error(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: UiCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl IdeUiInvoker for RecordingUi {
    fn invoke_test_result_window(&self, results: &[TestCaseResult]) {
        self.record(UiCall::TestResults(results.len()));
    }

    fn invoke_all_tests_passed_window(&self, _result: &SubmissionResult, exercise_name: &str) {
        self.record(UiCall::AllPassed(exercise_name.to_string()));
    }

    fn invoke_some_tests_failed_window(&self, _result: &SubmissionResult, exercise_name: &str) {
        self.record(UiCall::SomeFailed(exercise_name.to_string()));
    }

    fn invoke_all_tests_failed_window(&self, _result: &SubmissionResult, exercise_name: &str) {
        self.record(UiCall::AllFailed(exercise_name.to_string()));
    }

    fn invoke_pastebin_result_dialog(&self, paste_url: &str) {
        self.record(UiCall::PastebinResult(paste_url.to_string()));
    }

    fn invoke_code_review_request_successfully_sent_window(&self) {
        self.record(UiCall::CodeReviewSent);
    }

    fn invoke_code_review_dialog(&self, review: &Review) {
        self.record(UiCall::CodeReviewDialog(review.id));
    }

    fn invoke_code_review_popup_notification(&self, unseen: &[Review]) {
        self.record(UiCall::CodeReviewPopup(unseen.iter().map(|r| r.id).collect()));
    }

    fn invoke_message_box(&self, message: &str) {
        self.record(UiCall::MessageBox(message.to_string()));
    }

    fn raise_visible_exception(&self, message: &str) {
        self.record(UiCall::Error(message.to_string()));
    }
}

/// Matches requests whose raw body contains `needle`, for bodies that are not UTF-8
pub(crate) struct BodyContainsBytes(pub(crate) &'static [u8]);

impl wiremock::Match for BodyContainsBytes {
    fn matches(&self, request: &wiremock::Request) -> bool {
        request
            .body
            .windows(self.0.len())
            .any(|window| window == self.0)
    }
}
