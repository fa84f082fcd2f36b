//! Recording UI for asserting what the user would have seen

use std::sync::Mutex;
use tmc_core::IdeUiInvoker;
use tmc_core::domain::{Review, SubmissionResult, TestCaseResult};

/// One UI call, reduced to what tests compare
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Shown {
    TestResults(Vec<String>),
    AllPassed(String),
    SomeFailed(String),
    AllFailed(String),
    Pastebin(String),
    CodeReviewSent,
    Review(u64),
    ReviewPopup(usize),
    Message(String),
    Error(String),
}

/// [`IdeUiInvoker`] that keeps every call in order
#[derive(Default)]
pub struct RecordingUi {
    shown: Mutex<Vec<Shown>>,
}

impl RecordingUi {
    pub fn shown(&self) -> Vec<Shown> {
        self.shown.lock().unwrap().clone()
    }

    fn push(&self, shown: Shown) {
        self.shown.lock().unwrap().push(shown);
    }
}

impl IdeUiInvoker for RecordingUi {
    fn invoke_test_result_window(&self, results: &[TestCaseResult]) {
        self.push(Shown::TestResults(
            results.iter().map(|r| r.name.clone()).collect(),
        ));
    }

    fn invoke_all_tests_passed_window(&self, _result: &SubmissionResult, exercise_name: &str) {
        self.push(Shown::AllPassed(exercise_name.to_string()));
    }

    fn invoke_some_tests_failed_window(&self, _result: &SubmissionResult, exercise_name: &str) {
        self.push(Shown::SomeFailed(exercise_name.to_string()));
    }

    fn invoke_all_tests_failed_window(&self, _result: &SubmissionResult, exercise_name: &str) {
        self.push(Shown::AllFailed(exercise_name.to_string()));
    }

    fn invoke_pastebin_result_dialog(&self, paste_url: &str) {
        self.push(Shown::Pastebin(paste_url.to_string()));
    }

    fn invoke_code_review_request_successfully_sent_window(&self) {
        self.push(Shown::CodeReviewSent);
    }

    fn invoke_code_review_dialog(&self, review: &Review) {
        self.push(Shown::Review(review.id));
    }

    fn invoke_code_review_popup_notification(&self, unseen: &[Review]) {
        self.push(Shown::ReviewPopup(unseen.len()));
    }

    fn invoke_message_box(&self, message: &str) {
        self.push(Shown::Message(message.to_string()));
    }

    fn raise_visible_exception(&self, message: &str) {
        self.push(Shown::Error(message.to_string()));
    }
}
