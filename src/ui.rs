//! Interface to the host IDE's user interface
//!
//! The core never draws anything itself. Task listeners report every
//! user-visible outcome through [`IdeUiInvoker`], which the embedding IDE
//! implements on top of its own dialogs and notification system.

use crate::domain::{Review, SubmissionResult, TestCaseResult};

/// One method per user-visible outcome
///
/// Implementations are called from runtime worker threads and must hand the work
/// over to the IDE's UI thread themselves.
pub trait IdeUiInvoker: Send + Sync {
    /// Show the per-test results of a graded submission
    fn invoke_test_result_window(&self, results: &[TestCaseResult]);

    /// Every test passed
    fn invoke_all_tests_passed_window(&self, result: &SubmissionResult, exercise_name: &str);

    /// Some tests passed, some failed
    fn invoke_some_tests_failed_window(&self, result: &SubmissionResult, exercise_name: &str);

    /// No test passed
    fn invoke_all_tests_failed_window(&self, result: &SubmissionResult, exercise_name: &str);

    /// Show the link to a created paste
    fn invoke_pastebin_result_dialog(&self, paste_url: &str);

    /// Confirm that a code review request went through
    fn invoke_code_review_request_successfully_sent_window(&self);

    /// Show one code review in full
    fn invoke_code_review_dialog(&self, review: &Review);

    /// Tell the user new code reviews are waiting
    fn invoke_code_review_popup_notification(&self, unseen: &[Review]);

    /// Plain informational message
    fn invoke_message_box(&self, message: &str);

    /// Show an error message
    fn raise_visible_exception(&self, message: &str);
}
