//! # tmc-core
//!
//! IDE-independent core for submitting programming exercises to a TMC grading server.
//!
//! ## Design Philosophy
//!
//! tmc-core is designed to be:
//! - **Library-first** - No UI of its own; the host implements [`IdeUiInvoker`]
//! - **Non-blocking** - Zipping, uploading and result polling run as background tasks
//! - **Cancellable** - Every task stops cooperatively at its next checkpoint
//! - **Event-driven** - Hosts subscribe to task progress instead of polling
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tmc_core::{Settings, TmcCore};
//! # use tmc_core::ui::IdeUiInvoker;
//! # struct Ui;
//! # impl IdeUiInvoker for Ui {
//! #     fn invoke_test_result_window(&self, _: &[tmc_core::domain::TestCaseResult]) {}
//! #     fn invoke_all_tests_passed_window(&self, _: &tmc_core::domain::SubmissionResult, _: &str) {}
//! #     fn invoke_some_tests_failed_window(&self, _: &tmc_core::domain::SubmissionResult, _: &str) {}
//! #     fn invoke_all_tests_failed_window(&self, _: &tmc_core::domain::SubmissionResult, _: &str) {}
//! #     fn invoke_pastebin_result_dialog(&self, _: &str) {}
//! #     fn invoke_code_review_request_successfully_sent_window(&self) {}
//! #     fn invoke_code_review_dialog(&self, _: &tmc_core::domain::Review) {}
//! #     fn invoke_code_review_popup_notification(&self, _: &[tmc_core::domain::Review]) {}
//! #     fn invoke_message_box(&self, _: &str) {}
//! #     fn raise_visible_exception(&self, _: &str) {}
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings {
//!         server_url: "https://tmc.example.com/mooc".to_string(),
//!         username: "student".to_string(),
//!         password: "secret".to_string(),
//!         ..Default::default()
//!     };
//!     let core = TmcCore::new(settings, Arc::new(Ui))?;
//!
//!     // Subscribe to task events
//!     let mut events = core.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let courses = core.list_courses().await?;
//!     println!("{} courses", courses.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Project zipping and exercise unzipping
pub mod archive;
/// Configuration types
pub mod config;
/// Domain types
pub mod domain;
/// Error types
pub mod error;
/// Composition root
pub mod facade;
/// HTTP transport
pub mod http;
/// File-system access and project scanning
pub mod io;
/// Retry logic with exponential backoff
pub mod retry;
/// Grading server protocol client
pub mod server;
/// Submission, feedback, download and review workflows
pub mod services;
/// Background task execution
pub mod task;
/// Host UI callbacks
pub mod ui;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{HttpConfig, RetryConfig, Settings};
pub use facade::TmcCore;
pub use error::{Error, ErrorKind, Result};
pub use server::ServerManager;
pub use task::{BackgroundTask, TaskEvent, TaskHandle, TaskOutcome, TaskRunner};
pub use ui::IdeUiInvoker;

/// Run until a termination signal arrives, then stop every running task
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(core: &TmcCore) {
    wait_for_signal().await;
    core.shutdown();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // registration may fail in restricted environments
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
