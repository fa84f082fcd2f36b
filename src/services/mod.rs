//! Operations built on top of the protocol client
//!
//! Each service drives one multi-step workflow. The task layer wraps them to add
//! progress reporting, cancellation checkpoints and UI notification.

mod downloader;
mod feedback;
mod reviews;
mod uploader;

pub use downloader::ProjectDownloader;
pub use feedback::FeedbackAnswerSubmitter;
pub use reviews::ReviewChecker;
pub use uploader::{ProjectUploader, SubmissionPipeline};
