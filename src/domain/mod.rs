//! Domain types shared by the protocol client, the services, and the tasks.
//!
//! - [`course`] - Courses and the course listing wrapper
//! - [`exercise`] - Exercise metadata and deadline normalization
//! - [`project`] - Local working copies and zipped archives
//! - [`submission`] - Upload responses and grading results
//! - [`feedback`] - Post-submission survey questions and answers
//! - [`review`] - Human code reviews
//! - [`event`] - Usage events sent to the event log endpoint

mod course;
mod event;
mod exercise;
mod feedback;
mod project;
mod review;
mod submission;

pub use course::{Course, CourseList};
pub use event::LoggableEvent;
pub use exercise::{Exercise, ExerciseList};
pub use feedback::{FeedbackAnswer, FeedbackQuestion};
pub use project::{Project, ProjectStatus, ProjectType, ZippedProject};
pub use review::{Review, ReviewList};
pub use submission::{SubmissionResponse, SubmissionResult, SubmissionStatus, TestCaseResult};
