//! Project archives
//!
//! Submissions are uploaded as a zip of the project directory and exercise
//! templates arrive as zips. Which entries are written in either direction is
//! decided by a [`ZipPolicy`] picked once per project:
//!
//! - [`ZipPolicy::AcceptAll`] for a project downloaded for the first time
//! - [`ZipPolicy::Maven`] leaves `target/` and `lib/testrunner/` out of submissions
//! - [`ZipPolicy::Default`] for Ant, Makefile and unknown projects
//!
//! Both non-bootstrap policies refuse to overwrite student sources that already
//! exist locally.

mod policy;
mod unzipper;
mod zipper;

pub use policy::{ZipPolicy, entry_name};
pub use unzipper::ProjectUnzipper;
pub use zipper::ProjectZipper;
