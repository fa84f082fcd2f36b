//! Error types for tmc-core
//!
//! This module provides error handling for the library, including:
//! - A single crate-wide [`Error`] enum with contextual variants
//! - The coarse [`ErrorKind`] taxonomy the task layer reacts to
//! - Mapping of failed HTTP responses (403/404/500, obsolete client) to typed errors
//! - Single-line user-facing messages for every failure

use thiserror::Error;

/// Result type alias for tmc-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when the server rejects the credentials
pub const AUTHENTICATION_FAILED_MESSAGE: &str =
    "Authentication failed - check your username and password.";

/// Message shown when the server cannot be reached or the resource does not exist
pub const UNREACHABLE_MESSAGE: &str =
    "Could not connect to server - check your TMC server address.";

/// Message shown for HTTP 500 responses
pub const SERVER_INTERNAL_MESSAGE: &str =
    "An internal server error occurred. Please try again later.";

/// Message shown when the server reports that this client version is no longer supported
pub const OBSOLETE_CLIENT_MESSAGE: &str =
    "This version of the TMC client is no longer supported by the server. Please update the plugin.";

/// Main error type for tmc-core
///
/// Each variant carries enough context to build a user-visible message via
/// [`Error::user_message`]. Callers that need to branch on the failure class
/// should match on [`Error::kind`] instead of individual variants.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "server_url")
        key: Option<String>,
    },

    /// Connection or transport-level HTTP failure
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response had an unexpected shape or was missing a required field
    #[error("unexpected server response: {0}")]
    Protocol(String),

    /// Server answered an upload with an `error` field
    #[error("server responded with error: {0}")]
    SubmissionRejected(String),

    /// HTTP 403
    #[error("authentication failed")]
    Authentication,

    /// HTTP 404 without the obsolete-client marker
    #[error("server unreachable or resource not found: {url}")]
    Unreachable {
        /// The URL that produced the 404
        url: String,
    },

    /// HTTP 404 whose body carries `"obsolete_client": true`
    #[error("client version is obsolete")]
    ObsoleteClient,

    /// HTTP 500
    #[error("internal server error at {url}")]
    ServerInternal {
        /// The URL that produced the 500
        url: String,
    },

    /// Any other non-2xx status
    #[error("server responded with HTTP {status}")]
    HttpStatus {
        /// Raw status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Result polling gave up before the grader produced a verdict
    #[error("no submission result after {polls} polls")]
    ResultTimeout {
        /// Number of polls performed
        polls: u32,
    },

    /// User-requested stop
    #[error("operation cancelled")]
    Cancelled,

    /// Project cannot be zipped or submitted (no root, no exercise, ...)
    #[error("invalid project: {0}")]
    InvalidProject(String),

    /// Operation called in a state that does not allow it
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Zip archive could not be read or written
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL could not be parsed
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Coarse failure classes used by callers to decide how to react
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection/IO failure talking to the server
    Transport,
    /// Malformed or unexpected response shape
    Protocol,
    /// 403
    Authentication,
    /// 404 without obsolete-client marker
    NotFound,
    /// 404 with `obsolete_client: true`
    ObsoleteClient,
    /// 500
    ServerInternal,
    /// Other non-2xx status
    HttpStatus,
    /// Result polling used up its budget
    Timeout,
    /// User-requested stop
    Cancelled,
    /// Local failure (configuration, file system, archive, state)
    Local,
}

impl Error {
    /// Classify this error into the [`ErrorKind`] taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Transport,
            Error::ResultTimeout { .. } => ErrorKind::Timeout,
            Error::Protocol(_)
            | Error::SubmissionRejected(_)
            | Error::Serialization(_)
            | Error::InvalidUrl(_) => ErrorKind::Protocol,
            Error::Authentication => ErrorKind::Authentication,
            Error::Unreachable { .. } => ErrorKind::NotFound,
            Error::ObsoleteClient => ErrorKind::ObsoleteClient,
            Error::ServerInternal { .. } => ErrorKind::ServerInternal,
            Error::HttpStatus { .. } => ErrorKind::HttpStatus,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Config { .. }
            | Error::InvalidProject(_)
            | Error::InvalidState(_)
            | Error::Io(_)
            | Error::Archive(_) => ErrorKind::Local,
        }
    }

    /// Whether this error was caused by a user-requested stop
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Whether listing operations may swallow this error and show nothing instead
    pub fn is_soft_listing_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Protocol)
    }

    /// Single-line message suitable for showing to the user
    ///
    /// Server status failures use fixed wording; everything else falls back to the
    /// `Display` text so the underlying cause stays visible.
    pub fn user_message(&self) -> String {
        match self {
            Error::Authentication => AUTHENTICATION_FAILED_MESSAGE.to_string(),
            Error::Unreachable { .. } => UNREACHABLE_MESSAGE.to_string(),
            Error::ServerInternal { .. } => SERVER_INTERNAL_MESSAGE.to_string(),
            Error::ObsoleteClient => OBSOLETE_CLIENT_MESSAGE.to_string(),
            Error::HttpStatus { status, .. } => {
                format!("An error occurred. Server responded with HTTP {status}.")
            }
            other => other.to_string(),
        }
    }

    /// Build the message for a failed operation, prefixed with `context`
    ///
    /// An obsolete client overrides the context entirely: the user must update
    /// before anything else can work.
    pub fn failure_message(&self, context: &str) -> String {
        match self {
            Error::ObsoleteClient => self.user_message(),
            other => format!("{context}:\n{}", other.user_message()),
        }
    }

    /// Map a non-2xx HTTP response to a typed error
    ///
    /// 403 → [`Error::Authentication`], 404 → [`Error::ObsoleteClient`] when the body
    /// carries `"obsolete_client": true` and [`Error::Unreachable`] otherwise,
    /// 500 → [`Error::ServerInternal`], anything else → [`Error::HttpStatus`].
    pub fn from_status(status: u16, url: &str, body: String) -> Self {
        match status {
            403 => Error::Authentication,
            404 if body_marks_obsolete_client(&body) => Error::ObsoleteClient,
            404 => Error::Unreachable {
                url: url.to_string(),
            },
            500 => Error::ServerInternal {
                url: url.to_string(),
            },
            status => Error::HttpStatus { status, body },
        }
    }
}

fn body_marks_obsolete_client(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("obsolete_client").and_then(|o| o.as_bool()))
        .unwrap_or(false)
}
