use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// An exercise definition as returned by the server
///
/// Identity and URLs are fixed once fetched; the status flags are refreshed after
/// submissions and local scans.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    /// Server-side exercise id
    pub id: u64,

    /// Exercise name, also the name of the project directory
    pub name: String,

    /// Owning course name (filled in by the client after listing)
    #[serde(default)]
    pub course_name: String,

    /// Raw deadline string as sent by the server
    #[serde(default)]
    pub deadline: Option<String>,

    /// Parsed deadline; populated by [`Exercise::finalize_deserialization`]
    #[serde(skip)]
    pub deadline_at: Option<DateTime<FixedOffset>>,

    /// Where the exercise template zip is downloaded from
    #[serde(default, rename = "zip_url")]
    pub download_url: String,

    /// Submission endpoint
    #[serde(default)]
    pub return_url: String,

    /// Where the model solution zip is downloaded from
    #[serde(default, rename = "solution_zip_url")]
    pub solution_download_url: Option<String>,

    /// Server-side checksum of the template; changes when the exercise is updated
    #[serde(default)]
    pub checksum: String,

    /// Exercise is locked for this user
    #[serde(default)]
    pub locked: bool,

    /// User has submitted at least once
    #[serde(default)]
    pub attempted: bool,

    /// User has a fully passing submission
    #[serde(default)]
    pub completed: bool,

    /// A code review has been written
    #[serde(default)]
    pub reviewed: bool,

    /// Exercise accepts submissions
    #[serde(default = "default_returnable")]
    pub returnable: bool,
}

fn default_returnable() -> bool {
    true
}

impl Exercise {
    /// Parse `deadline` into `deadline_at`
    ///
    /// The server sends RFC 3339 timestamps; anything else leaves the exercise
    /// without a deadline.
    pub fn finalize_deserialization(&mut self) {
        self.deadline_at = self
            .deadline
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw.trim()).ok());
        if self.deadline.is_some() && self.deadline_at.is_none() {
            tracing::debug!(exercise = %self.name, deadline = ?self.deadline, "unparsable deadline");
        }
    }

    /// Whether the deadline is set and already passed at `now`
    pub fn has_deadline_passed_at(&self, now: DateTime<Utc>) -> bool {
        self.deadline_at.is_some_and(|deadline| deadline < now)
    }

    /// Whether the deadline has passed now
    pub fn has_deadline_passed(&self) -> bool {
        self.has_deadline_passed_at(Utc::now())
    }
}

/// `{ "exercises": [...] }`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExerciseList {
    #[serde(default)]
    exercises: Option<Vec<Exercise>>,
}

impl ExerciseList {
    /// Unwrap into the listed exercises
    pub fn into_exercises(self) -> Vec<Exercise> {
        self.exercises.unwrap_or_default()
    }
}
