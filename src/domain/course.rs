use serde::{Deserialize, Serialize};

use super::Exercise;

/// A course as listed by `GET /courses`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Server-side course id
    pub id: u64,

    /// Short machine name, also used as the workspace subdirectory
    pub name: String,

    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,

    /// Endpoint returning the course's code reviews
    #[serde(default)]
    pub reviews_url: Option<String>,

    /// Endpoints accepting usage event logs
    #[serde(default)]
    pub spyware_urls: Vec<String>,

    /// Exercises, when the listing embeds them
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

/// `{ "courses": [...] }`
///
/// A `null` or missing list decodes to an empty one.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CourseList {
    #[serde(default)]
    courses: Option<Vec<Course>>,
}

impl CourseList {
    /// Unwrap into the listed courses
    pub fn into_courses(self) -> Vec<Course> {
        self.courses.unwrap_or_default()
    }
}
