use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

/// A code review written by course staff
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Server-side review id
    pub id: u64,
    /// Reviewed submission
    pub submission_id: u64,
    /// Name of the reviewed exercise
    pub exercise_name: String,
    /// Whether the user has opened the review
    #[serde(default)]
    pub marked_as_read: bool,
    /// Reviewer display name
    #[serde(default)]
    pub reviewer_name: String,
    /// Review text
    #[serde(default)]
    pub review_body: String,
    /// Points granted by the review
    #[serde(default)]
    pub points: Vec<String>,
    /// Review points that were not granted
    #[serde(default)]
    pub points_not_awarded: Vec<String>,
    /// Web page for the review
    #[serde(default)]
    pub url: String,
    /// Endpoint used to mark the review read
    #[serde(default)]
    pub update_url: String,
    /// Creation time
    #[serde(default, deserialize_with = "deserialize_review_date")]
    pub created_at: Option<DateTime<FixedOffset>>,
    /// Last update time
    #[serde(default, deserialize_with = "deserialize_review_date")]
    pub updated_at: Option<DateTime<FixedOffset>>,
}

/// `{ "reviews": [...] }`
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReviewList {
    #[serde(default)]
    reviews: Option<Vec<Review>>,
}

impl ReviewList {
    /// Unwrap into the listed reviews
    pub fn into_reviews(self) -> Vec<Review> {
        self.reviews.unwrap_or_default()
    }
}

/// Review timestamps come as RFC 3339 or as `2013-04-15T12:01:02+0300`
pub(crate) fn parse_review_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%#z"))
        .ok()
}

fn deserialize_review_date<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_review_date))
}
