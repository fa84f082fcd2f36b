use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A usage event recorded by the IDE and shipped in batches to the course's event log URL
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoggableEvent {
    /// Course the event belongs to
    pub course_name: String,
    /// Exercise the event belongs to
    pub exercise_name: String,
    /// Event type, e.g. `"text_insert"` or `"project_action"`
    pub event_type: String,
    /// Opaque payload, base64 on the wire
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// Free-form JSON metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Wall-clock time in milliseconds since the epoch
    pub happened_at: i64,
    /// Monotonic nanosecond counter, only comparable within one client session
    pub system_nano_time: u64,
}

impl LoggableEvent {
    /// Event stamped with the current time
    pub fn new(
        course_name: impl Into<String>,
        exercise_name: impl Into<String>,
        event_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            course_name: course_name.into(),
            exercise_name: exercise_name.into(),
            event_type: event_type.into(),
            data,
            metadata: None,
            happened_at: Utc::now().timestamp_millis(),
            system_nano_time: crate::server::monotonic_nanos(),
        }
    }

    /// When the event happened
    pub fn happened_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.happened_at)
    }
}

mod base64_bytes {
    use super::*;

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}
