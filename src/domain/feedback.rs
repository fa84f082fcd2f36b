use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{Error, Result};

static INT_RANGE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^intrange\[(-?\d+)\.\.(-?\d+)\]$"));

/// A survey question offered after a submission
///
/// `kind` is either `"text"` or an integer range encoded as `intrange[min..max]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackQuestion {
    /// Server-side question id
    pub id: u64,
    /// Question text
    pub question: String,
    /// `"text"` or `intrange[min..max]`
    pub kind: String,
}

impl FeedbackQuestion {
    /// New question
    pub fn new(id: u64, question: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id,
            question: question.into(),
            kind: kind.into(),
        }
    }

    /// Free-text question
    pub fn is_text(&self) -> bool {
        self.kind == "text"
    }

    /// Integer-range question
    pub fn is_int_range(&self) -> bool {
        self.int_range().is_some()
    }

    /// Lower bound of an integer-range question
    pub fn int_range_min(&self) -> Result<i64> {
        self.int_range()
            .map(|(min, _)| min)
            .ok_or_else(|| self.not_int_range())
    }

    /// Upper bound of an integer-range question
    pub fn int_range_max(&self) -> Result<i64> {
        self.int_range()
            .map(|(_, max)| max)
            .ok_or_else(|| self.not_int_range())
    }

    fn int_range(&self) -> Option<(i64, i64)> {
        let regex = INT_RANGE.as_ref().ok()?;
        let captures = regex.captures(&self.kind)?;
        let min = captures.get(1)?.as_str().parse().ok()?;
        let max = captures.get(2)?.as_str().parse().ok()?;
        Some((min, max))
    }

    fn not_int_range(&self) -> Error {
        Error::InvalidState(format!(
            "feedback question {} is not an integer range (kind: {})",
            self.id, self.kind
        ))
    }
}

/// A user's answer to one question
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackAnswer {
    /// The question being answered
    pub question: FeedbackQuestion,
    /// The answer text, as typed
    pub answer: String,
}

impl FeedbackAnswer {
    /// New answer
    pub fn new(question: FeedbackQuestion, answer: impl Into<String>) -> Self {
        Self {
            question,
            answer: answer.into(),
        }
    }

    /// Non-blank after trimming
    pub fn is_valid(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}
