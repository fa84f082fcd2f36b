use std::sync::Arc;
use tracing::debug;

use crate::domain::FeedbackAnswer;
use crate::error::Result;
use crate::server::ServerManager;

/// Sends post-submission survey answers
pub struct FeedbackAnswerSubmitter {
    server: Arc<ServerManager>,
}

impl FeedbackAnswerSubmitter {
    /// Submitter talking to `server`
    pub fn new(server: Arc<ServerManager>) -> Self {
        Self { server }
    }

    /// Submit `answers` to `answer_url`
    ///
    /// Nothing is sent when the list is empty, the URL is missing or blank, or
    /// every answer is blank; that case returns `Ok(None)`. Otherwise the whole
    /// list goes out in one request and the server's reply is returned.
    pub async fn submit_feedback(
        &self,
        answers: &[FeedbackAnswer],
        answer_url: Option<&str>,
    ) -> Result<Option<String>> {
        let Some(url) = answer_url.filter(|u| !u.trim().is_empty()) else {
            debug!("no feedback URL, skipping");
            return Ok(None);
        };
        if !answers.iter().any(FeedbackAnswer::is_valid) {
            debug!(answers = answers.len(), "no non-blank feedback answers, skipping");
            return Ok(None);
        }

        let reply = self.server.submit_feedback(url, answers).await?;
        Ok(Some(reply))
    }
}
