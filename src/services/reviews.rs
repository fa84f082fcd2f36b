use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::domain::{Course, Review};
use crate::error::Result;
use crate::server::ServerManager;
use crate::ui::IdeUiInvoker;

/// Announces new code reviews and opens them
pub struct ReviewChecker {
    server: Arc<ServerManager>,
    ui: Arc<dyn IdeUiInvoker>,
    announced: Mutex<HashSet<u64>>,
}

impl ReviewChecker {
    /// Checker reporting through `ui`
    pub fn new(server: Arc<ServerManager>, ui: Arc<dyn IdeUiInvoker>) -> Self {
        Self {
            server,
            ui,
            announced: Mutex::new(HashSet::new()),
        }
    }

    /// Fetch the course's reviews and notify about unread ones not announced before
    ///
    /// Returns the newly announced reviews.
    pub async fn check_for_new_reviews(&self, course: &Course) -> Result<Vec<Review>> {
        let reviews = self.server.download_reviews(course).await?;

        let unseen: Vec<Review> = match self.announced.lock() {
            Ok(mut announced) => reviews
                .into_iter()
                .filter(|r| !r.marked_as_read && announced.insert(r.id))
                .collect(),
            Err(_) => Vec::new(),
        };

        debug!(course = %course.name, unseen = unseen.len(), "checked code reviews");
        if !unseen.is_empty() {
            self.ui.invoke_code_review_popup_notification(&unseen);
        }
        Ok(unseen)
    }

    /// Show the review and mark it read on the server
    pub async fn open_review(&self, review: &Review) -> Result<()> {
        self.ui.invoke_code_review_dialog(review);
        if !review.marked_as_read {
            self.server.mark_review_as_read(review).await?;
        }
        Ok(())
    }
}
