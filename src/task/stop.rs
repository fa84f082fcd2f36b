use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// A pollable "must stop" signal handed into long-running calls
///
/// Checked between blocking sub-operations, never used to interrupt one in flight.
pub trait StopStatus: Send + Sync {
    /// Whether the operation should stop at the next checkpoint
    fn must_stop(&self) -> bool;
}

impl<F> StopStatus for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn must_stop(&self) -> bool {
        self()
    }
}

/// Cancellation token with an optional deadline
///
/// Clones share the same cancellation state. A child token is cancelled with its
/// parent but can also be cancelled on its own.
#[derive(Clone, Debug, Default)]
pub struct StopToken {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl StopToken {
    /// Token that only stops when cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Same token that additionally stops once `deadline` has passed
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Request a stop; never blocks
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether [`StopToken::cancel`] was called on this token or a parent
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token cancelled together with this one
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }
}

impl StopStatus for StopToken {
    fn must_stop(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
