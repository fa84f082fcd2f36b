/// Turns a task outcome into user-visible notifications
///
/// The runner calls `on_begin` once and then exactly one of the terminal callbacks.
pub trait BackgroundTaskListener: Send + Sync {
    /// The task is about to start
    fn on_begin(&self) {}

    /// The task returned [`super::TaskOutcome::Success`]
    fn on_success(&self) {}

    /// The task returned [`super::TaskOutcome::Failure`]
    fn on_failure(&self) {}

    /// The task returned [`super::TaskOutcome::Interrupted`]
    fn on_interruption(&self) {}
}

/// Listener that ignores every outcome
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl BackgroundTaskListener for NoopListener {}
