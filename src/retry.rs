//! Retry logic with exponential backoff
//!
//! Result polling waits between requests with exponentially growing, capped,
//! optionally jittered delays. Waits are split into short slices so a
//! [`StopStatus`] flipping to "must stop" ends the wait promptly.
//!
//! # Example
//!
//! ```no_run
//! use tmc_core::config::RetryConfig;
//! use tmc_core::retry::Backoff;
//!
//! let mut backoff = Backoff::new(&RetryConfig::default());
//! let first = backoff.next_delay();
//! let second = backoff.next_delay();
//! assert!(second >= first || RetryConfig::default().jitter);
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use crate::task::StopStatus;
use rand::Rng;
use std::time::Duration;

/// Granularity at which a backoff wait re-checks its stop status
const STOP_CHECK_SLICE: Duration = Duration::from_millis(50);

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, refused connections, HTTP 500) should
/// return `true`. Permanent failures (authentication, obsolete client, malformed
/// responses) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            // The grader may be restarting
            Error::ServerInternal { .. } => true,
            Error::HttpStatus { status, .. } => matches!(status, 502..=504),
            Error::Config { .. }
            | Error::Protocol(_)
            | Error::SubmissionRejected(_)
            | Error::Authentication
            | Error::Unreachable { .. }
            | Error::ObsoleteClient
            | Error::ResultTimeout { .. }
            | Error::Cancelled
            | Error::InvalidProject(_)
            | Error::InvalidState(_)
            | Error::Archive(_)
            | Error::Serialization(_)
            | Error::InvalidUrl(_) => false,
        }
    }
}

/// Exponential backoff state for one polling sequence
#[derive(Debug, Clone)]
pub struct Backoff {
    delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl Backoff {
    /// Start a new sequence at `config.initial_delay`
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            delay: config.initial_delay,
            max_delay: config.max_delay,
            multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }

    /// Delay to wait now; advances the sequence for the next call
    pub fn next_delay(&mut self) -> Duration {
        let current = self.delay;
        // out-of-range products (negative, NaN, overflow) saturate at the cap
        let next = Duration::try_from_secs_f64(current.as_secs_f64() * self.multiplier)
            .unwrap_or(self.max_delay);
        self.delay = next.min(self.max_delay);

        if self.jitter {
            add_jitter(current).min(self.max_delay.max(current))
        } else {
            current
        }
    }
}

/// Sleep for `delay`, returning early with [`Error::Cancelled`] if `stop` asks to stop
pub async fn sleep_unless_stopped(delay: Duration, stop: &dyn StopStatus) -> Result<(), Error> {
    let deadline = tokio::time::Instant::now() + delay;

    loop {
        if stop.must_stop() {
            return Err(Error::Cancelled);
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Ok(());
        }
        tokio::time::sleep((deadline - now).min(STOP_CHECK_SLICE)).await;
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay.
/// This means the actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}
