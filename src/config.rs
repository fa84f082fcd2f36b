//! Configuration types for tmc-core

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};

/// Client identity sent with every API call as `client=<name>`
pub const CLIENT_NAME: &str = "tmc_core";

/// Protocol version sent with every API call as `api_version=<n>`
pub const API_VERSION: u32 = 7;

/// HTTP transport settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Timeout for a single request, connect through body (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header (default: "tmc-core/<version>")
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Backoff configuration for result polling and transient failures
///
/// `max_attempts` bounds how many times the submission result is polled, so a
/// crashed grader cannot keep a worker busy forever.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of polls/retries (default: 120)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second poll (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between polls (default: 10 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 1.5)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// User and server settings shared read-only by every task
///
/// Built once by the host (usually from a JSON file via [`Settings::from_file`])
/// and shared as `Arc<Settings>`. Nothing in the crate mutates it mid-task.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the TMC server, e.g. "https://tmc.mooc.fi/mooc"
    pub server_url: String,

    /// Account username
    #[serde(default)]
    pub username: String,

    /// Account password
    #[serde(default)]
    pub password: String,

    /// Locale the server should use for error messages (default: "en")
    #[serde(default = "default_locale")]
    pub error_msg_locale: String,

    /// Client name reported to the server
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Client version reported to the server
    #[serde(default = "default_client_version")]
    pub client_version: String,

    /// Directory exercises are unpacked into, one subdirectory per course
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: PathBuf,

    /// HTTP transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Result polling settings
    #[serde(default)]
    pub polling: RetryConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            username: String::new(),
            password: String::new(),
            error_msg_locale: default_locale(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            workspace_dir: default_workspace_dir(),
            http: HttpConfig::default(),
            polling: RetryConfig::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file and validate them
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check that the settings can be used to talk to a server
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(Error::Config {
                message: "server URL is not set".to_string(),
                key: Some("server_url".to_string()),
            });
        }

        let parsed = url::Url::parse(self.server_url.trim()).map_err(|e| Error::Config {
            message: format!("server URL is not valid: {e}"),
            key: Some("server_url".to_string()),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("unsupported URL scheme: {}", parsed.scheme()),
                key: Some("server_url".to_string()),
            });
        }

        if self.polling.max_attempts == 0 {
            return Err(Error::Config {
                message: "polling must allow at least one attempt".to_string(),
                key: Some("polling.max_attempts".to_string()),
            });
        }

        let multiplier = self.polling.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::Config {
                message: format!("backoff multiplier must be a finite number >= 1.0, got {multiplier}"),
                key: Some("polling.backoff_multiplier".to_string()),
            });
        }

        if self.polling.initial_delay > self.polling.max_delay {
            return Err(Error::Config {
                message: format!(
                    "initial poll delay {:?} exceeds max delay {:?}",
                    self.polling.initial_delay, self.polling.max_delay
                ),
                key: Some("polling.initial_delay".to_string()),
            });
        }

        Ok(())
    }

    /// Whether credentials were configured
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("tmc-core/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    120
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(10)
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

fn default_true() -> bool {
    true
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_client_name() -> String {
    CLIENT_NAME.to_string()
}

fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_workspace_dir() -> PathBuf {
    PathBuf::from("./tmc-workspace")
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
