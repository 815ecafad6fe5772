use crate::constants::{
    DEFAULT_AUTH_FILE, DEFAULT_CONCURRENCY, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_RETRY_MIN_DELAY_MS, DEFAULT_RETRY_STATUSES,
};
use crate::downloader::RetryPolicy;
use crate::errors::{AppError, AppResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved fetch settings with all values filled in (no Options).
///
/// Deserialized from the `[fetch]` table of a run file; every key is optional
/// and falls back to [`FetchConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Maximum number of simultaneous outbound requests
    pub concurrency: usize,
    /// Attempts per HTTP request, including the first one
    pub max_attempts: u32,
    /// Status codes that trigger a retry
    pub retry_statuses: Vec<u16>,
    /// Lower bound of the randomized backoff in milliseconds
    pub retry_min_delay_ms: u64,
    /// Upper bound of the randomized backoff in milliseconds
    pub retry_max_delay_ms: u64,
    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
            retry_min_delay_ms: DEFAULT_RETRY_MIN_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl FetchConfig {
    /// Rejects settings the fetch layer cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.concurrency == 0 {
            return Err(AppError::InvalidInput(
                "Concurrency must be greater than 0".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(AppError::InvalidInput(
                "Max attempts must be greater than 0".into(),
            ));
        }
        if self.retry_min_delay_ms > self.retry_max_delay_ms {
            return Err(AppError::InvalidInput(format!(
                "Retry min delay ({} ms) exceeds max delay ({} ms)",
                self.retry_min_delay_ms, self.retry_max_delay_ms
            )));
        }
        Ok(())
    }

    /// Builds the per-request retry policy described by these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            self.retry_statuses.clone(),
            Duration::from_millis(self.retry_min_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// A complete run description loaded from a TOML file.
///
/// ```toml
/// auth = "auth.json"
/// ids = ["d51abcdc-04fd-40f8-9556-27a7add9a342"]
/// output_dir = "downloads"
///
/// [fetch]
/// concurrency = 4
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunFile {
    /// Path to the auth JSON file (defaults to `auth.json`)
    #[serde(default = "default_auth_path")]
    pub auth: PathBuf,
    /// File identifiers to download, in order
    pub ids: Vec<String>,
    /// Directory the downloaded files are written to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub fetch: FetchConfig,
}

impl RunFile {
    /// Loads and validates a run file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, the TOML is malformed,
    /// `ids` is missing, or unknown keys are present. Returns `InvalidInput` if
    /// the `[fetch]` settings fail validation.
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        let run: RunFile = toml::from_str(&contents)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config: {e}")))?;

        run.fetch.validate()?;
        Ok(run)
    }
}

fn default_auth_path() -> PathBuf {
    PathBuf::from(DEFAULT_AUTH_FILE)
}
