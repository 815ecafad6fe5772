use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Transport-level failure (DNS, connect, TLS, body read)
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Server answered with a status that is not retried
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },
    /// A retryable status persisted for every allowed attempt
    #[error("HTTP {status} from {url} after {attempts} attempts")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        status: u16,
    },
    /// The retrieve endpoint did not yield a usable pre-signed URL
    #[error("Failed to resolve file '{file_id}': {reason}")]
    ResolutionError { file_id: String, reason: String },
    /// Auth, config or run file could not be loaded
    #[error("Config error: {0}")]
    ConfigError(String),
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
    /// A fetch task panicked or was cancelled
    #[error("Task error: {0}")]
    TaskError(String),
}

// Conversion implementations for common errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::TaskError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
