//! Logger setup errors

/// Errors raised while installing the global subscriber
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The level directive could not be parsed
    #[error("invalid log filter {0}")]
    Filter(String),

    /// An environment setting has an unusable value
    #[error("invalid log configuration: {0}")]
    Config(String),

    /// A global subscriber is already installed
    #[error("failed to install subscriber: {0}")]
    Init(String),
}

/// Result alias for logger setup
pub type LogResult<T> = Result<T, LogError>;
