//! Error types for emojibot.

/// Errors that stop the bot from starting or serving.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the Slack Web API.
#[derive(Debug, thiserror::Error)]
pub enum SlackError {
    #[error("Slack request to {method} failed: {reason}")]
    Request { method: String, reason: String },

    #[error("Slack {method} returned HTTP {status}")]
    Status { method: String, status: u16 },

    #[error("Slack {method} returned error: {error}")]
    Api { method: String, error: String },

    #[error("Invalid response from Slack {method}: {reason}")]
    InvalidResponse { method: String, reason: String },
}

/// Inbound request verification failures.
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Verification token mismatch")]
    TokenMismatch,

    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Invalid request timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Request timestamp is {age_secs}s away from now")]
    StaleTimestamp { age_secs: i64 },

    #[error("Signature mismatch")]
    SignatureMismatch,
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
