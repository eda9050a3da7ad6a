//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

/// Port the HTTP server binds to when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 4391;

/// Slack Web API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://slack.com/api";

/// Bot configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Token Slack embeds in every event and action payload.
    pub verification_token: SecretString,
    /// Bot account token (posting messages, opening DMs).
    pub bot_token: SecretString,
    /// Operator account token (identity check, kick, leave).
    pub auth_token: SecretString,
    /// Optional signing secret; when set, request signatures are checked too.
    pub signing_secret: Option<SecretString>,
    /// Base URL for Web API calls.
    pub api_base_url: String,
    /// Listen port.
    pub port: u16,
}

impl BotConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key)
                .map(SecretString::from)
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: "PORT".to_string(),
                    message: e.to_string(),
                })?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            verification_token: require("SLACK_VERIFICATION_TOKEN")?,
            bot_token: require("SLACK_BOT_TOKEN")?,
            auth_token: require("SLACK_AUTH_TOKEN")?,
            signing_secret: get("SLACK_SIGNING_SECRET").map(SecretString::from),
            api_base_url: get("SLACK_API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            port,
        })
    }
}
