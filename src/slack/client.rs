//! Slack Web API client over reqwest.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::api::SlackApi;
use super::types::{
    ApiStatus, Attachment, AuthIdentity, KickRequest, LeaveRequest, OpenConversationRequest,
    OpenConversationResponse, PostMessageRequest,
};
use crate::config::DEFAULT_API_BASE_URL;
use crate::error::SlackError;

/// Web API client authenticated with a single token.
#[derive(Clone)]
pub struct SlackWebClient {
    client: Client,
    token: SecretString,
    base_url: String,
}

impl std::fmt::Debug for SlackWebClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackWebClient")
            .field("token", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SlackWebClient {
    pub fn new(token: SecretString) -> Self {
        Self {
            client: Client::new(),
            token,
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different API root (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.base_url)
    }

    /// POST a JSON body to `method` and decode the response.
    ///
    /// Slack reports most failures as HTTP 200 with `ok: false`; those become
    /// [`SlackError::Api`] carrying Slack's error code.
    async fn call<B, R>(&self, method: &str, body: &B) -> Result<R, SlackError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.api_url(method))
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| SlackError::Request {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlackError::Status {
                method: method.to_string(),
                status: status.as_u16(),
            });
        }

        let value: serde_json::Value =
            response.json().await.map_err(|e| SlackError::InvalidResponse {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        let api_status: ApiStatus =
            serde_json::from_value(value.clone()).map_err(|e| SlackError::InvalidResponse {
                method: method.to_string(),
                reason: e.to_string(),
            })?;

        if !api_status.ok {
            return Err(SlackError::Api {
                method: method.to_string(),
                error: api_status
                    .error
                    .unwrap_or_else(|| "unknown_error".to_string()),
            });
        }

        serde_json::from_value(value).map_err(|e| SlackError::InvalidResponse {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl SlackApi for SlackWebClient {
    #[instrument(skip(self, text, attachments), fields(channel = %channel))]
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<&[Attachment]>,
    ) -> Result<(), SlackError> {
        let body = PostMessageRequest {
            channel,
            text,
            attachments,
        };
        let _: ApiStatus = self.call("chat.postMessage", &body).await?;
        debug!("Message posted to Slack");
        Ok(())
    }

    #[instrument(skip(self), fields(user = %user_id))]
    async fn open_direct_message(&self, user_id: &str) -> Result<String, SlackError> {
        let body = OpenConversationRequest { users: user_id };
        let opened: OpenConversationResponse = self.call("conversations.open", &body).await?;
        debug!(channel = %opened.channel.id, "Direct message opened");
        Ok(opened.channel.id)
    }

    #[instrument(skip(self), fields(channel = %channel, user = %user_id))]
    async fn remove_user_from_channel(
        &self,
        channel: &str,
        user_id: &str,
    ) -> Result<(), SlackError> {
        let body = KickRequest {
            channel,
            user: user_id,
        };
        let _: ApiStatus = self.call("conversations.kick", &body).await?;
        debug!("User removed from channel");
        Ok(())
    }

    #[instrument(skip(self), fields(channel = %channel))]
    async fn leave_channel(&self, channel: &str) -> Result<(), SlackError> {
        let body = LeaveRequest { channel };
        let _: ApiStatus = self.call("conversations.leave", &body).await?;
        debug!("Left channel");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn test_auth(&self) -> Result<AuthIdentity, SlackError> {
        self.call("auth.test", &serde_json::json!({})).await
    }
}
