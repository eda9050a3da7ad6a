//! The Web API operations the bot depends on.

use async_trait::async_trait;

use super::types::{Attachment, AuthIdentity};
use crate::error::SlackError;

/// Remote operations against a Slack workspace, as one account.
///
/// The bot holds two of these: one authenticated as the bot user and one as
/// the operator who installed it.
#[async_trait]
pub trait SlackApi: Send + Sync {
    /// `chat.postMessage`.
    async fn post_message(
        &self,
        channel: &str,
        text: &str,
        attachments: Option<&[Attachment]>,
    ) -> Result<(), SlackError>;

    /// `conversations.open`; returns the DM channel id.
    async fn open_direct_message(&self, user_id: &str) -> Result<String, SlackError>;

    /// `conversations.kick`.
    async fn remove_user_from_channel(&self, channel: &str, user_id: &str)
    -> Result<(), SlackError>;

    /// `conversations.leave`.
    async fn leave_channel(&self, channel: &str) -> Result<(), SlackError>;

    /// `auth.test`; identifies the account behind the token.
    async fn test_auth(&self) -> Result<AuthIdentity, SlackError>;
}
