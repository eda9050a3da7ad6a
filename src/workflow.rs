//! Workflow handler: reacts to Slack events and button clicks.
//!
//! Three reactions:
//! - `reaction_added`: echo the emoji back into the channel.
//! - `member_joined_channel`: remember the channel and DM the onboarding
//!   question.
//! - `emoji` button click: replace the question with a verdict and, on
//!   "no", remove the user from the channel they joined.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::SlackError;
use crate::identity::IdentityTracker;
use crate::onboarding::{YES_VALUE, build_onboarding_message};
use crate::slack::{
    ActionPayload, MemberJoinedChannelEvent, ReactionAddedEvent, SlackApi, SlackEvent,
};

/// Replacement text when the user declines.
pub const DECLINED_TEXT: &str = "Yikes :stuck_out_tongue_winking_eye:";

/// Replacement text when the user accepts.
pub fn accepted_text(display_name: &str) -> String {
    format!("Good choice, {display_name} :relieved:")
}

/// Remote moderation step that follows a "no".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationCommand {
    /// The operator cannot kick themselves, so they leave instead.
    Leave { channel: String },
    Remove { channel: String, user: String },
}

/// Copy `original` with its text replaced and its attachments dropped.
///
/// A non-object original (absent, null) starts from an empty message.
pub fn replacement_message(original: &Value, text: impl Into<String>) -> Value {
    let mut message = match original {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    message.insert("text".to_string(), Value::String(text.into()));
    message.remove("attachments");
    Value::Object(message)
}

/// Decide the response to an onboarding button click.
///
/// `registered_channel` is the channel the acting user first joined, and
/// `is_operator` whether they are the authorized identity.
pub fn decide_moderation(
    payload: &ActionPayload,
    registered_channel: Option<String>,
    is_operator: bool,
) -> (Value, Option<ModerationCommand>) {
    if payload.first_value() == Some(YES_VALUE) {
        let text = accepted_text(&payload.user.name);
        return (replacement_message(&payload.original_message, text), None);
    }

    let replacement = replacement_message(&payload.original_message, DECLINED_TEXT);
    let command = registered_channel.map(|channel| {
        if is_operator {
            ModerationCommand::Leave { channel }
        } else {
            ModerationCommand::Remove {
                channel,
                user: payload.user.id.clone(),
            }
        }
    });
    (replacement, command)
}

/// Runs the bot's reactions against two Slack accounts: the bot user for
/// messaging and the operator for moderation.
pub struct WorkflowHandler {
    identities: Arc<IdentityTracker>,
    bot: Arc<dyn SlackApi>,
    operator: Arc<dyn SlackApi>,
}

impl WorkflowHandler {
    pub fn new(
        identities: Arc<IdentityTracker>,
        bot: Arc<dyn SlackApi>,
        operator: Arc<dyn SlackApi>,
    ) -> Self {
        Self {
            identities,
            bot,
            operator,
        }
    }

    pub fn identities(&self) -> &Arc<IdentityTracker> {
        &self.identities
    }

    /// Run the reaction for `event` in the background.
    ///
    /// Returns `None` for events the bot does not handle. Failures are logged
    /// inside the task and also come back through the handle.
    pub fn spawn_event(
        self: &Arc<Self>,
        event: SlackEvent,
    ) -> Option<JoinHandle<Result<(), SlackError>>> {
        let handler = Arc::clone(self);
        match event {
            SlackEvent::ReactionAdded(event) => Some(tokio::spawn(async move {
                handler.on_reaction_added(&event).await
            })),
            SlackEvent::MemberJoinedChannel(event) => Some(tokio::spawn(async move {
                handler.on_member_joined(&event).await
            })),
            SlackEvent::Unsupported => {
                debug!("Ignoring unsupported event");
                None
            }
        }
    }

    /// Post the reacted emoji back to the channel.
    pub async fn on_reaction_added(&self, event: &ReactionAddedEvent) -> Result<(), SlackError> {
        let Some(channel) = event.item.channel.as_deref() else {
            debug!(reaction = %event.reaction, "Reaction on an item without a channel");
            return Ok(());
        };

        let text = format!(":{}:", event.reaction);
        self.bot
            .post_message(channel, &text, None)
            .await
            .inspect_err(|e| {
                error!(error = %e, channel = %channel, "Failed to echo reaction");
            })
    }

    /// Register the join and send the onboarding DM.
    ///
    /// The DM goes out on every join, even when the user is already
    /// registered from an earlier one.
    pub async fn on_member_joined(
        &self,
        event: &MemberJoinedChannelEvent,
    ) -> Result<(), SlackError> {
        let first = self
            .identities
            .register_first_join(&event.user, &event.channel)
            .await;
        info!(user = %event.user, channel = %event.channel, first, "Member joined");

        let dm = self
            .bot
            .open_direct_message(&event.user)
            .await
            .inspect_err(|e| {
                error!(error = %e, user = %event.user, "Failed to open direct message");
            })?;

        let attachments = build_onboarding_message();
        self.bot
            .post_message(&dm, "", Some(&attachments))
            .await
            .inspect_err(|e| {
                error!(
                    error = %e,
                    user = %event.user,
                    channel = %dm,
                    "Failed to send onboarding message"
                );
            })
    }

    /// Answer an onboarding button click.
    ///
    /// The replacement message is decided before any remote call; a
    /// moderation call, if needed, runs on a spawned task that is not awaited
    /// here. Its handle is returned so callers can observe the outcome.
    pub async fn on_emoji_action(
        &self,
        payload: &ActionPayload,
    ) -> (Value, Option<JoinHandle<Result<(), SlackError>>>) {
        let registered = self.identities.lookup_channel(&payload.user.id).await;
        let is_operator = self.identities.is_authorized(&payload.user.id).await;
        let (replacement, command) = decide_moderation(payload, registered, is_operator);

        info!(
            user = %payload.user.id,
            choice = payload.first_value().unwrap_or_default(),
            command = ?command,
            "Onboarding choice received"
        );

        let task = command.map(|command| {
            let operator = Arc::clone(&self.operator);
            tokio::spawn(async move { execute_moderation(operator.as_ref(), &command).await })
        });

        (replacement, task)
    }
}

/// Carry out a moderation command with the operator's account.
pub async fn execute_moderation(
    operator: &dyn SlackApi,
    command: &ModerationCommand,
) -> Result<(), SlackError> {
    let result = match command {
        ModerationCommand::Leave { channel } => operator.leave_channel(channel).await,
        ModerationCommand::Remove { channel, user } => {
            operator.remove_user_from_channel(channel, user).await
        }
    };

    match &result {
        Ok(()) => info!(command = ?command, "Moderation applied"),
        Err(e) => error!(error = %e, command = ?command, "Moderation failed"),
    }
    result
}
