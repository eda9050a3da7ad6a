//! Slack wire types: inbound events, interactive payloads, legacy
//! message attachments and Web API request/response bodies.
//!
//! See: <https://api.slack.com/events-api> and
//! <https://api.slack.com/legacy/interactive-messages>

use serde::{Deserialize, Serialize};

// ── Events API ──────────────────────────────────────────────────────────

/// Outer envelope of an Events API request.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    /// `url_verification`, `event_callback`, ...
    #[serde(rename = "type")]
    pub kind: String,
    /// Verification token.
    #[serde(default)]
    pub token: String,
    /// Present on `url_verification`.
    pub challenge: Option<String>,
    /// Present on `event_callback`.
    pub event: Option<serde_json::Value>,
}

/// Inner event of an `event_callback`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    ReactionAdded(ReactionAddedEvent),
    MemberJoinedChannel(MemberJoinedChannelEvent),
    /// Anything this bot does not subscribe to.
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReactionAddedEvent {
    /// Emoji shortcode without colons, e.g. `tada`.
    pub reaction: String,
    pub item: ReactionItem,
}

/// The item a reaction was attached to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReactionItem {
    /// Missing for reactions on files and file comments.
    pub channel: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberJoinedChannelEvent {
    pub user: String,
    pub channel: String,
}

// ── Interactive messages ────────────────────────────────────────────────

/// Form body of an interactive-message request: a single `payload` field
/// carrying JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionForm {
    pub payload: String,
}

/// Decoded interactive-message callback.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionPayload {
    #[serde(default)]
    pub token: String,
    pub callback_id: String,
    pub user: ActionUser,
    #[serde(default)]
    pub actions: Vec<ActionValue>,
    /// The message the buttons were attached to, echoed back by Slack.
    #[serde(default)]
    pub original_message: serde_json::Value,
}

impl ActionPayload {
    /// Value of the first action, if any.
    pub fn first_value(&self) -> Option<&str> {
        self.actions.first().and_then(|a| a.value.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActionValue {
    pub value: Option<String>,
}

// ── Legacy attachments ──────────────────────────────────────────────────

/// A legacy message attachment with interactive buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<AttachmentAction>,
}

/// A button inside an attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentAction {
    pub name: String,
    pub text: String,
    #[serde(rename = "type")]
    pub action_type: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirm: Option<Confirmation>,
}

/// Confirmation dialog shown before a button's action fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub title: String,
    pub text: String,
    pub ok_text: String,
    pub dismiss_text: String,
}

// ── Web API bodies ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PostMessageRequest<'a> {
    pub channel: &'a str,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<&'a [Attachment]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OpenConversationRequest<'a> {
    pub users: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct KickRequest<'a> {
    pub channel: &'a str,
    pub user: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaveRequest<'a> {
    pub channel: &'a str,
}

/// Fields shared by every Web API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    pub ok: bool,
    pub error: Option<String>,
}

/// `conversations.open` response body.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenConversationResponse {
    pub channel: ChannelRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelRef {
    pub id: String,
}

/// `auth.test` response body.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthIdentity {
    pub user_id: String,
    pub user: Option<String>,
    pub team: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_event_parses() {
        let json = serde_json::json!({
            "type": "reaction_added",
            "user": "U1",
            "reaction": "tada",
            "item": {"type": "message", "channel": "C1", "ts": "1.2"},
            "event_ts": "1.3"
        });
        let event: SlackEvent = serde_json::from_value(json).unwrap();
        assert_eq!(
            event,
            SlackEvent::ReactionAdded(ReactionAddedEvent {
                reaction: "tada".into(),
                item: ReactionItem {
                    channel: Some("C1".into())
                },
            })
        );
    }

    #[test]
    fn join_event_parses() {
        let json = serde_json::json!({
            "type": "member_joined_channel",
            "user": "U1",
            "channel": "C1",
            "channel_type": "C"
        });
        let event: SlackEvent = serde_json::from_value(json).unwrap();
        assert_eq!(
            event,
            SlackEvent::MemberJoinedChannel(MemberJoinedChannelEvent {
                user: "U1".into(),
                channel: "C1".into(),
            })
        );
    }

    #[test]
    fn other_events_are_unsupported() {
        let json = serde_json::json!({"type": "message", "text": "hi"});
        let event: SlackEvent = serde_json::from_value(json).unwrap();
        assert_eq!(event, SlackEvent::Unsupported);
    }

    #[test]
    fn action_payload_first_value() {
        let json = serde_json::json!({
            "token": "t",
            "callback_id": "emoji",
            "user": {"id": "U1", "name": "alice"},
            "actions": [{"name": "no", "type": "button", "value": "no"}],
            "original_message": {"text": "", "attachments": []}
        });
        let payload: ActionPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.first_value(), Some("no"));
        assert_eq!(payload.user.name, "alice");
    }

    #[test]
    fn action_payload_without_actions() {
        let json = serde_json::json!({
            "callback_id": "emoji",
            "user": {"id": "U1"}
        });
        let payload: ActionPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.first_value(), None);
        assert!(payload.original_message.is_null());
    }

    #[test]
    fn post_message_omits_missing_attachments() {
        let body = PostMessageRequest {
            channel: "C1",
            text: ":tada:",
            attachments: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"channel": "C1", "text": ":tada:"}));
    }
}
