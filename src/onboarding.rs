//! The onboarding message sent to every member who joins a channel.

use crate::slack::{Attachment, AttachmentAction, Confirmation};

/// Callback id Slack echoes back when a button on the onboarding message is
/// clicked.
pub const ONBOARDING_CALLBACK_ID: &str = "emoji";

pub const YES_VALUE: &str = "yes";
pub const NO_VALUE: &str = "no";

/// Build the onboarding attachments: a question with a "yes" button and a
/// "no" button guarded by a confirmation dialog.
pub fn build_onboarding_message() -> Vec<Attachment> {
    vec![Attachment {
        text: "Do you like emoji?".to_string(),
        color: Some("#ffc211".to_string()),
        attachment_type: Some("default".to_string()),
        callback_id: Some(ONBOARDING_CALLBACK_ID.to_string()),
        actions: vec![
            AttachmentAction {
                name: YES_VALUE.to_string(),
                text: "Yes :thumbsup:".to_string(),
                action_type: "button".to_string(),
                value: YES_VALUE.to_string(),
                style: None,
                confirm: None,
            },
            AttachmentAction {
                name: NO_VALUE.to_string(),
                text: "No".to_string(),
                action_type: "button".to_string(),
                value: NO_VALUE.to_string(),
                style: Some("danger".to_string()),
                confirm: Some(Confirmation {
                    title: "Are you sure?".to_string(),
                    text: "Think about it :thinking_face:".to_string(),
                    ok_text: "Yes".to_string(),
                    dismiss_text: "No".to_string(),
                }),
            },
        ],
    }]
}
