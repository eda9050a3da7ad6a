//! Slack integration: wire types, request verification and the Web API
//! client.

pub mod api;
pub mod client;
pub mod types;
pub mod verify;

pub use api::SlackApi;
pub use client::SlackWebClient;
pub use types::{
    ActionPayload, ActionUser, ActionValue, Attachment, AttachmentAction, AuthIdentity,
    Confirmation, EventEnvelope, MemberJoinedChannelEvent, ReactionAddedEvent, ReactionItem,
    SlackEvent,
};
