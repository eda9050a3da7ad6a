//! emojibot: a Slack bot that greets new channel members with an emoji
//! question and moderates based on the answer.

pub mod config;
pub mod error;
pub mod identity;
pub mod onboarding;
pub mod server;
pub mod slack;
pub mod workflow;
