//! Identity tracker: the operator's account id and the channel each user
//! first joined.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::SlackError;
use crate::slack::SlackApi;

/// In-memory record of who operates the bot and where users joined.
///
/// Nothing here survives a restart.
pub struct IdentityTracker {
    authorized: RwLock<Option<String>>,
    channels: RwLock<HashMap<String, String>>,
}

impl IdentityTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            authorized: RwLock::new(None),
            channels: RwLock::new(HashMap::new()),
        })
    }

    /// Remember the operator's user id. Later calls replace the value.
    pub async fn record_authorized_identity(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        info!(user = %user_id, "Authorized identity recorded");
        *self.authorized.write().await = Some(user_id);
    }

    /// Whether `user_id` is the operator. False until an identity is recorded.
    pub async fn is_authorized(&self, user_id: &str) -> bool {
        self.authorized.read().await.as_deref() == Some(user_id)
    }

    /// Map `user_id` to `channel_id` unless the user already has a channel.
    ///
    /// Returns `true` if a new entry was created.
    pub async fn register_first_join(&self, user_id: &str, channel_id: &str) -> bool {
        let mut channels = self.channels.write().await;
        match channels.entry(user_id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(channel_id.to_string());
                debug!(user = %user_id, channel = %channel_id, "First join registered");
                true
            }
            Entry::Occupied(existing) => {
                debug!(
                    user = %user_id,
                    channel = %channel_id,
                    registered = %existing.get(),
                    "User already registered; keeping first channel"
                );
                false
            }
        }
    }

    pub async fn lookup_channel(&self, user_id: &str) -> Option<String> {
        self.channels.read().await.get(user_id).cloned()
    }

    /// Ask Slack who owns `operator`'s token and record the answer.
    ///
    /// On failure the identity stays unset, so every operator check is false.
    pub async fn discover_authorized_identity(
        &self,
        operator: &dyn SlackApi,
    ) -> Result<String, SlackError> {
        match operator.test_auth().await {
            Ok(identity) => {
                self.record_authorized_identity(identity.user_id.clone())
                    .await;
                Ok(identity.user_id)
            }
            Err(e) => {
                warn!(error = %e, "Identity check failed; operator is unknown");
                Err(e)
            }
        }
    }
}
