//! Per-user conversation index for the list view.
//!
//! The conversation document denormalizes everything the list row needs:
//! last-message preview, last-activity timestamp, per-viewer unread count,
//! and a cached profile snapshot per participant. All refreshes are merge
//! patches on the shared document.

use std::sync::Arc;

use crate::error::{ChatError, ChatResult};
use crate::models::conversation::{Conversation, ConversationId, DisplayInfo, UserId};
use crate::models::message::Message;
use crate::store::{ChangeTicks, DocumentStore, MergePatch};

/// Previews are display-only; anything longer is cut at this many chars.
const PREVIEW_MAX_CHARS: usize = 120;

fn preview_of(message: &Message) -> String {
    message.preview().chars().take(PREVIEW_MAX_CHARS).collect()
}

fn info_path(user: &UserId) -> String {
    format!("memberInfo.{user}")
}

#[derive(Clone)]
pub struct ConversationDirectory {
    store: Arc<dyn DocumentStore>,
}

impl ConversationDirectory {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Idempotently materializes the conversation document for a pair, in
    /// canonical order. Safe to issue from both sides concurrently; used when
    /// a chat screen opens before anything was sent.
    pub async fn ensure_conversation(
        &self,
        conversation_id: &ConversationId,
        a: &UserId,
        b: &UserId,
    ) -> ChatResult<()> {
        let mut pair = [a.as_str(), b.as_str()];
        pair.sort_unstable();
        self.store
            .merge_conversation(conversation_id, MergePatch::new().set("members", pair))
            .await
    }

    /// Refreshes the denormalized list-row fields after a successful append:
    /// preview, last activity, and opportunistically the sender's cached
    /// profile snapshot.
    pub async fn on_message_appended(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
        sender_info: Option<&DisplayInfo>,
    ) -> ChatResult<()> {
        let mut patch = MergePatch::new()
            .set("lastMessage", preview_of(message))
            .server_timestamp("updatedAt");
        if let Some(info) = sender_info {
            patch = patch.set(
                info_path(&message.sender_id),
                serde_json::json!({
                    "username": info.display_name,
                    "avatarUrl": info.avatar_url,
                }),
            );
        }
        self.store.merge_conversation(conversation_id, patch).await
    }

    /// The user's conversations, most recent activity first.
    pub async fn list_for_user(&self, user: &UserId) -> ChatResult<Vec<Conversation>> {
        self.store.conversations_for_user(user).await
    }

    /// Live view of `list_for_user`: emits the current list immediately and
    /// the full list again on every change to any of the user's
    /// conversations.
    pub async fn subscribe(&self, user: &UserId) -> ChatResult<DirectorySubscription> {
        let ticks = self.store.watch_user_conversations(user).await?;
        Ok(DirectorySubscription {
            store: self.store.clone(),
            user: user.clone(),
            ticks,
            initial_emitted: false,
        })
    }
}

pub struct DirectorySubscription {
    store: Arc<dyn DocumentStore>,
    user: UserId,
    ticks: ChangeTicks,
    initial_emitted: bool,
}

impl DirectorySubscription {
    pub async fn next_list(&mut self) -> ChatResult<Vec<Conversation>> {
        if !self.initial_emitted {
            self.initial_emitted = true;
            return self.store.conversations_for_user(&self.user).await;
        }
        match self.ticks.recv().await {
            Some(()) => {
                while self.ticks.try_recv().is_ok() {}
                self.store.conversations_for_user(&self.user).await
            }
            None => Err(ChatError::SubscriptionLost),
        }
    }
}
