//! Document-store boundary.
//!
//! The backend is an eventually-consistent, multi-writer document store. Two
//! rules make concurrent client sessions safe without a lock manager:
//!
//! - the conversation document is only ever mutated through [`MergePatch`]
//!   field operations (set, commutative increment, server timestamp), never
//!   through whole-document read-modify-write;
//! - message ordering comes exclusively from store-assigned `created_at`
//!   timestamps, which a backend must assign monotonically non-decreasing
//!   per writer.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::ChatResult;
use crate::models::conversation::{Conversation, ConversationId, UserId};
use crate::models::message::{AttachmentRef, Message};

pub mod memory;

/// A single field mutation inside a merge patch.
#[derive(Debug, Clone)]
pub enum FieldOp {
    Set(Value),
    /// Commutative add; concurrent increments from both participants never
    /// lose a count.
    Increment(i64),
    /// Resolved to the store's monotonic clock at apply time.
    ServerTimestamp,
}

/// Partial update of one conversation document, applied field by field with
/// merge semantics. Paths are dot-separated (`unreadCounts.u42`).
#[derive(Debug, Clone, Default)]
pub struct MergePatch {
    ops: Vec<(String, FieldOp)>,
}

impl MergePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, path: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.ops.push((path.into(), FieldOp::Set(value)));
        self
    }

    pub fn increment(mut self, path: impl Into<String>, delta: i64) -> Self {
        self.ops.push((path.into(), FieldOp::Increment(delta)));
        self
    }

    pub fn server_timestamp(mut self, path: impl Into<String>) -> Self {
        self.ops.push((path.into(), FieldOp::ServerTimestamp));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[(String, FieldOp)] {
        &self.ops
    }
}

/// Message content as handed to the store; id and timestamp are assigned by
/// the store at write time.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub text: String,
    pub attachment: Option<AttachmentRef>,
}

/// Change notifications are bare ticks; subscribers re-read the window they
/// care about, which is what gives the full-window re-emission semantics.
pub type ChangeTicks = UnboundedReceiver<()>;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Appends to the conversation's message collection. Assigns the message
    /// id and the server `created_at`; visible to all watchers on return.
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        new: NewMessage,
    ) -> ChatResult<Message>;

    /// The `limit` most recent messages, newest first.
    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> ChatResult<Vec<Message>>;

    async fn get_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> ChatResult<Option<Conversation>>;

    /// Applies a merge patch to the conversation document, creating it if
    /// absent.
    async fn merge_conversation(
        &self,
        conversation_id: &ConversationId,
        patch: MergePatch,
    ) -> ChatResult<()>;

    /// All conversations the user participates in, ordered by last activity
    /// descending.
    async fn conversations_for_user(&self, user: &UserId) -> ChatResult<Vec<Conversation>>;

    /// Ticks whenever the conversation's message collection changes.
    async fn watch_messages(&self, conversation_id: &ConversationId) -> ChatResult<ChangeTicks>;

    /// Ticks whenever any conversation document the user participates in
    /// changes.
    async fn watch_user_conversations(&self, user: &UserId) -> ChatResult<ChangeTicks>;
}
