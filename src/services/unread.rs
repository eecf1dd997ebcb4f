//! Per-conversation, per-participant unread counters.
//!
//! Increment and reset are independent commutative field operations, never a
//! read-modify-write. A reset racing a concurrent increment may leave the
//! counter at 1 instead of 0; that is the accepted eventual-consistency
//! trade-off of this data model and must not be linearized away with locks.

use std::sync::Arc;

use crate::error::ChatResult;
use crate::models::conversation::{ConversationId, UserId};
use crate::store::{DocumentStore, MergePatch};

fn counter_path(user: &UserId) -> String {
    format!("unreadCounts.{user}")
}

#[derive(Clone)]
pub struct UnreadTracker {
    store: Arc<dyn DocumentStore>,
}

impl UnreadTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Bumps the recipient's counter by exactly one. Only ever called for
    /// the peer, never for the sender's own counter.
    pub async fn on_message_sent(
        &self,
        conversation_id: &ConversationId,
        recipient_id: &UserId,
    ) -> ChatResult<()> {
        self.store
            .merge_conversation(
                conversation_id,
                MergePatch::new().increment(counter_path(recipient_id), 1),
            )
            .await
    }

    /// Conversation-level mark-all-read: sets the viewer's counter to zero.
    pub async fn on_conversation_opened(
        &self,
        conversation_id: &ConversationId,
        viewer_id: &UserId,
    ) -> ChatResult<()> {
        self.store
            .merge_conversation(
                conversation_id,
                MergePatch::new().set(counter_path(viewer_id), 0),
            )
            .await
    }
}
