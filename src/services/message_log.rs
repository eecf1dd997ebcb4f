//! Append-only, time-ordered message log with bounded-window live
//! subscription.

use futures_util::Stream;
use std::sync::Arc;

use crate::error::{ChatError, ChatResult};
use crate::metrics;
use crate::models::conversation::{ConversationId, UserId};
use crate::models::message::{AttachmentRef, Message};
use crate::store::{ChangeTicks, DocumentStore, NewMessage};

#[derive(Clone)]
pub struct MessageLog {
    store: Arc<dyn DocumentStore>,
}

impl MessageLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Validates and commits one message. The store assigns id and
    /// `created_at`; on return the message is visible to live subscribers.
    pub async fn append(
        &self,
        conversation_id: &ConversationId,
        sender_id: &UserId,
        text: &str,
        attachment: Option<AttachmentRef>,
    ) -> ChatResult<Message> {
        if text.trim().is_empty() && attachment.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let conversation = self
            .store
            .get_conversation(conversation_id)
            .await?
            .ok_or_else(|| ChatError::ConversationNotFound(conversation_id.clone()))?;
        if !conversation.is_participant(sender_id) {
            return Err(ChatError::NotAParticipant {
                user_id: sender_id.clone(),
                conversation_id: conversation_id.clone(),
            });
        }

        let message = self
            .store
            .append_message(
                conversation_id,
                NewMessage {
                    sender_id: sender_id.clone(),
                    text: text.to_string(),
                    attachment,
                },
            )
            .await?;

        tracing::debug!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            has_attachment = message.attachment.is_some(),
            "message appended"
        );
        Ok(message)
    }

    /// One-shot read of the default window, newest first.
    pub async fn recent(&self, conversation_id: &ConversationId) -> ChatResult<Vec<Message>> {
        self.store
            .recent_messages(conversation_id, crate::config::DEFAULT_MESSAGE_WINDOW)
            .await
    }

    /// Live view of the `window` most recent messages, newest first. Emits
    /// the current window immediately, then re-emits the full window on every
    /// change. Restartable: a fresh subscription re-delivers the current
    /// window, which may skip anything older than the window.
    pub async fn subscribe(
        &self,
        conversation_id: &ConversationId,
        window: usize,
    ) -> ChatResult<MessageSubscription> {
        let ticks = self.store.watch_messages(conversation_id).await?;
        metrics::subscription_opened();
        Ok(MessageSubscription {
            store: self.store.clone(),
            conversation_id: conversation_id.clone(),
            window,
            ticks,
            initial_emitted: false,
        })
    }
}

pub struct MessageSubscription {
    store: Arc<dyn DocumentStore>,
    conversation_id: ConversationId,
    window: usize,
    ticks: ChangeTicks,
    initial_emitted: bool,
}

impl MessageSubscription {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    /// Next full window, newest first. Returns `SubscriptionLost` when the
    /// store side disconnects; the owner is expected to re-open.
    pub async fn next_window(&mut self) -> ChatResult<Vec<Message>> {
        if !self.initial_emitted {
            self.initial_emitted = true;
            return self.read_window().await;
        }

        match self.ticks.recv().await {
            Some(()) => {
                // Coalesce a burst of changes into one re-read; the window is
                // total state, so intermediate emissions carry no information.
                while self.ticks.try_recv().is_ok() {}
                self.read_window().await
            }
            None => Err(ChatError::SubscriptionLost),
        }
    }

    async fn read_window(&self) -> ChatResult<Vec<Message>> {
        self.store
            .recent_messages(&self.conversation_id, self.window)
            .await
    }

    pub fn into_stream(self) -> impl Stream<Item = ChatResult<Vec<Message>>> {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut sub = state?;
            match sub.next_window().await {
                Ok(window) => Some((Ok(window), Some(sub))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}

impl Drop for MessageSubscription {
    fn drop(&mut self) {
        metrics::subscription_closed();
    }
}
