//! One open conversation view.
//!
//! Orchestrates identity resolution, the live message subscription, and the
//! send sequence: upload, append, unread increment, directory refresh,
//! fire-and-forget push dispatch.

use bytes::Bytes;
use serde_json::json;

use crate::error::{ChatError, ChatResult};
use crate::metrics;
use crate::models::conversation::{ConversationId, UserId};
use crate::models::message::Message;
use crate::services::attachment::AttachmentPipeline;
use crate::services::directory::ConversationDirectory;
use crate::services::identity;
use crate::services::message_log::{MessageLog, MessageSubscription};
use crate::services::unread::UnreadTracker;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Resolving,
    Active,
    Closed,
}

pub struct ChatSession {
    app: AppState,
    log: MessageLog,
    pipeline: AttachmentPipeline,
    unread: UnreadTracker,
    directory: ConversationDirectory,
    state: SessionState,
    self_id: Option<UserId>,
    peer_id: Option<UserId>,
    conversation_id: Option<ConversationId>,
    subscription: Option<MessageSubscription>,
}

impl ChatSession {
    pub fn new(app: AppState) -> Self {
        Self {
            log: MessageLog::new(app.store.clone()),
            pipeline: AttachmentPipeline::new(app.blobs.clone()),
            unread: UnreadTracker::new(app.store.clone()),
            directory: ConversationDirectory::new(app.store.clone()),
            app,
            state: SessionState::Idle,
            self_id: None,
            peer_id: None,
            conversation_id: None,
            subscription: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation_id.as_ref()
    }

    /// Resolves the canonical conversation id, materializes the conversation
    /// document (idempotent, so opening before any send is fine), and begins
    /// the live subscription. After a `SubscriptionLost`, open a fresh
    /// session; a closed one stays closed.
    pub async fn open(&mut self, self_id: UserId, peer_id: UserId) -> ChatResult<()> {
        if self.state != SessionState::Idle {
            return Err(ChatError::SessionNotActive);
        }
        self.state = SessionState::Resolving;

        let result = self.open_inner(&self_id, &peer_id).await;
        match result {
            Ok((conversation_id, subscription)) => {
                self.self_id = Some(self_id);
                self.peer_id = Some(peer_id);
                self.conversation_id = Some(conversation_id);
                self.subscription = Some(subscription);
                self.state = SessionState::Active;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Idle;
                Err(e)
            }
        }
    }

    async fn open_inner(
        &self,
        self_id: &UserId,
        peer_id: &UserId,
    ) -> ChatResult<(ConversationId, MessageSubscription)> {
        let conversation_id = identity::resolve(self_id, peer_id)?;
        self.directory
            .ensure_conversation(&conversation_id, self_id, peer_id)
            .await?;
        let subscription = self
            .log
            .subscribe(&conversation_id, self.app.config.message_window)
            .await?;
        tracing::info!(conversation_id = %conversation_id, "chat session opened");
        Ok((conversation_id, subscription))
    }

    /// Commits one message. The sequence is upload (when an attachment is
    /// given), append, peer unread increment, directory refresh. Transport
    /// failures abort the rest of the sequence and surface as `SendFailed`;
    /// nothing is retried here. An upload whose follow-up append fails leaves
    /// an orphaned blob behind and still reports failure.
    pub async fn send(
        &self,
        text: &str,
        attachment: Option<(Bytes, &str)>,
    ) -> ChatResult<Message> {
        let (conversation_id, self_id, peer_id) = self.active_context()?;
        if text.trim().is_empty() && attachment.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let attachment_ref = match attachment {
            Some((payload, content_type)) => {
                match self
                    .pipeline
                    .upload(conversation_id, payload, content_type)
                    .await
                {
                    Ok(r) => Some(r),
                    Err(e) => {
                        metrics::record_send_failure("upload");
                        return Err(e.into_send_failure());
                    }
                }
            }
            None => None,
        };
        let had_attachment = attachment_ref.is_some();

        let message = match self
            .log
            .append(conversation_id, self_id, text, attachment_ref)
            .await
        {
            Ok(m) => m,
            Err(e) => {
                metrics::record_send_failure("append");
                if had_attachment {
                    tracing::warn!(
                        conversation_id = %conversation_id,
                        "append failed after upload; attachment blob is orphaned"
                    );
                }
                return Err(e.into_send_failure());
            }
        };

        if let Err(e) = self.unread.on_message_sent(conversation_id, peer_id).await {
            metrics::record_send_failure("unread");
            return Err(e.into_send_failure());
        }

        let sender_info = self.app.profiles.display_info(self_id).await.ok();
        if let Err(e) = self
            .directory
            .on_message_appended(conversation_id, &message, sender_info.as_ref())
            .await
        {
            metrics::record_send_failure("directory");
            return Err(e.into_send_failure());
        }

        metrics::record_message_sent(if had_attachment { "attachment" } else { "text" });

        // Fire and forget; delivery failures are the push provider's problem.
        let notifier = self.app.notifier.clone();
        let recipient = peer_id.clone();
        let title = sender_info
            .map(|i| i.display_name)
            .unwrap_or_else(|| self_id.to_string());
        let body = message.preview().to_string();
        let payload = json!({
            "conversationId": conversation_id,
            "senderId": self_id,
        });
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&recipient, &title, &body, payload).await {
                tracing::warn!(recipient = %recipient, error = %e, "push dispatch failed");
            }
        });

        Ok(message)
    }

    /// Conversation-level acknowledgment. The view calls this on entry and
    /// again whenever the live window grows while visible.
    pub async fn mark_read(&self) -> ChatResult<()> {
        let (conversation_id, self_id, _) = self.active_context()?;
        self.unread
            .on_conversation_opened(conversation_id, self_id)
            .await
    }

    /// Next full window from the live subscription, newest first.
    pub async fn next_window(&mut self) -> ChatResult<Vec<Message>> {
        if self.state != SessionState::Active {
            return Err(ChatError::SessionNotActive);
        }
        match self.subscription.as_mut() {
            Some(sub) => sub.next_window().await,
            None => Err(ChatError::SubscriptionLost),
        }
    }

    /// Cancels the live subscription. Terminal; in-flight sends complete or
    /// fail on their own.
    pub fn close(&mut self) {
        self.subscription = None;
        if self.state != SessionState::Closed {
            tracing::debug!(conversation_id = ?self.conversation_id, "chat session closed");
        }
        self.state = SessionState::Closed;
    }

    fn active_context(&self) -> ChatResult<(&ConversationId, &UserId, &UserId)> {
        match (
            self.state,
            &self.conversation_id,
            &self.self_id,
            &self.peer_id,
        ) {
            (SessionState::Active, Some(c), Some(s), Some(p)) => Ok((c, s, p)),
            _ => Err(ChatError::SessionNotActive),
        }
    }
}
