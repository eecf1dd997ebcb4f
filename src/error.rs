use thiserror::Error;

use crate::models::conversation::{ConversationId, UserId};

pub type ChatResult<T> = Result<T, ChatError>;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid participants: {0}")]
    InvalidParticipants(String),

    #[error("message has neither text nor attachment")]
    EmptyMessage,

    #[error("user {user_id} is not a participant of conversation {conversation_id}")]
    NotAParticipant {
        user_id: UserId,
        conversation_id: ConversationId,
    },

    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),

    #[error("attachment upload failed: {0}")]
    UploadFailed(String),

    #[error("send failed: {0}")]
    SendFailed(#[source] Box<ChatError>),

    #[error("live subscription lost")]
    SubscriptionLost,

    #[error("session is not active")]
    SessionNotActive,

    #[error("store error: {0}")]
    Store(String),
}

impl ChatError {
    /// Validation errors are rejected before any write; everything else is a
    /// transport-side failure the caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::UploadFailed(_) | ChatError::SubscriptionLost | ChatError::Store(_) => true,
            ChatError::SendFailed(inner) => inner.is_retryable(),
            _ => false,
        }
    }

    /// Wraps a mid-send transport failure in `SendFailed`. Validation errors
    /// pass through unchanged so callers can distinguish a rejected request
    /// from an aborted one.
    pub fn into_send_failure(self) -> ChatError {
        match self {
            e @ (ChatError::EmptyMessage
            | ChatError::NotAParticipant { .. }
            | ChatError::InvalidParticipants(_)
            | ChatError::SessionNotActive
            | ChatError::SendFailed(_)) => e,
            other => ChatError::SendFailed(Box::new(other)),
        }
    }
}
