//! Attachment upload pipeline.
//!
//! An upload completes, success or failure, strictly before the referencing
//! message may be appended. A failed upload never produces a message; a blob
//! whose follow-up append fails is orphaned (no cleanup path, accepted gap).

use bytes::Bytes;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::blob::BlobStore;
use crate::error::{ChatError, ChatResult};
use crate::metrics;
use crate::models::conversation::ConversationId;
use crate::models::message::AttachmentRef;

pub struct AttachmentPipeline {
    blobs: Arc<dyn BlobStore>,
    /// Last issued upload slot in unix millis. Bumped past the wall clock on
    /// collision so concurrent uploads in one conversation never share a key.
    last_slot_ms: AtomicI64,
}

impl AttachmentPipeline {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            blobs,
            last_slot_ms: AtomicI64::new(0),
        }
    }

    pub async fn upload(
        &self,
        conversation_id: &ConversationId,
        payload: Bytes,
        content_type: &str,
    ) -> ChatResult<AttachmentRef> {
        if payload.is_empty() {
            return Err(ChatError::UploadFailed("empty attachment payload".into()));
        }

        let key = self.blob_key(conversation_id);
        let started = Instant::now();
        let url = self.blobs.put(&key, payload, content_type).await?;
        metrics::record_attachment_upload_duration(started.elapsed());

        tracing::debug!(conversation_id = %conversation_id, key = %key, "attachment uploaded");
        Ok(AttachmentRef {
            url,
            content_type: content_type.to_string(),
        })
    }

    fn blob_key(&self, conversation_id: &ConversationId) -> String {
        format!("chat_attachments/{conversation_id}/{}", self.next_slot())
    }

    fn next_slot(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_slot_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(last.max(now - 1) + 1)
            })
            .unwrap_or(now - 1);
        prev.max(now - 1) + 1
    }
}
