use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::conversation::{ConversationId, UserId};

/// Preview text the directory shows for an attachment-only message.
pub const ATTACHMENT_PREVIEW: &str = "[image]";

/// Stable pointer to an uploaded blob, produced by the attachment pipeline
/// strictly before the message referencing it is committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub url: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    /// May be empty only when `attachment` is present.
    pub text: String,
    pub attachment: Option<AttachmentRef>,
    /// Server-assigned; the only ordering source of truth.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Short text the conversation list shows for this message.
    pub fn preview(&self) -> &str {
        if self.text.is_empty() && self.attachment.is_some() {
            ATTACHMENT_PREVIEW
        } else {
            &self.text
        }
    }

    pub fn to_document(&self) -> Value {
        let mut doc = json!({
            "_id": self.id.to_string(),
            "senderId": self.sender_id.as_str(),
            "text": self.text,
            "createdAt": self.created_at.to_rfc3339(),
        });
        if let Some(attachment) = &self.attachment {
            doc["attachment"] = json!({
                "url": attachment.url,
                "contentType": attachment.content_type,
            });
        }
        doc
    }

    /// Normalizes a raw message document into the canonical schema.
    ///
    /// Historical writers used two sender encodings: a flat `senderId` field
    /// and a nested `user._id` object. Both are accepted here, at the store
    /// boundary, so no consumer ever sees the legacy shape. A document with
    /// neither gets the `unknown` sender, and a missing or malformed
    /// `createdAt` falls back to the read time.
    pub fn from_document(conversation_id: ConversationId, doc: &Value) -> Self {
        let id = doc
            .get("_id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        let sender_id = doc
            .get("senderId")
            .and_then(Value::as_str)
            .or_else(|| {
                doc.get("user")
                    .and_then(|u| u.get("_id"))
                    .and_then(Value::as_str)
            })
            .unwrap_or("unknown");

        let text = doc
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let attachment = doc.get("attachment").and_then(|a| {
            Some(AttachmentRef {
                url: a.get("url")?.as_str()?.to_string(),
                content_type: a
                    .get("contentType")
                    .and_then(Value::as_str)
                    .unwrap_or("application/octet-stream")
                    .to_string(),
            })
        });

        let created_at = doc
            .get("createdAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Self {
            id,
            conversation_id,
            sender_id: UserId::from(sender_id),
            text,
            attachment,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cid() -> ConversationId {
        ConversationId::from_canonical("u1_u2".into())
    }

    #[test]
    fn round_trips_through_document_form() {
        let msg = Message {
            id: Uuid::new_v4(),
            conversation_id: cid(),
            sender_id: UserId::from("u1"),
            text: String::new(),
            attachment: Some(AttachmentRef {
                url: "https://cdn/chat_attachments/u1_u2/17.jpg".into(),
                content_type: "image/jpeg".into(),
            }),
            created_at: Utc::now(),
        };
        let parsed = Message::from_document(cid(), &msg.to_document());
        assert_eq!(parsed.id, msg.id);
        assert_eq!(parsed.sender_id, msg.sender_id);
        assert_eq!(parsed.attachment, msg.attachment);
        assert_eq!(parsed.preview(), ATTACHMENT_PREVIEW);
    }

    #[test]
    fn accepts_the_legacy_nested_sender_shape() {
        let doc = json!({
            "_id": Uuid::new_v4().to_string(),
            "text": "old writer",
            "user": {"_id": "u9", "name": "legacy"},
            "createdAt": "2024-01-05T09:30:00Z",
        });
        let msg = Message::from_document(cid(), &doc);
        assert_eq!(msg.sender_id, UserId::from("u9"));
        assert_eq!(msg.text, "old writer");
    }

    #[test]
    fn unknown_sender_when_both_shapes_absent() {
        let msg = Message::from_document(cid(), &json!({"text": "hi"}));
        assert_eq!(msg.sender_id, UserId::from("unknown"));
    }
}
