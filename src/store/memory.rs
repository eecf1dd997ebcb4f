//! In-memory document store.
//!
//! Reference backend used by tests and local development. Documents are kept
//! as raw JSON values and normalized at the read boundary, the same place a
//! remote backend would normalize legacy field shapes.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    Mutex, RwLock,
};
use uuid::Uuid;

use super::{ChangeTicks, DocumentStore, FieldOp, MergePatch, NewMessage};
use crate::error::ChatResult;
use crate::models::conversation::{Conversation, ConversationId, UserId};
use crate::models::message::Message;

/// Fan-out of change ticks to live watchers, keyed by topic. Dead watchers
/// are pruned on the next notify.
#[derive(Default)]
struct WatchRegistry {
    inner: RwLock<HashMap<String, Vec<UnboundedSender<()>>>>,
}

impl WatchRegistry {
    async fn add(&self, key: String) -> UnboundedReceiver<()> {
        let (tx, rx) = unbounded_channel();
        let mut guard = self.inner.write().await;
        guard.entry(key).or_default().push(tx);
        rx
    }

    async fn notify(&self, key: &str) {
        let mut guard = self.inner.write().await;
        if let Some(list) = guard.get_mut(key) {
            list.retain(|sender| sender.send(()).is_ok());
        }
    }
}

fn messages_topic(id: &ConversationId) -> String {
    format!("messages:{id}")
}

fn user_topic(user: &str) -> String {
    format!("user:{user}")
}

#[derive(Default)]
pub struct MemoryStore {
    conversations: RwLock<HashMap<ConversationId, Value>>,
    messages: RwLock<HashMap<ConversationId, Vec<Value>>>,
    /// Server clock. Strictly increasing across all writers, which gives
    /// per-writer monotonic `created_at` and a total order for interleaved
    /// sends from both participants.
    clock: Mutex<DateTime<Utc>>,
    watchers: WatchRegistry,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn next_timestamp(&self) -> DateTime<Utc> {
        let mut clock = self.clock.lock().await;
        let mut candidate = Utc::now();
        if candidate <= *clock {
            candidate = *clock + Duration::milliseconds(1);
        }
        *clock = candidate;
        candidate
    }
}

/// Walks `doc` down a dot-separated path, coercing non-objects to objects on
/// the way, and returns the slot the final segment addresses.
fn slot<'a>(doc: &'a mut Value, path: &str) -> &'a mut Value {
    match path.split_once('.') {
        None => field(doc, path),
        Some((head, rest)) => slot(field(doc, head), rest),
    }
}

fn field<'a>(doc: &'a mut Value, key: &str) -> &'a mut Value {
    if !doc.is_object() {
        *doc = Value::Object(serde_json::Map::new());
    }
    match doc {
        Value::Object(map) => map.entry(key.to_string()).or_insert(Value::Null),
        _ => unreachable!("coerced to an object above"),
    }
}

fn apply_patch(doc: &mut Value, patch: &MergePatch, server_time: DateTime<Utc>) {
    for (path, op) in patch.ops() {
        let target = slot(doc, path);
        match op {
            FieldOp::Set(value) => *target = value.clone(),
            FieldOp::Increment(delta) => {
                let current = target.as_i64().unwrap_or(0);
                *target = Value::from(current + delta);
            }
            FieldOp::ServerTimestamp => *target = Value::from(server_time.to_rfc3339()),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        new: NewMessage,
    ) -> ChatResult<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: conversation_id.clone(),
            sender_id: new.sender_id,
            text: new.text,
            attachment: new.attachment,
            created_at: self.next_timestamp().await,
        };

        {
            let mut guard = self.messages.write().await;
            guard
                .entry(conversation_id.clone())
                .or_default()
                .push(message.to_document());
        }

        self.watchers
            .notify(&messages_topic(conversation_id))
            .await;
        Ok(message)
    }

    async fn recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> ChatResult<Vec<Message>> {
        let guard = self.messages.read().await;
        let docs = guard.get(conversation_id).map(Vec::as_slice).unwrap_or(&[]);
        // Stored in append order; timestamps are strictly increasing.
        let window = docs
            .iter()
            .rev()
            .take(limit)
            .map(|doc| Message::from_document(conversation_id.clone(), doc))
            .collect();
        Ok(window)
    }

    async fn get_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> ChatResult<Option<Conversation>> {
        let guard = self.conversations.read().await;
        Ok(guard
            .get(conversation_id)
            .map(|doc| Conversation::from_document(conversation_id.clone(), doc)))
    }

    async fn merge_conversation(
        &self,
        conversation_id: &ConversationId,
        patch: MergePatch,
    ) -> ChatResult<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let server_time = self.next_timestamp().await;

        let members: Vec<String> = {
            let mut guard = self.conversations.write().await;
            let doc = guard
                .entry(conversation_id.clone())
                .or_insert_with(|| Value::Object(serde_json::Map::new()));
            apply_patch(doc, &patch, server_time);
            doc.get("members")
                .and_then(Value::as_array)
                .map(|m| {
                    m.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };

        for member in &members {
            self.watchers.notify(&user_topic(member)).await;
        }
        Ok(())
    }

    async fn conversations_for_user(&self, user: &UserId) -> ChatResult<Vec<Conversation>> {
        let guard = self.conversations.read().await;
        let mut list: Vec<Conversation> = guard
            .iter()
            .map(|(id, doc)| Conversation::from_document(id.clone(), doc))
            .filter(|conv| conv.is_participant(user))
            .collect();
        // Most recent activity first; untouched conversations sink to the end.
        list.sort_by(|a, b| {
            b.last_activity_at
                .cmp(&a.last_activity_at)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        Ok(list)
    }

    async fn watch_messages(&self, conversation_id: &ConversationId) -> ChatResult<ChangeTicks> {
        Ok(self.watchers.add(messages_topic(conversation_id)).await)
    }

    async fn watch_user_conversations(&self, user: &UserId) -> ChatResult<ChangeTicks> {
        Ok(self.watchers.add(user_topic(user.as_str())).await)
    }
}
