use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Stable identifier of a participant, issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Canonical key of a two-party conversation, order-independent in the
/// participant pair. Built only by `services::identity::resolve`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub(crate) fn from_canonical(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Denormalized profile snapshot cached on the conversation document so the
/// list view does not need a profile lookup per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    /// Exactly two distinct participants, in canonical (sorted) order.
    pub participants: Vec<UserId>,
    pub last_message_preview: String,
    pub last_activity_at: Option<DateTime<Utc>>,
    pub unread_counts: HashMap<UserId, u32>,
    pub participant_info: HashMap<UserId, DisplayInfo>,
}

impl Conversation {
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.participants.iter().any(|p| p == user)
    }

    pub fn peer_of(&self, user: &UserId) -> Option<&UserId> {
        self.participants.iter().find(|p| *p != user)
    }

    pub fn unread_for(&self, user: &UserId) -> u32 {
        self.unread_counts.get(user).copied().unwrap_or(0)
    }

    /// Normalizes a raw conversation document. Field names follow the store
    /// schema (`members`, `lastMessage`, `updatedAt`, `unreadCounts`,
    /// `memberInfo`); unknown or malformed fields degrade to defaults rather
    /// than failing the whole read. Counters that went negative under
    /// concurrent merges clamp to zero.
    pub fn from_document(id: ConversationId, doc: &Value) -> Self {
        let participants = doc
            .get("members")
            .and_then(Value::as_array)
            .map(|members| {
                members
                    .iter()
                    .filter_map(Value::as_str)
                    .map(UserId::from)
                    .collect()
            })
            .unwrap_or_default();

        let last_message_preview = doc
            .get("lastMessage")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let last_activity_at = doc
            .get("updatedAt")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        let unread_counts = doc
            .get("unreadCounts")
            .and_then(Value::as_object)
            .map(|counts| {
                counts
                    .iter()
                    .map(|(user, n)| {
                        let n = n.as_i64().unwrap_or(0).max(0) as u32;
                        (UserId::from(user.as_str()), n)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let participant_info = doc
            .get("memberInfo")
            .and_then(Value::as_object)
            .map(|infos| {
                infos
                    .iter()
                    .filter_map(|(user, info)| {
                        let display_name = info.get("username")?.as_str()?.to_string();
                        let avatar_url = info
                            .get("avatarUrl")
                            .and_then(Value::as_str)
                            .map(str::to_string);
                        Some((
                            UserId::from(user.as_str()),
                            DisplayInfo {
                                display_name,
                                avatar_url,
                            },
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            id,
            participants,
            last_message_preview,
            last_activity_at,
            unread_counts,
            participant_info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_full_document() {
        let id = ConversationId::from_canonical("u1_u2".into());
        let doc = json!({
            "members": ["u1", "u2"],
            "lastMessage": "Hey",
            "updatedAt": "2026-08-28T10:00:00Z",
            "unreadCounts": {"u2": 3, "u1": 0},
            "memberInfo": {"u1": {"username": "alice", "avatarUrl": "https://cdn/a.png"}},
        });
        let conv = Conversation::from_document(id, &doc);
        assert!(conv.is_participant(&UserId::from("u2")));
        assert_eq!(conv.peer_of(&UserId::from("u1")), Some(&UserId::from("u2")));
        assert_eq!(conv.unread_for(&UserId::from("u2")), 3);
        assert_eq!(conv.last_message_preview, "Hey");
        assert_eq!(
            conv.participant_info[&UserId::from("u1")].display_name,
            "alice"
        );
    }

    #[test]
    fn negative_counter_clamps_to_zero() {
        let id = ConversationId::from_canonical("u1_u2".into());
        let doc = json!({"members": ["u1", "u2"], "unreadCounts": {"u1": -2}});
        let conv = Conversation::from_document(id, &doc);
        assert_eq!(conv.unread_for(&UserId::from("u1")), 0);
    }
}
