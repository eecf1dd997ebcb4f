//! Canonical conversation identity.
//!
//! The conversation key is a pure, order-independent function of the two
//! participant ids. Either participant can derive it locally, so conversation
//! creation never needs a lookup race or a coordinating allocator.

use crate::error::{ChatError, ChatResult};
use crate::models::conversation::{ConversationId, UserId};

/// Joins the sorted pair. Not valid inside a participant id, so the key
/// parses unambiguously.
pub const SEPARATOR: char = '_';

pub fn resolve(a: &UserId, b: &UserId) -> ChatResult<ConversationId> {
    if a.as_str().is_empty() || b.as_str().is_empty() {
        return Err(ChatError::InvalidParticipants(
            "participant id must not be empty".into(),
        ));
    }
    if a == b {
        return Err(ChatError::InvalidParticipants(format!(
            "cannot open a conversation with oneself ({a})"
        )));
    }
    for id in [a, b] {
        if id.as_str().contains(SEPARATOR) {
            return Err(ChatError::InvalidParticipants(format!(
                "participant id {id} contains the reserved separator {SEPARATOR:?}"
            )));
        }
    }

    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    Ok(ConversationId::from_canonical(format!(
        "{lo}{SEPARATOR}{hi}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_in_the_pair() {
        let a = UserId::from("u1");
        let b = UserId::from("u2");
        assert_eq!(resolve(&a, &b).unwrap(), resolve(&b, &a).unwrap());
        assert_eq!(resolve(&a, &b).unwrap().as_str(), "u1_u2");
    }

    #[test]
    fn rejects_self_conversation() {
        let a = UserId::from("u1");
        let err = resolve(&a, &a).unwrap_err();
        assert!(matches!(err, ChatError::InvalidParticipants(_)));
    }

    #[test]
    fn rejects_empty_and_reserved_ids() {
        let empty = UserId::from("");
        let ok = UserId::from("u1");
        assert!(matches!(
            resolve(&empty, &ok),
            Err(ChatError::InvalidParticipants(_))
        ));
        let reserved = UserId::from("u_2");
        assert!(matches!(
            resolve(&ok, &reserved),
            Err(ChatError::InvalidParticipants(_))
        ));
    }
}
