use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A principal as seen from the messaging subsystem. Display attributes are
/// owned by the identity/profile service; messaging only reads them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// A two-party conversation. The participant pair is unordered: (A,B) and
/// (B,A) denote the same conversation, stored with the smaller id first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_one_id: Uuid,
    pub participant_two_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl Conversation {
    /// The participant on the far side of this conversation from `principal`,
    /// or `None` if `principal` is not part of the pair.
    pub fn other_participant(&self, principal: Uuid) -> Option<Uuid> {
        if self.participant_one_id == principal {
            Some(self.participant_two_id)
        } else if self.participant_two_id == principal {
            Some(self.participant_one_id)
        } else {
            None
        }
    }

    pub fn involves(&self, participant: Uuid) -> bool {
        self.participant_one_id == participant || self.participant_two_id == participant
    }
}

/// A direct message. Immutable once created; `read_at` is the only field
/// that changes after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// One row of the conversation list: the conversation resolved to the other
/// participant, plus the unread count for the viewing principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub other_participant: Participant,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: u32,
}
