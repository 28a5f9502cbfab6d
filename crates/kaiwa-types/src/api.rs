use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Conversation, ConversationSummary, Message, Participant};

// -- JWT Claims --

/// Claims minted by the external identity service and verified here.
/// Canonical definition lives in kaiwa-types so the REST middleware and the
/// feed handshake decode the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub exp: usize,
}

// -- Profiles / participants --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<Participant> for ParticipantResponse {
    fn from(p: Participant) -> Self {
        Self {
            id: p.id,
            username: p.username,
            display_name: p.display_name,
            avatar_url: p.avatar_url,
        }
    }
}

impl From<ParticipantResponse> for Participant {
    fn from(p: ParticipantResponse) -> Self {
        Self {
            id: p.id,
            username: p.username,
            display_name: p.display_name,
            avatar_url: p.avatar_url,
        }
    }
}

// -- Conversations --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolveConversationRequest {
    pub participant_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub id: Uuid,
    pub participant_one_id: Uuid,
    pub participant_two_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationResponse {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            participant_one_id: c.participant_one_id,
            participant_two_id: c.participant_two_id,
            created_at: c.created_at,
            last_message_at: c.last_message_at,
        }
    }
}

impl From<ConversationResponse> for Conversation {
    fn from(c: ConversationResponse) -> Self {
        Self {
            id: c.id,
            participant_one_id: c.participant_one_id,
            participant_two_id: c.participant_two_id,
            created_at: c.created_at,
            last_message_at: c.last_message_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSummaryResponse {
    pub conversation_id: Uuid,
    pub other_participant: ParticipantResponse,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub unread_count: u32,
}

impl From<ConversationSummary> for ConversationSummaryResponse {
    fn from(s: ConversationSummary) -> Self {
        Self {
            conversation_id: s.conversation_id,
            other_participant: s.other_participant.into(),
            created_at: s.created_at,
            last_message_at: s.last_message_at,
            unread_count: s.unread_count,
        }
    }
}

impl From<ConversationSummaryResponse> for ConversationSummary {
    fn from(s: ConversationSummaryResponse) -> Self {
        Self {
            conversation_id: s.conversation_id,
            other_participant: s.other_participant.into(),
            created_at: s.created_at,
            last_message_at: s.last_message_at,
            unread_count: s.unread_count,
        }
    }
}

// -- Messages --

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<Message> for MessageResponse {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            recipient_id: m.recipient_id,
            content: m.content,
            created_at: m.created_at,
            read_at: m.read_at,
        }
    }
}

impl From<MessageResponse> for Message {
    fn from(m: MessageResponse) -> Self {
        Self {
            id: m.id,
            conversation_id: m.conversation_id,
            sender_id: m.sender_id,
            recipient_id: m.recipient_id,
            content: m.content,
            created_at: m.created_at,
            read_at: m.read_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    pub marked: u64,
}
