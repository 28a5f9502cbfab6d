use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Message;

/// Events pushed over the live feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FeedEvent {
    /// Server confirms successful authentication of a feed connection.
    Ready { participant_id: Uuid, username: String },

    /// A new message was persisted. The feed filters these by `sender_id`
    /// only; checking `recipient_id` is the consumer's responsibility.
    MessageCreated {
        id: Uuid,
        conversation_id: Uuid,
        sender_id: Uuid,
        recipient_id: Uuid,
        content: String,
        created_at: DateTime<Utc>,
    },
}

impl FeedEvent {
    pub fn message_created(message: &Message) -> Self {
        Self::MessageCreated {
            id: message.id,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            recipient_id: message.recipient_id,
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }

    /// Returns the sender id if this event is scoped to a sender.
    /// `Ready` returns `None` and is never matched against a filter.
    pub fn sender_id(&self) -> Option<Uuid> {
        match self {
            Self::MessageCreated { sender_id, .. } => Some(*sender_id),
            Self::Ready { .. } => None,
        }
    }
}

/// Commands sent FROM client TO server over the feed WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum FeedCommand {
    /// Authenticate the WebSocket connection.
    Identify { token: String },

    /// Start receiving `MessageCreated` events for one sender.
    Subscribe { sender_id: Uuid },

    /// Stop receiving events for one sender.
    Unsubscribe { sender_id: Uuid },
}
