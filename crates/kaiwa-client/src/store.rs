use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use kaiwa_types::models::{Conversation, ConversationSummary, Message, Participant};

/// What a controller can observe going wrong at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transient I/O failure. State on both sides is unchanged and the same
    /// call may be resubmitted verbatim.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("not authorized")]
    Unauthorized,

    #[error("invalid request: {0}")]
    Invalid(String),

    #[error("store closed")]
    Closed,
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// Everything the controllers need from persistence. Implemented in-process
/// on top of the database and remotely on top of the REST surface.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Conversation summaries for the principal, most recent activity first.
    async fn list_conversations(
        &self,
        principal: Uuid,
    ) -> Result<Vec<ConversationSummary>, StoreError>;

    /// Full thread between principal and other, oldest first. A pair that
    /// never talked yields an empty thread.
    async fn load_thread(&self, principal: Uuid, other: Uuid)
        -> Result<Vec<Message>, StoreError>;

    /// Store one message. Content arrives pre-trimmed and non-empty; the
    /// conversation is created on first contact.
    async fn send_message(
        &self,
        principal: Uuid,
        recipient: Uuid,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// Find-or-create the conversation with the target participant.
    async fn resolve_conversation(
        &self,
        principal: Uuid,
        target: Uuid,
    ) -> Result<Conversation, StoreError>;

    /// Participant directory search; the store excludes the principal and
    /// caps the result size.
    async fn search_participants(
        &self,
        principal: Uuid,
        query: &str,
    ) -> Result<Vec<Participant>, StoreError>;

    /// Stamp unread incoming messages in the thread as read; returns how
    /// many were marked.
    async fn mark_thread_read(&self, principal: Uuid, other: Uuid) -> Result<u64, StoreError>;
}
