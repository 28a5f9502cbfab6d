//! Database row types — these map directly to SQLite rows.
//! Conversions into the kaiwa-types models live here so every caller parses
//! ids and timestamps the same way.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use kaiwa_types::models::{Conversation, ConversationSummary, Message, Participant};
use uuid::Uuid;

pub struct ProfileRow {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct ConversationRow {
    pub id: String,
    pub participant_one_id: String,
    pub participant_two_id: String,
    pub created_at: String,
    pub last_message_at: String,
}

pub struct MessageRow {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub created_at: String,
    pub read_at: Option<String>,
}

pub struct ConversationSummaryRow {
    pub conversation: ConversationRow,
    pub other: ProfileRow,
    pub unread_count: u32,
}

/// Timestamps are stored as RFC 3339 with millisecond precision. SQLite's
/// `datetime('now')` only resolves to whole seconds, which is too coarse to
/// keep messages sent in quick succession in order.
pub(crate) fn format_ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn now_ts() -> String {
    format_ts(Utc::now())
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("invalid timestamp in row: {raw}"))?
        .with_timezone(&Utc))
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("invalid uuid in row: {raw}"))
}

impl ProfileRow {
    pub fn into_participant(self) -> Result<Participant> {
        Ok(Participant {
            id: parse_id(&self.id)?,
            username: self.username,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
        })
    }
}

impl ConversationRow {
    pub fn into_conversation(self) -> Result<Conversation> {
        Ok(Conversation {
            id: parse_id(&self.id)?,
            participant_one_id: parse_id(&self.participant_one_id)?,
            participant_two_id: parse_id(&self.participant_two_id)?,
            created_at: parse_ts(&self.created_at)?,
            last_message_at: parse_ts(&self.last_message_at)?,
        })
    }
}

impl MessageRow {
    pub fn into_message(self) -> Result<Message> {
        Ok(Message {
            id: parse_id(&self.id)?,
            conversation_id: parse_id(&self.conversation_id)?,
            sender_id: parse_id(&self.sender_id)?,
            recipient_id: parse_id(&self.recipient_id)?,
            content: self.content,
            created_at: parse_ts(&self.created_at)?,
            read_at: self.read_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

impl ConversationSummaryRow {
    pub fn into_summary(self) -> Result<ConversationSummary> {
        Ok(ConversationSummary {
            conversation_id: parse_id(&self.conversation.id)?,
            other_participant: self.other.into_participant()?,
            created_at: parse_ts(&self.conversation.created_at)?,
            last_message_at: parse_ts(&self.conversation.last_message_at)?,
            unread_count: self.unread_count,
        })
    }
}
