use crate::models::{
    ConversationRow, ConversationSummaryRow, MessageRow, ProfileRow, format_ts, now_ts,
};
use crate::pair::canonical_pair;
use crate::Database;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use uuid::Uuid;

impl Database {
    // -- Profiles --

    /// Create or refresh the principal's profile from token claims. Only the
    /// username is touched on conflict so edits to display fields survive.
    pub fn ensure_profile(&self, id: Uuid, username: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, username, display_name, avatar_url, created_at, updated_at)
                 VALUES (?1, ?2, NULL, NULL, ?3, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     username = excluded.username,
                     updated_at = excluded.updated_at
                 WHERE username <> excluded.username",
                params![id.to_string(), username, now_ts()],
            )?;
            Ok(())
        })
    }

    pub fn upsert_profile(
        &self,
        id: Uuid,
        username: &str,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<ProfileRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO profiles (id, username, display_name, avatar_url, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                     username = excluded.username,
                     display_name = excluded.display_name,
                     avatar_url = excluded.avatar_url,
                     updated_at = excluded.updated_at",
                params![id.to_string(), username, display_name, avatar_url, now_ts()],
            )?;
            query_profile_by_id(conn, id)?.ok_or_else(|| anyhow!("profile missing after upsert"))
        })
    }

    pub fn get_profile(&self, id: Uuid) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile_by_id(conn, id))
    }

    /// Case-insensitive substring match over username and display name,
    /// excluding the principal. Results come back in username order.
    pub fn search_profiles(&self, principal: Uuid, query: &str, limit: u32) -> Result<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let pattern = like_pattern(query);
            let mut stmt = conn.prepare(
                r"SELECT id, username, display_name, avatar_url, created_at, updated_at
                  FROM profiles
                  WHERE id <> ?1
                    AND (username LIKE ?2 ESCAPE '\' OR display_name LIKE ?2 ESCAPE '\')
                  ORDER BY username ASC
                  LIMIT ?3",
            )?;

            let rows = stmt
                .query_map(params![principal.to_string(), pattern, limit], profile_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Conversations --

    pub fn find_conversation_by_pair(&self, a: Uuid, b: Uuid) -> Result<Option<ConversationRow>> {
        self.with_conn(|conn| query_conversation_by_pair(conn, a, b))
    }

    /// Insert the canonical pair row unless it already exists, then read back
    /// whichever row won. Safe to call concurrently for the same pair.
    pub fn create_conversation_if_absent(&self, a: Uuid, b: Uuid) -> Result<ConversationRow> {
        self.with_conn(|conn| create_pair_if_absent(conn, a, b))
    }

    /// Find-or-create the conversation between two participants.
    pub fn resolve_conversation(&self, principal: Uuid, target: Uuid) -> Result<ConversationRow> {
        self.with_conn(|conn| resolve_pair(conn, principal, target))
    }

    /// All conversations touching the principal, most recent activity first.
    /// Ties on last_message_at fall back to conversation id so the order is
    /// stable across refreshes.
    pub fn list_conversations(&self, principal: Uuid) -> Result<Vec<ConversationSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.participant_one_id, c.participant_two_id, c.created_at, c.last_message_at,
                        p.id, p.username, p.display_name, p.avatar_url, p.created_at, p.updated_at,
                        (SELECT COUNT(*) FROM messages m
                          WHERE m.conversation_id = c.id
                            AND m.recipient_id = ?1
                            AND m.read_at IS NULL)
                 FROM conversations c
                 JOIN profiles p ON p.id = CASE WHEN c.participant_one_id = ?1
                                                THEN c.participant_two_id
                                                ELSE c.participant_one_id END
                 WHERE c.participant_one_id = ?1 OR c.participant_two_id = ?1
                 ORDER BY c.last_message_at DESC, c.id ASC",
            )?;

            let rows = stmt
                .query_map([principal.to_string()], |row| {
                    Ok(ConversationSummaryRow {
                        conversation: ConversationRow {
                            id: row.get(0)?,
                            participant_one_id: row.get(1)?,
                            participant_two_id: row.get(2)?,
                            created_at: row.get(3)?,
                            last_message_at: row.get(4)?,
                        },
                        other: ProfileRow {
                            id: row.get(5)?,
                            username: row.get(6)?,
                            display_name: row.get(7)?,
                            avatar_url: row.get(8)?,
                            created_at: row.get(9)?,
                            updated_at: row.get(10)?,
                        },
                        unread_count: row.get::<_, i64>(11)? as u32,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn touch_conversation(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| touch_conversation_row(conn, &id.to_string(), &format_ts(at)))
    }

    // -- Messages --

    /// Store a message from sender to recipient, creating the conversation on
    /// first contact and bumping its recency. Returns the conversation as it
    /// stands after the append together with the stored message.
    pub fn append_message(
        &self,
        sender: Uuid,
        recipient: Uuid,
        content: &str,
    ) -> Result<(ConversationRow, MessageRow)> {
        self.with_conn(|conn| {
            let conversation = resolve_pair(conn, sender, recipient)?;
            let message = insert_message_row(conn, &conversation.id, sender, recipient, content, &now_ts())?;
            touch_conversation_row(conn, &conversation.id, &message.created_at)?;
            let conversation = query_conversation_by_id(conn, &conversation.id)?
                .ok_or_else(|| anyhow!("conversation missing after append"))?;
            Ok((conversation, message))
        })
    }

    pub fn thread_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_thread(conn, &conversation_id.to_string()))
    }

    /// Full history between two participants, oldest first. An unknown pair
    /// yields an empty thread rather than an error.
    pub fn thread_between(&self, a: Uuid, b: Uuid) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            match query_conversation_by_pair(conn, a, b)? {
                Some(conversation) => query_thread(conn, &conversation.id),
                None => Ok(vec![]),
            }
        })
    }

    /// Stamp every unread message addressed to the principal in the thread
    /// with the other participant. Returns how many rows changed.
    pub fn mark_thread_read(&self, principal: Uuid, other: Uuid) -> Result<u64> {
        self.with_conn(|conn| {
            let Some(conversation) = query_conversation_by_pair(conn, principal, other)? else {
                return Ok(0);
            };
            let n = conn.execute(
                "UPDATE messages SET read_at = ?1
                 WHERE conversation_id = ?2 AND recipient_id = ?3 AND read_at IS NULL",
                params![now_ts(), conversation.id, principal.to_string()],
            )?;
            Ok(n as u64)
        })
    }
}

fn resolve_pair(conn: &Connection, principal: Uuid, target: Uuid) -> Result<ConversationRow> {
    if principal == target {
        return Err(anyhow!("cannot open a conversation with yourself"));
    }
    if let Some(row) = query_conversation_by_pair(conn, principal, target)? {
        return Ok(row);
    }
    create_pair_if_absent(conn, principal, target)
}

fn create_pair_if_absent(conn: &Connection, a: Uuid, b: Uuid) -> Result<ConversationRow> {
    if a == b {
        return Err(anyhow!("cannot open a conversation with yourself"));
    }
    let (one, two) = canonical_pair(a, b);
    let now = now_ts();
    conn.execute(
        "INSERT INTO conversations (id, participant_one_id, participant_two_id, created_at, last_message_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(participant_one_id, participant_two_id) DO NOTHING",
        params![Uuid::new_v4().to_string(), one.to_string(), two.to_string(), now],
    )?;
    // Re-select unconditionally: if a concurrent caller won the insert race,
    // this returns their row.
    query_conversation_by_pair(conn, one, two)?
        .ok_or_else(|| anyhow!("conversation missing after insert"))
}

fn insert_message_row(
    conn: &Connection,
    conversation_id: &str,
    sender: Uuid,
    recipient: Uuid,
    content: &str,
    created_at: &str,
) -> Result<MessageRow> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO messages (id, conversation_id, sender_id, recipient_id, content, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, conversation_id, sender.to_string(), recipient.to_string(), content, created_at],
    )?;
    Ok(MessageRow {
        id,
        conversation_id: conversation_id.to_string(),
        sender_id: sender.to_string(),
        recipient_id: recipient.to_string(),
        content: content.to_string(),
        created_at: created_at.to_string(),
        read_at: None,
    })
}

fn touch_conversation_row(conn: &Connection, id: &str, at: &str) -> Result<()> {
    // max() keeps recency monotonic even if appends land out of order.
    conn.execute(
        "UPDATE conversations SET last_message_at = max(last_message_at, ?1) WHERE id = ?2",
        params![at, id],
    )?;
    Ok(())
}

fn query_thread(conn: &Connection, conversation_id: &str) -> Result<Vec<MessageRow>> {
    // rowid breaks ties between messages stamped in the same millisecond;
    // inserts go through one connection, so rowid follows insert order.
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, sender_id, recipient_id, content, created_at, read_at
         FROM messages
         WHERE conversation_id = ?1
         ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt
        .query_map([conversation_id], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_conversation_by_pair(conn: &Connection, a: Uuid, b: Uuid) -> Result<Option<ConversationRow>> {
    let (one, two) = canonical_pair(a, b);
    let mut stmt = conn.prepare(
        "SELECT id, participant_one_id, participant_two_id, created_at, last_message_at
         FROM conversations
         WHERE participant_one_id = ?1 AND participant_two_id = ?2",
    )?;

    let row = stmt
        .query_row([one.to_string(), two.to_string()], conversation_from_row)
        .optional()?;

    Ok(row)
}

fn query_conversation_by_id(conn: &Connection, id: &str) -> Result<Option<ConversationRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, participant_one_id, participant_two_id, created_at, last_message_at
         FROM conversations
         WHERE id = ?1",
    )?;

    let row = stmt.query_row([id], conversation_from_row).optional()?;

    Ok(row)
}

fn query_profile_by_id(conn: &Connection, id: Uuid) -> Result<Option<ProfileRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, display_name, avatar_url, created_at, updated_at
         FROM profiles
         WHERE id = ?1",
    )?;

    let row = stmt
        .query_row([id.to_string()], profile_from_row)
        .optional()?;

    Ok(row)
}

fn profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        avatar_url: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn conversation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        participant_one_id: row.get(1)?,
        participant_two_id: row.get(2)?,
        created_at: row.get(3)?,
        last_message_at: row.get(4)?,
    })
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        recipient_id: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        read_at: row.get(6)?,
    })
}

/// Escape LIKE wildcards so user input matches literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn seed(db: &Database, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        db.ensure_profile(id, username).unwrap();
        id
    }

    #[test]
    fn test_resolve_is_idempotent_across_orientations() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");

        let first = db.resolve_conversation(alice, bob).unwrap();
        let second = db.resolve_conversation(bob, alice).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(db.list_conversations(alice).unwrap().len(), 1);
        assert_eq!(db.list_conversations(bob).unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_rejects_self_conversation() {
        let db = test_db();
        let alice = seed(&db, "alice");
        assert!(db.resolve_conversation(alice, alice).is_err());
        assert!(db.create_conversation_if_absent(alice, alice).is_err());
    }

    #[test]
    fn test_concurrent_create_converges_on_one_row() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");

        // Both sides race to create; the second insert is a no-op and the
        // re-select hands back the winner.
        let a = db.create_conversation_if_absent(alice, bob).unwrap();
        let b = db.create_conversation_if_absent(bob, alice).unwrap();

        assert_eq!(a.id, b.id);
        assert_eq!(a.created_at, b.created_at);
    }

    #[test]
    fn test_pair_stored_in_canonical_order() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");

        let row = db.resolve_conversation(alice, bob).unwrap();
        assert!(row.participant_one_id < row.participant_two_id);

        let ids = [row.participant_one_id.as_str(), row.participant_two_id.as_str()];
        assert!(ids.contains(&alice.to_string().as_str()));
        assert!(ids.contains(&bob.to_string().as_str()));
    }

    #[test]
    fn test_append_creates_conversation_and_bumps_recency() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");

        assert!(db.find_conversation_by_pair(alice, bob).unwrap().is_none());

        let (conversation, message) = db.append_message(alice, bob, "hello").unwrap();
        assert_eq!(conversation.last_message_at, message.created_at);

        let (after, second) = db.append_message(bob, alice, "hi back").unwrap();
        assert_eq!(after.id, conversation.id);
        assert!(after.last_message_at >= conversation.last_message_at);
        assert_eq!(after.last_message_at, second.created_at);
    }

    #[test]
    fn test_thread_orders_by_time_then_insert_order() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");
        let conversation = db.resolve_conversation(alice, bob).unwrap();
        let conversation_id = Uuid::parse_str(&conversation.id).unwrap();

        // Same timestamp on purpose: insert order must decide.
        let ts = now_ts();
        db.with_conn(|conn| {
            insert_message_row(conn, &conversation.id, alice, bob, "first", &ts)?;
            insert_message_row(conn, &conversation.id, bob, alice, "second", &ts)?;
            insert_message_row(conn, &conversation.id, alice, bob, "third", &ts)?;
            Ok(())
        })
        .unwrap();

        let thread = db.thread_messages(conversation_id).unwrap();
        let contents: Vec<&str> = thread.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }

    #[test]
    fn test_thread_between_unknown_pair_is_empty() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");
        assert!(db.thread_between(alice, bob).unwrap().is_empty());
    }

    #[test]
    fn test_unread_counts_and_mark_read() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");

        db.append_message(alice, bob, "one").unwrap();
        db.append_message(alice, bob, "two").unwrap();
        db.append_message(bob, alice, "reply").unwrap();

        let bobs_view = db.list_conversations(bob).unwrap();
        assert_eq!(bobs_view[0].unread_count, 2);
        let alices_view = db.list_conversations(alice).unwrap();
        assert_eq!(alices_view[0].unread_count, 1);

        let marked = db.mark_thread_read(bob, alice).unwrap();
        assert_eq!(marked, 2);
        assert_eq!(db.list_conversations(bob).unwrap()[0].unread_count, 0);
        // Alice's unread side is untouched.
        assert_eq!(db.list_conversations(alice).unwrap()[0].unread_count, 1);

        // Already read: nothing left to mark.
        assert_eq!(db.mark_thread_read(bob, alice).unwrap(), 0);
        // No conversation with this stranger yet.
        let carol = seed(&db, "carol");
        assert_eq!(db.mark_thread_read(bob, carol).unwrap(), 0);
    }

    #[test]
    fn test_read_stamps_only_incoming_messages() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");

        db.append_message(alice, bob, "for bob").unwrap();
        db.append_message(bob, alice, "for alice").unwrap();
        db.mark_thread_read(bob, alice).unwrap();

        let thread = db.thread_between(alice, bob).unwrap();
        let for_bob = thread.iter().find(|m| m.content == "for bob").unwrap();
        let for_alice = thread.iter().find(|m| m.content == "for alice").unwrap();
        assert!(for_bob.read_at.is_some());
        assert!(for_alice.read_at.is_none());
    }

    #[test]
    fn test_list_orders_by_recency_with_stable_ties() {
        let db = test_db();
        let me = seed(&db, "me");
        let others: Vec<Uuid> = ["pat", "quinn", "rory"]
            .iter()
            .map(|u| seed(&db, u))
            .collect();

        let mut conversation_ids = vec![];
        for other in &others {
            let row = db.resolve_conversation(me, *other).unwrap();
            conversation_ids.push(Uuid::parse_str(&row.id).unwrap());
        }

        // Timestamps ahead of the creation time so the monotonic touch applies.
        let early = Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap();
        let tie = Utc.with_ymd_and_hms(2030, 1, 2, 9, 30, 0).unwrap();
        db.touch_conversation(conversation_ids[0], tie).unwrap();
        db.touch_conversation(conversation_ids[1], early).unwrap();
        db.touch_conversation(conversation_ids[2], tie).unwrap();

        let listed = db.list_conversations(me).unwrap();
        assert_eq!(listed.len(), 3);
        // The two tied conversations come first, ordered by id; the early one last.
        assert_eq!(listed[2].conversation.id, conversation_ids[1].to_string());
        assert!(listed[0].conversation.id < listed[1].conversation.id);

        // Each summary names the other participant, never the principal.
        for summary in &listed {
            assert_ne!(summary.other.id, me.to_string());
        }
    }

    #[test]
    fn test_touch_never_moves_recency_backwards() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");
        let conversation = db.resolve_conversation(alice, bob).unwrap();
        let id = Uuid::parse_str(&conversation.id).unwrap();

        let future = Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2020, 6, 1, 12, 0, 0).unwrap();
        db.touch_conversation(id, future).unwrap();
        db.touch_conversation(id, past).unwrap();

        let row = db.find_conversation_by_pair(alice, bob).unwrap().unwrap();
        assert_eq!(row.last_message_at, format_ts(future));
    }

    #[test]
    fn test_search_matches_username_and_display_name() {
        let db = test_db();
        let zoe = seed(&db, "zoe");
        let alice = Uuid::new_v4();
        db.upsert_profile(alice, "alice", Some("Wonder"), None).unwrap();
        seed(&db, "alfred");
        seed(&db, "bob");

        let hits = db.search_profiles(zoe, "al", 10).unwrap();
        let names: Vec<&str> = hits.iter().map(|p| p.username.as_str()).collect();
        assert_eq!(names, ["alfred", "alice"]);

        // Case-insensitive.
        let hits = db.search_profiles(zoe, "AL", 10).unwrap();
        assert_eq!(hits.len(), 2);

        // Display name counts too.
        let hits = db.search_profiles(zoe, "wonder", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "alice");

        assert!(db.search_profiles(zoe, "zzz", 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_excludes_principal_and_caps_results() {
        let db = test_db();
        let me = seed(&db, "match_me");
        for i in 0..12 {
            seed(&db, &format!("match_{i:02}"));
        }

        let hits = db.search_profiles(me, "match", 10).unwrap();
        assert_eq!(hits.len(), 10);
        assert!(hits.iter().all(|p| p.id != me.to_string()));
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let db = test_db();
        let me = seed(&db, "me");
        let pct = Uuid::new_v4();
        db.upsert_profile(pct, "pct", Some("100% real"), None).unwrap();
        seed(&db, "plain");
        seed(&db, "un_der");

        let hits = db.search_profiles(me, "0%", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "pct");

        let hits = db.search_profiles(me, "_", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "un_der");
    }

    #[test]
    fn test_profile_upsert_and_ensure_interplay() {
        let db = test_db();
        let id = Uuid::new_v4();

        assert!(db.get_profile(id).unwrap().is_none());

        db.ensure_profile(id, "sam").unwrap();
        let row = db.upsert_profile(id, "sam", Some("Sam Jones"), Some("https://cdn/a.png")).unwrap();
        assert_eq!(row.display_name.as_deref(), Some("Sam Jones"));

        // Re-ensuring from claims must not wipe edited display fields.
        db.ensure_profile(id, "sam").unwrap();
        let row = db.get_profile(id).unwrap().unwrap();
        assert_eq!(row.display_name.as_deref(), Some("Sam Jones"));
        assert_eq!(row.avatar_url.as_deref(), Some("https://cdn/a.png"));

        // Full upsert with None clears the fields.
        let row = db.upsert_profile(id, "sam", None, None).unwrap();
        assert!(row.display_name.is_none());
        assert!(row.avatar_url.is_none());
    }

    #[test]
    fn test_message_constraints_hold() {
        let db = test_db();
        let alice = seed(&db, "alice");
        let bob = seed(&db, "bob");
        let conversation = db.resolve_conversation(alice, bob).unwrap();

        // Empty content is rejected by the schema.
        let empty = db.with_conn(|conn| {
            insert_message_row(conn, &conversation.id, alice, bob, "", &now_ts())
        });
        assert!(empty.is_err());

        // So is a message addressed to its own sender.
        let self_addressed = db.with_conn(|conn| {
            insert_message_row(conn, &conversation.id, alice, alice, "hi me", &now_ts())
        });
        assert!(self_addressed.is_err());
    }
}
