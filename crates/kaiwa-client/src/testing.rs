//! Shared fixtures for controller tests: an in-memory store with fault
//! injection, and a feed adapter over the real dispatcher so subscription
//! tests exercise the production filter and drop semantics.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use kaiwa_gateway::dispatcher::{Dispatcher, FeedSubscription};
use kaiwa_types::events::FeedEvent;
use kaiwa_types::models::{Conversation, ConversationSummary, Message, Participant};

use crate::feed::{FeedEvents, LiveFeed};
use crate::store::{ConversationStore, StoreError};

pub fn participant(username: &str) -> Participant {
    Participant {
        id: Uuid::new_v4(),
        username: username.into(),
        display_name: None,
        avatar_url: None,
    }
}

pub fn message(sender: Uuid, recipient: Uuid, content: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        conversation_id: Uuid::new_v4(),
        sender_id: sender,
        recipient_id: recipient,
        content: content.into(),
        created_at: Utc::now(),
        read_at: None,
    }
}

fn pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Default)]
pub struct MockStore {
    pub state: Mutex<MockState>,
    pub fail_next_send: AtomicBool,
    pub load_calls: AtomicUsize,
}

#[derive(Default)]
pub struct MockState {
    pub threads: HashMap<(Uuid, Uuid), Vec<Message>>,
    pub summaries: Vec<ConversationSummary>,
    pub participants: Vec<Participant>,
    pub conversations: HashMap<(Uuid, Uuid), Conversation>,
    pub list_calls: usize,
    pub resolve_calls: usize,
    pub search_calls: usize,
    pub marked: Vec<(Uuid, Uuid)>,
}

impl MockStore {
    pub fn seed_thread(&self, a: Uuid, b: Uuid, messages: Vec<Message>) {
        self.state.lock().unwrap().threads.insert(pair(a, b), messages);
    }

    pub fn seed_participants(&self, participants: Vec<Participant>) {
        self.state.lock().unwrap().participants = participants;
    }

    pub fn seed_summaries(&self, summaries: Vec<ConversationSummary>) {
        self.state.lock().unwrap().summaries = summaries;
    }
}

#[async_trait]
impl ConversationStore for MockStore {
    async fn list_conversations(
        &self,
        _principal: Uuid,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        Ok(state.summaries.clone())
    }

    async fn load_thread(
        &self,
        principal: Uuid,
        other: Uuid,
    ) -> Result<Vec<Message>, StoreError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(state
            .threads
            .get(&pair(principal, other))
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        principal: Uuid,
        recipient: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection reset".into()));
        }
        let message = message(principal, recipient, content);
        let mut state = self.state.lock().unwrap();
        state
            .threads
            .entry(pair(principal, recipient))
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn resolve_conversation(
        &self,
        principal: Uuid,
        target: Uuid,
    ) -> Result<Conversation, StoreError> {
        if principal == target {
            return Err(StoreError::Invalid("self conversation".into()));
        }
        let mut state = self.state.lock().unwrap();
        state.resolve_calls += 1;
        let key = pair(principal, target);
        let conversation = state.conversations.entry(key).or_insert_with(|| Conversation {
            id: Uuid::new_v4(),
            participant_one_id: key.0,
            participant_two_id: key.1,
            created_at: Utc::now(),
            last_message_at: Utc::now(),
        });
        Ok(conversation.clone())
    }

    async fn search_participants(
        &self,
        principal: Uuid,
        query: &str,
    ) -> Result<Vec<Participant>, StoreError> {
        let needle = query.to_lowercase();
        let mut state = self.state.lock().unwrap();
        state.search_calls += 1;
        Ok(state
            .participants
            .iter()
            .filter(|p| p.id != principal)
            .filter(|p| {
                p.username.to_lowercase().contains(&needle)
                    || p.display_name
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn mark_thread_read(&self, principal: Uuid, other: Uuid) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.marked.push((principal, other));
        let marked = state
            .threads
            .get_mut(&pair(principal, other))
            .map(|messages| {
                let mut n = 0;
                for m in messages.iter_mut() {
                    if m.recipient_id == principal && m.read_at.is_none() {
                        m.read_at = Some(Utc::now());
                        n += 1;
                    }
                }
                n
            })
            .unwrap_or(0);
        Ok(marked)
    }
}

/// LiveFeed over the real dispatcher.
#[derive(Clone, Default)]
pub struct TestFeed(pub Dispatcher);

pub struct TestSubscription(FeedSubscription);

#[async_trait]
impl FeedEvents for TestSubscription {
    fn sender_filter(&self) -> Uuid {
        self.0.sender_filter()
    }

    async fn recv(&mut self) -> Option<FeedEvent> {
        self.0.recv().await
    }
}

#[async_trait]
impl LiveFeed for TestFeed {
    type Subscription = TestSubscription;

    async fn subscribe(&self, sender_id: Uuid) -> TestSubscription {
        TestSubscription(self.0.subscribe(sender_id))
    }
}
