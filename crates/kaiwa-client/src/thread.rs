use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use kaiwa_types::events::FeedEvent;
use kaiwa_types::models::{Message, Participant};

use crate::feed::{FeedEvents, LiveFeed};
use crate::store::{ConversationStore, StoreError};

/// What happened to a send request.
#[derive(Debug)]
pub enum SendOutcome {
    /// Stored and visible; the thread has already been refreshed.
    Sent(Message),
    /// Whitespace-only input, dropped locally without a store call.
    Ignored,
}

/// One open two-party thread for one principal.
///
/// Owns a feed subscription filtered on the other participant and keeps the
/// visible message list consistent under overlapping loads: every load gets
/// a sequence token from [`begin_load`](Self::begin_load) and only the
/// latest-issued token may apply its result. Live events never patch the
/// list directly; they trigger a reload.
pub struct ThreadController<S, F: LiveFeed> {
    store: Arc<S>,
    principal: Uuid,
    other: Participant,
    subscription: F::Subscription,
    messages: Vec<Message>,
    latest_token: u64,
}

impl<S: ConversationStore, F: LiveFeed> ThreadController<S, F> {
    /// Open the thread with `other`: subscribe to their live events first,
    /// then load history. Subscribing before loading means a message that
    /// lands mid-load is either in the loaded history or arrives as an event,
    /// never silently missed.
    pub async fn open(
        store: Arc<S>,
        feed: &F,
        principal: Uuid,
        other: Participant,
    ) -> Result<Self, StoreError> {
        let subscription = feed.subscribe(other.id).await;
        let mut controller = Self {
            store,
            principal,
            other,
            subscription,
            messages: Vec::new(),
            latest_token: 0,
        };
        controller.refresh().await?;
        Ok(controller)
    }

    pub fn principal(&self) -> Uuid {
        self.principal
    }

    pub fn other_participant(&self) -> &Participant {
        &self.other
    }

    /// The visible thread, send order preserved; the newest message is last.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Issue a sequence token for a history load. Tokens only grow; issuing a
    /// new one invalidates every response still in flight.
    pub fn begin_load(&mut self) -> u64 {
        self.latest_token += 1;
        self.latest_token
    }

    /// Apply a loaded history if `token` is still the latest issued. Returns
    /// false when the response was stale and discarded.
    pub fn apply_history(&mut self, token: u64, messages: Vec<Message>) -> bool {
        if token != self.latest_token {
            debug!(
                "discarding stale thread load (token {} < {})",
                token, self.latest_token
            );
            return false;
        }
        self.messages = messages;
        true
    }

    /// Reload the thread: issue a token, fetch, apply. A concurrent refresh
    /// started later wins; this one's result is discarded.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let token = self.begin_load();
        let messages = self.store.load_thread(self.principal, self.other.id).await?;
        self.apply_history(token, messages);
        Ok(())
    }

    /// Send a message to the other participant. Whitespace-only input is
    /// dropped locally ([`SendOutcome::Ignored`]); a transient store failure
    /// propagates with the thread unchanged, so the caller may resubmit the
    /// same content.
    pub async fn send(&mut self, content: &str) -> Result<SendOutcome, StoreError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let message = self
            .store
            .send_message(self.principal, self.other.id, trimmed)
            .await?;
        self.refresh().await?;
        Ok(SendOutcome::Sent(message))
    }

    /// The recipient guard: a live event belongs to this thread only when the
    /// other participant sent it to this principal. The sender filter alone
    /// is not enough, since one sender can address many recipients.
    pub fn accepts(&self, event: &FeedEvent) -> bool {
        match event {
            FeedEvent::MessageCreated {
                sender_id,
                recipient_id,
                ..
            } => *sender_id == self.other.id && *recipient_id == self.principal,
            _ => false,
        }
    }

    /// Merge a live event: if the guard accepts it, reload the thread (the
    /// store is the source of truth, events are only a change signal).
    /// Returns whether the event was merged.
    pub async fn on_live_event(&mut self, event: &FeedEvent) -> Result<bool, StoreError> {
        if !self.accepts(event) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    /// Await the next event from the owned subscription. Embedding event
    /// loops select over this alongside their other inputs.
    pub async fn next_live_event(&mut self) -> Option<FeedEvent> {
        self.subscription.recv().await
    }

    /// Mark every unread incoming message in this thread as read.
    pub async fn mark_read(&self) -> Result<u64, StoreError> {
        self.store
            .mark_thread_read(self.principal, self.other.id)
            .await
    }
}
