use std::sync::Arc;

use uuid::Uuid;

use kaiwa_types::models::{ConversationSummary, Participant};

use crate::feed::LiveFeed;
use crate::store::{ConversationStore, StoreError};
use crate::thread::ThreadController;

/// The conversation list plus at most one open thread.
///
/// `principal` is optional: with no signed-in principal every operation
/// degrades to an empty result or a no-op instead of failing, so the owner
/// can keep one controller around across sign-in state changes.
pub struct ConversationListController<S, F: LiveFeed> {
    store: Arc<S>,
    feed: F,
    principal: Option<Uuid>,
    conversations: Vec<ConversationSummary>,
    active: Option<ThreadController<S, F>>,
}

impl<S: ConversationStore, F: LiveFeed> ConversationListController<S, F> {
    pub fn new(store: Arc<S>, feed: F, principal: Option<Uuid>) -> Self {
        Self {
            store,
            feed,
            principal,
            conversations: Vec::new(),
            active: None,
        }
    }

    pub fn principal(&self) -> Option<Uuid> {
        self.principal
    }

    /// Summaries as of the last refresh, most recent activity first.
    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn active_thread(&self) -> Option<&ThreadController<S, F>> {
        self.active.as_ref()
    }

    pub fn active_thread_mut(&mut self) -> Option<&mut ThreadController<S, F>> {
        self.active.as_mut()
    }

    /// Re-fetch the summaries. Read-only and idempotent; safe to call on any
    /// schedule.
    pub async fn refresh(&mut self) -> Result<(), StoreError> {
        let Some(principal) = self.principal else {
            self.conversations.clear();
            return Ok(());
        };
        self.conversations = self.store.list_conversations(principal).await?;
        Ok(())
    }

    /// Open the thread with `other`, replacing any current one. The old
    /// thread drops before the new subscription attaches, so no stale sender
    /// filter survives the switch.
    pub async fn select(&mut self, other: Participant) -> Result<(), StoreError> {
        let Some(principal) = self.principal else {
            return Ok(());
        };
        self.active = None;
        let thread =
            ThreadController::open(self.store.clone(), &self.feed, principal, other).await?;
        self.active = Some(thread);
        Ok(())
    }

    /// Finder hand-off: resolve the conversation with `target`, refresh the
    /// list so it appears, then select it. Returns the conversation id, or
    /// None when no principal is signed in.
    pub async fn open_with(&mut self, target: Participant) -> Result<Option<Uuid>, StoreError> {
        let Some(principal) = self.principal else {
            return Ok(None);
        };
        let conversation = self.store.resolve_conversation(principal, target.id).await?;
        self.refresh().await?;
        self.select(target).await?;
        Ok(Some(conversation.id))
    }

    /// Close the open thread; its feed subscription drops with it.
    pub fn close_thread(&mut self) {
        self.active = None;
    }

    /// Hook for after a send: recency changed, so the list re-sorts.
    pub async fn after_send(&mut self) -> Result<(), StoreError> {
        self.refresh().await
    }
}
