//! In-process bindings for the kaiwa-client controllers: a store backed by
//! the local database and a feed backed by the local dispatcher. Embedded
//! setups and the integration tests run the full controller stack through
//! these without any HTTP in between.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use kaiwa_client::feed::{FeedEvents, LiveFeed};
use kaiwa_client::store::{ConversationStore, StoreError};
use kaiwa_db::Database;
use kaiwa_gateway::dispatcher::{Dispatcher, FeedSubscription};
use kaiwa_types::events::FeedEvent;
use kaiwa_types::models::{Conversation, ConversationSummary, Message, Participant};

// Same cap the REST surface applies to finder queries.
const SEARCH_LIMIT: u32 = 10;

/// Store over the local database. Sends publish to the dispatcher, so live
/// feeds observe in-process traffic the same way they observe REST traffic.
///
/// Profiles are not provisioned here; embedded callers create them through
/// [`Database::upsert_profile`] before opening a session.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
    dispatcher: Dispatcher,
}

impl LocalStore {
    pub fn new(db: Arc<Database>, dispatcher: Dispatcher) -> Self {
        Self { db, dispatcher }
    }
}

fn storage(e: anyhow::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn join_error(e: tokio::task::JoinError) -> StoreError {
    StoreError::Unavailable(format!("blocking task failed: {}", e))
}

#[async_trait]
impl ConversationStore for LocalStore {
    async fn list_conversations(
        &self,
        principal: Uuid,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let db = self.db.clone();
        let rows = tokio::task::spawn_blocking(move || db.list_conversations(principal))
            .await
            .map_err(join_error)?
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| row.into_summary().map_err(storage))
            .collect()
    }

    async fn load_thread(
        &self,
        principal: Uuid,
        other: Uuid,
    ) -> Result<Vec<Message>, StoreError> {
        let db = self.db.clone();
        let rows = tokio::task::spawn_blocking(move || db.thread_between(principal, other))
            .await
            .map_err(join_error)?
            .map_err(storage)?;
        rows.into_iter()
            .map(|row| row.into_message().map_err(storage))
            .collect()
    }

    async fn send_message(
        &self,
        principal: Uuid,
        recipient: Uuid,
        content: &str,
    ) -> Result<Message, StoreError> {
        if principal == recipient {
            return Err(StoreError::Invalid("cannot message yourself".into()));
        }

        let db = self.db.clone();
        let content = content.to_string();
        let message =
            tokio::task::spawn_blocking(move || -> Result<Message, StoreError> {
                if db.get_profile(recipient).map_err(storage)?.is_none() {
                    return Err(StoreError::Invalid("participant not found".into()));
                }
                let (_, row) = db
                    .append_message(principal, recipient, &content)
                    .map_err(storage)?;
                row.into_message().map_err(storage)
            })
            .await
            .map_err(join_error)??;

        let delivered = self.dispatcher.publish(FeedEvent::message_created(&message));
        debug!(
            "message {} stored, published to {} feed subscriber(s)",
            message.id, delivered
        );
        Ok(message)
    }

    async fn resolve_conversation(
        &self,
        principal: Uuid,
        target: Uuid,
    ) -> Result<Conversation, StoreError> {
        if principal == target {
            return Err(StoreError::Invalid(
                "cannot open a conversation with yourself".into(),
            ));
        }

        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Conversation, StoreError> {
            if db.get_profile(target).map_err(storage)?.is_none() {
                return Err(StoreError::Invalid("participant not found".into()));
            }
            let row = db.resolve_conversation(principal, target).map_err(storage)?;
            row.into_conversation().map_err(storage)
        })
        .await
        .map_err(join_error)?
    }

    async fn search_participants(
        &self,
        principal: Uuid,
        query: &str,
    ) -> Result<Vec<Participant>, StoreError> {
        let db = self.db.clone();
        let query = query.to_string();
        let rows =
            tokio::task::spawn_blocking(move || db.search_profiles(principal, &query, SEARCH_LIMIT))
                .await
                .map_err(join_error)?
                .map_err(storage)?;
        rows.into_iter()
            .map(|row| row.into_participant().map_err(storage))
            .collect()
    }

    async fn mark_thread_read(&self, principal: Uuid, other: Uuid) -> Result<u64, StoreError> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.mark_thread_read(principal, other))
            .await
            .map_err(join_error)?
            .map_err(storage)
    }
}

/// Feed over the local dispatcher.
#[derive(Clone)]
pub struct LocalFeed(pub Dispatcher);

pub struct LocalSubscription(FeedSubscription);

#[async_trait]
impl FeedEvents for LocalSubscription {
    fn sender_filter(&self) -> Uuid {
        self.0.sender_filter()
    }

    async fn recv(&mut self) -> Option<FeedEvent> {
        self.0.recv().await
    }
}

#[async_trait]
impl LiveFeed for LocalFeed {
    type Subscription = LocalSubscription;

    async fn subscribe(&self, sender_id: Uuid) -> LocalSubscription {
        LocalSubscription(self.0.subscribe(sender_id))
    }
}
