use async_trait::async_trait;
use uuid::Uuid;

use kaiwa_types::events::FeedEvent;

/// A live stream of events from one sender. Implementations unsubscribe from
/// their feed when dropped, so holding the value IS the subscription.
#[async_trait]
pub trait FeedEvents: Send {
    fn sender_filter(&self) -> Uuid;

    /// Next event from the watched sender. None once the feed has detached
    /// this subscription.
    async fn recv(&mut self) -> Option<FeedEvent>;
}

/// Source of live message events, filtered by sender at subscription time.
#[async_trait]
pub trait LiveFeed: Send + Sync {
    type Subscription: FeedEvents;

    async fn subscribe(&self, sender_id: Uuid) -> Self::Subscription;
}
