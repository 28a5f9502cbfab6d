use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use uuid::Uuid;

use kaiwa_types::events::FeedEvent;

/// Routes message events to live feed subscribers. Every subscription names
/// the sender it wants to hear from; an event only reaches subscribers whose
/// filter matches the event's sender.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// subscriber_id -> (sender filter, outbound channel).
    /// std RwLock rather than the tokio one: entries are detached from Drop
    /// impls, which cannot await.
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
}

struct Subscriber {
    sender_filter: Uuid,
    tx: mpsc::UnboundedSender<FeedEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                subscribers: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register an existing outbound channel under a sender filter. Used by
    /// connections that fan several subscriptions into one socket.
    /// Returns the subscriber id needed to detach later.
    pub fn attach(&self, sender_filter: Uuid, tx: mpsc::UnboundedSender<FeedEvent>) -> Uuid {
        let id = Uuid::new_v4();
        self.subscribers_mut().insert(id, Subscriber { sender_filter, tx });
        id
    }

    /// Remove a subscription. Unknown ids are ignored, so detaching twice
    /// (or after a publish already pruned the entry) is harmless.
    pub fn detach(&self, id: Uuid) {
        self.subscribers_mut().remove(&id);
    }

    /// Open a self-cleaning subscription for events from one sender.
    pub fn subscribe(&self, sender_filter: Uuid) -> FeedSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.attach(sender_filter, tx);
        FeedSubscription {
            id,
            sender_filter,
            rx,
            dispatcher: self.clone(),
        }
    }

    /// Deliver an event to every subscriber filtering on its sender.
    /// Subscribers whose receiver is gone are pruned on the way through.
    /// Returns how many subscribers got a copy.
    pub fn publish(&self, event: FeedEvent) -> usize {
        let Some(sender_id) = event.sender_id() else {
            return 0;
        };

        let mut delivered = 0;
        self.subscribers_mut().retain(|_, subscriber| {
            if subscriber.sender_filter != sender_id {
                return true;
            }
            match subscriber.tx.send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers().len()
    }

    pub fn is_subscribed(&self, sender_filter: Uuid) -> bool {
        self.subscribers()
            .values()
            .any(|s| s.sender_filter == sender_filter)
    }

    fn subscribers(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Subscriber>> {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Subscriber>> {
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// A live feed subscription. Dropping it detaches from the dispatcher, so a
/// subscription cannot outlive its owner.
pub struct FeedSubscription {
    id: Uuid,
    sender_filter: Uuid,
    rx: mpsc::UnboundedReceiver<FeedEvent>,
    dispatcher: Dispatcher,
}

impl FeedSubscription {
    pub fn sender_filter(&self) -> Uuid {
        self.sender_filter
    }

    /// Wait for the next event. Returns None once the subscription has been
    /// detached on the dispatcher side.
    pub async fn recv(&mut self) -> Option<FeedEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll for a pending event.
    pub fn try_recv(&mut self) -> Option<FeedEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.dispatcher.detach(self.id);
    }
}
