//! Observer lists - synchronous notification channels

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Observer handler function type
pub type ObserverHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Source of subscriber ids, shared by every list so ids never collide
static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Subscriber ID, unique across all observer lists
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Subscribers to one kind of notification.
///
/// Handlers run on the notifying thread, in subscription order. The list
/// is snapshotted before dispatch, so a handler may subscribe or
/// unsubscribe without deadlocking.
pub struct ObserverList<E> {
    handlers: RwLock<Vec<(SubscriberId, ObserverHandler<E>)>>,
}

impl<E> ObserverList<E> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe a handler
    pub fn subscribe<F>(&self, handler: F) -> SubscriberId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriberId(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((id, Arc::new(handler)));
        id
    }

    /// Unsubscribe. Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut handlers = self.handlers.write();
        let before = handlers.len();
        handlers.retain(|(sub_id, _)| *sub_id != id);
        handlers.len() != before
    }

    /// Invoke every handler with `event`
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<ObserverHandler<E>> = self
            .handlers
            .read()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in snapshot {
            handler(event);
        }
    }

    /// Number of subscribers
    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl<E> Default for ObserverList<E> {
    fn default() -> Self {
        Self::new()
    }
}
