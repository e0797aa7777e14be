//! Change notification for definition collections.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::DefinitionsKind;

/// Published after a collection was replaced and saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionsChanged {
    /// Which collection changed.
    pub kind: DefinitionsKind,
}

/// Handle returned by [`subscribe`](crate::FilesSetsManager::subscribe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Get the raw ID.
    pub fn id(&self) -> u64 {
        self.0
    }
}

type Listener = Arc<dyn Fn(&DefinitionsChanged) + Send + Sync>;

/// Registered listeners, guarded separately from the collections.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Listener)>>,
}

impl Listeners {
    pub(crate) fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&DefinitionsChanged) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Call every listener on the current thread.
    ///
    /// Works on a snapshot so listeners may subscribe or unsubscribe while
    /// being notified.
    pub(crate) fn publish(&self, event: DefinitionsChanged) {
        let snapshot: Vec<Listener> = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::debug!(kind = ?event.kind, listeners = snapshot.len(), "publishing definitions change");
        for listener in snapshot {
            listener(&event);
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners").field("count", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_publish_unsubscribe() {
        let listeners = Listeners::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let id = listeners.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let event = DefinitionsChanged {
            kind: DefinitionsKind::IngestFilters,
        };
        listeners.publish(event);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.publish(event);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let listeners = Listeners::default();
        let a = listeners.subscribe(|_| {});
        let b = listeners.subscribe(|_| {});
        assert_ne!(a, b);
        assert_eq!(listeners.len(), 2);
    }
}
