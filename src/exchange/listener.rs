/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Exchange listener registration and fan-out.

use crate::protocol::ExchangeEvent;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Callback invoked for each exchange event.
pub type ExchangeListener = Arc<dyn Fn(&ExchangeEvent) + Send + Sync>;

/// Handle returned on registration, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Ordered set of listeners.
///
/// [`notify`](Self::notify) works on a snapshot taken when the event starts
/// fanning out: a listener removed before that point never sees the event,
/// one removed while the event is in flight may still see it.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(ListenerId, ExchangeListener)>>,
}

impl ListenerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener; listeners are notified in registration order.
    pub fn add(&self, listener: ExchangeListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Invokes every registered listener with `event`, synchronously and in
    /// registration order.
    pub fn notify(&self, event: &ExchangeEvent) {
        let snapshot: Vec<ExchangeListener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_registration_order_and_removal() {
        let registry = ListenerRegistry::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        let ids: Vec<ListenerId> = (0..3)
            .map(|n| {
                let calls = calls.clone();
                registry.add(Arc::new(move |_event: &ExchangeEvent| {
                    calls.lock().unwrap().push(n)
                }))
            })
            .collect();

        registry.notify(&ExchangeEvent::Opened);
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2]);

        assert!(registry.remove(ids[1]));
        assert!(!registry.remove(ids[1]));
        registry.notify(&ExchangeEvent::Closed);
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2, 0, 2]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_listener_may_remove_itself() {
        let registry = Arc::new(ListenerRegistry::new());
        let hits = Arc::new(AtomicU64::new(0));
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let id = {
            let registry = registry.clone();
            let hits = hits.clone();
            let slot = slot.clone();
            registry.clone().add(Arc::new(move |_event: &ExchangeEvent| {
                hits.fetch_add(1, Ordering::Relaxed);
                if let Some(id) = *slot.lock().unwrap() {
                    registry.remove(id);
                }
            }))
        };
        *slot.lock().unwrap() = Some(id);

        registry.notify(&ExchangeEvent::Opened);
        registry.notify(&ExchangeEvent::Opened);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert!(registry.is_empty());
    }
}
