//! Generic observer registration.
//!
//! One [`ListenerSet`] backs each listener family (mouse, mouse-motion,
//! action, property-change). GUI event threads and application threads may
//! touch the same set concurrently, so the list lives behind an `RwLock`
//! and enumeration always returns a point-in-time copy, never a live view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by listener registration, used for removal. Ids are
/// unique across every listener set in the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// A registered callback for events of type `E`.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Registration list for one listener family.
pub struct ListenerSet<E> {
    entries: RwLock<Vec<(ListenerId, Listener<E>)>>,
}

impl<E> ListenerSet<E> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn add(&self, listener: Listener<E>) -> ListenerId {
        let id = ListenerId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        self.entries.write().unwrap().push((id, listener));
        id
    }

    /// Removes a registration. Unknown ids are ignored.
    pub fn remove(&self, id: ListenerId) {
        self.entries.write().unwrap().retain(|(entry, _)| *entry != id);
    }

    /// A point-in-time copy of the registered listeners.
    pub fn snapshot(&self) -> Vec<Listener<E>> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `event` to a snapshot of the current listeners. Listeners
    /// added or removed during delivery take effect on the next event.
    pub fn notify(&self, event: &E) {
        for listener in self.snapshot() {
            listener(event);
        }
    }
}

impl<E> Default for ListenerSet<E> {
    fn default() -> Self {
        Self::new()
    }
}
