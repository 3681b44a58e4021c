//! Listener registrations.
//!
//! A listener is a callback registered on a cell that runs with the new value
//! the next time the cell changes. Every registration is keyed by a
//! [`ListenerId`], so registering the same id twice keeps a single entry.
//! This is how a derived cell that reads the same dependency several times in
//! one pass ends up subscribed only once.
//!
//! Listeners are one-shot. A cell takes its whole listener set out (leaving an
//! empty one behind) before notifying, so a listener fires at most once per
//! registration. Derived cells stay subscribed by re-registering whenever they
//! recompute.

use std::fmt;
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

/// Callback invoked with a cell's new value.
pub type Listener<T> = Box<dyn FnOnce(&T)>;

/// Unique identifier for a listener registration.
///
/// Derived cells allocate one id at construction and reuse it for every
/// dependency they subscribe to; external subscriptions get a fresh id each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Insertion-ordered set of pending listeners.
pub struct ListenerSet<T> {
    entries: IndexMap<ListenerId, Listener<T>>,
}

impl<T> ListenerSet<T> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Register `listener` under `id`.
    ///
    /// An existing entry with the same id keeps its position and has its
    /// callback replaced.
    pub fn insert(&mut self, id: ListenerId, listener: Listener<T>) {
        self.entries.insert(id, listener);
    }

    /// Remove the listener registered under `id`.
    ///
    /// Returns whether it was still pending.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.entries.shift_remove(&id).is_some()
    }

    pub fn contains(&self, id: ListenerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take every pending listener, leaving this set empty.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Invoke every listener in registration order, consuming the set.
    pub fn notify(self, value: &T) {
        for (_, listener) in self.entries {
            listener(value);
        }
    }
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

/// Something listeners can be removed from.
///
/// Implemented by every cell regardless of its value type, so that a
/// [`Detach`] handle does not need to know the type of the cell it points at.
pub(crate) trait Notifier {
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// Handle returned by a registration; removes it again on request.
///
/// Dropping the handle does nothing. A registration that is never detached
/// simply fires on the next change and is gone afterwards.
pub struct Detach {
    source: Weak<dyn Notifier>,
    id: ListenerId,
}

impl Detach {
    pub(crate) fn new(source: Weak<dyn Notifier>, id: ListenerId) -> Self {
        Self { source, id }
    }

    /// The id of the registration this handle removes.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Remove the registration.
    ///
    /// Returns `false` if it already fired, was already removed, or the cell
    /// no longer exists.
    pub fn detach(self) -> bool {
        match self.source.upgrade() {
            Some(source) => source.remove_listener(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for Detach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detach")
            .field("id", &self.id)
            .field("live", &(self.source.strong_count() > 0))
            .finish()
    }
}
