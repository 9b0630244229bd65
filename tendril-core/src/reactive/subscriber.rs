//! Subscriber types for the reactive system.
//!
//! A Subscriber is the recorder token a computation leaves behind in every
//! cell it reads while tracking is active. When the cell changes, it calls
//! `notify()` on each recorded subscriber, in the order they were recorded.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

/// Unique identifier for a subscriber.
///
/// Used for logging and introspection only. Cells never deduplicate
/// subscribers by ID: reading a cell twice records the subscriber twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that can be told "one of your inputs changed".
///
/// Computed cells implement this as mark-stale-then-cascade. The receiver is
/// an `Arc` so implementors can hand out a handle to themselves while
/// notifying their own listeners.
pub trait Reactive: Send + Sync {
    /// React to an upstream change.
    fn notify(self: Arc<Self>);
}

/// Adapter that lets a plain closure act as a recorder target.
struct FnReactive<F>(F);

impl<F> Reactive for FnReactive<F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn notify(self: Arc<Self>) {
        (self.0)();
    }
}

/// A recorder: one computation instance, as seen by the cells it read.
///
/// Cloning is cheap and yields the same recorder.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    target: Arc<dyn Reactive>,
}

impl Subscriber {
    /// Create a subscriber that invokes `notify` when a dependency changes.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::from_reactive(SubscriberId::new(), Arc::new(FnReactive(notify)))
    }

    /// Wrap an existing reactive target under the given ID.
    pub fn from_reactive(id: SubscriberId, target: Arc<dyn Reactive>) -> Self {
        Self { id, target }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Notify the subscriber that one of its dependencies changed.
    pub fn notify(&self) {
        Arc::clone(&self.target).notify();
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Append-only list of recorders held by a cell, in recording order.
pub(crate) type Dependents = Mutex<SmallVec<[Subscriber; 4]>>;

/// Invoke every recorder in `dependents`, in order.
///
/// Walks the live list: a recorder appended while the cascade is running is
/// invoked by this same cascade. The lock is only held to fetch each entry.
pub(crate) fn cascade(dependents: &Dependents) {
    let mut index = 0;
    loop {
        let next = dependents.lock().get(index).cloned();
        let Some(subscriber) = next else { break };

        tracing::trace!(subscriber = %subscriber.id(), "cascading change");
        subscriber.notify();
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_ids_are_unique() {
        let id1 = SubscriberId::new();
        let id2 = SubscriberId::new();
        let id3 = SubscriberId::new();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn subscriber_notify_calls_callback() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();

        let subscriber = Subscriber::new(move || {
            called_clone.store(true, Ordering::SeqCst);
        });

        assert!(!called.load(Ordering::SeqCst));
        subscriber.notify();
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn clones_share_identity_and_target() {
        use std::sync::atomic::{AtomicI32, Ordering};

        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let subscriber = Subscriber::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        let copy = subscriber.clone();

        assert_eq!(subscriber.id(), copy.id());

        subscriber.notify();
        copy.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cascade_runs_in_recording_order_including_duplicates() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let first = {
            let order = order.clone();
            Subscriber::new(move || order.lock().push("first"))
        };
        let second = {
            let order = order.clone();
            Subscriber::new(move || order.lock().push("second"))
        };

        let dependents: Dependents = Mutex::new(SmallVec::new());
        dependents.lock().push(first.clone());
        dependents.lock().push(second);
        dependents.lock().push(first);

        cascade(&dependents);
        assert_eq!(*order.lock(), vec!["first", "second", "first"]);
    }

    #[test]
    fn recorder_appended_during_cascade_runs_in_same_pass() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let dependents: Arc<Dependents> = Arc::new(Mutex::new(SmallVec::new()));

        let late = {
            let order = order.clone();
            Subscriber::new(move || order.lock().push("late"))
        };
        let first = {
            let order = order.clone();
            let list = Arc::downgrade(&dependents);
            Subscriber::new(move || {
                order.lock().push("first");
                if let Some(list) = list.upgrade() {
                    list.lock().push(late.clone());
                }
            })
        };
        dependents.lock().push(first);

        cascade(&dependents);
        assert_eq!(*order.lock(), vec!["first", "late"]);
        assert_eq!(dependents.lock().len(), 2);
    }
}
