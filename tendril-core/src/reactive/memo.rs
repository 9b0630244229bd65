//! Computed Cell Implementation
//!
//! A computed cell is a cached value derived from other cells.
//!
//! # How Computed Cells Work
//!
//! 1. On construction, the cell installs its own recorder as the active
//!    computation and runs its function once. Every cell read during that
//!    run records the new cell as a dependent.
//!
//! 2. When an input changes, the recorder marks the cell stale, emits
//!    [`ChangeEvent::Changed`], and forwards the notification to the cell's
//!    own dependents. Staleness reaches the whole downstream graph before
//!    anything recomputes.
//!
//! 3. The next `get()` on a stale cell reruns the function and clears the
//!    flag. Reading a fresh cell never runs the function.
//!
//! # Dependency Discovery
//!
//! Dependencies are discovered during construction only. Recomputation does
//! not arm the tracking context, so a cell read on a branch that the first
//! run did not take is never tracked:
//!
//! ```rust
//! use tendril_core::reactive::{Computed, StateCell};
//!
//! let flag = StateCell::new(false);
//! let other = StateCell::new(1);
//!
//! let (f, o) = (flag.clone(), other.clone());
//! let picked = Computed::new(move || if f.get() { o.get() } else { 0 }).unwrap();
//!
//! flag.set(true);
//! assert_eq!(picked.get(), 1);
//!
//! // `other` was never recorded, so this change goes unnoticed.
//! other.set(2);
//! assert_eq!(picked.get(), 1);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use super::channel::{ChangeChannel, ChangeEvent};
use super::context::ReactiveContext;
use super::subscriber::{cascade, Dependents, Reactive, Subscriber, SubscriberId};
use crate::error::Result;

struct ComputedInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Identity of this cell's recorder.
    id: SubscriberId,

    compute: Box<dyn Fn() -> T + Send + Sync>,

    /// Cached value. Only `None` while the first evaluation is running.
    value: RwLock<Option<T>>,

    /// Set by upstream changes, cleared by recomputation.
    marked: AtomicBool,

    dependents: Dependents,

    changes: ChangeChannel<Computed<T>>,
}

impl<T> ComputedInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn recompute(&self) -> T {
        tracing::trace!(computed = %self.id, "recomputing stale cell");

        let value = (self.compute)();
        *self.value.write() = Some(value.clone());
        self.marked.store(false, Ordering::SeqCst);

        value
    }
}

impl<T> Reactive for ComputedInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Mark stale, tell listeners, then pass the change downstream.
    fn notify(self: Arc<Self>) {
        self.marked.store(true, Ordering::SeqCst);
        tracing::trace!(computed = %self.id, "marked stale");

        let handle = Computed {
            inner: Arc::clone(&self),
        };
        self.changes.emit(ChangeEvent::Changed, &handle);
        cascade(&self.dependents);
    }
}

/// A cached value derived from other cells.
///
/// Clones share the same cell.
pub struct Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<ComputedInner<T>>,
}

impl<T> Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a computed cell, evaluating `compute` once to discover its
    /// inputs.
    ///
    /// Fails with [`ReactiveError::InvalidNesting`](crate::ReactiveError)
    /// if another computation is being evaluated on this thread. In that
    /// case `compute` is never called and no dependency is recorded.
    pub fn new<F>(compute: F) -> Result<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let inner = Arc::new(ComputedInner {
            id: SubscriberId::new(),
            compute: Box::new(compute),
            value: RwLock::new(None),
            marked: AtomicBool::new(false),
            dependents: Mutex::new(SmallVec::new()),
            changes: ChangeChannel::new(),
        });

        let target: Arc<dyn Reactive> = inner.clone();
        let recorder = Subscriber::from_reactive(inner.id, target);

        let initial = {
            let _ctx = ReactiveContext::enter(recorder)?;
            (inner.compute)()
        };
        *inner.value.write() = Some(initial);

        tracing::debug!(computed = %inner.id, "created computed cell");
        Ok(Self { inner })
    }

    /// The ID of the recorder this cell leaves in its inputs.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Get the current value, recomputing first if the cell is stale.
    ///
    /// If a computation is being evaluated, it is recorded as a dependent.
    pub fn get(&self) -> T {
        ReactiveContext::track(&self.inner.dependents);

        if !self.is_stale() {
            if let Some(value) = self.inner.value.read().as_ref() {
                return value.clone();
            }
        }

        self.inner.recompute()
    }

    /// Whether an input changed since the last evaluation.
    pub fn is_stale(&self) -> bool {
        self.inner.marked.load(Ordering::SeqCst)
    }

    /// Register a handler that runs each time the cell is marked stale.
    ///
    /// The handler runs before the staleness reaches downstream dependents.
    pub fn on_change<F>(&self, handler: F)
    where
        F: Fn(&Computed<T>) + Send + Sync + 'static,
    {
        self.inner.changes.on(ChangeEvent::Changed, handler);
    }

    /// Number of recorded dependents, duplicates included.
    pub fn dependent_count(&self) -> usize {
        self.inner.dependents.lock().len()
    }

    /// Check whether two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Clone for Computed<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.read())
            .field("stale", &self.is_stale())
            .field("dependent_count", &self.dependent_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
