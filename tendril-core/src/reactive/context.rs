//! Reactive Context
//!
//! The reactive context tracks which computation is currently being
//! evaluated. When a cell is read, the active computation (if any) is
//! recorded as one of the cell's dependents.
//!
//! # Implementation
//!
//! Each thread owns a single slot holding at most one active subscriber.
//! Unlike a stack, the slot cannot nest: entering a context while another is
//! active is rejected with [`ReactiveError::InvalidNesting`]. The only way to
//! temporarily clear the slot is [`untracked`], which saves the current
//! subscriber and restores it afterwards.
//!
//! Both operations hand back guards that restore the slot on drop, so the
//! context stays consistent even if user code panics.

use std::cell::RefCell;

use super::subscriber::{Dependents, Subscriber};
use super::SubscriberId;
use crate::error::{ReactiveError, Result};

thread_local! {
    /// The computation currently being evaluated on this thread, if any.
    static ACTIVE: RefCell<Option<Subscriber>> = RefCell::new(None);
}

/// Guard that clears the context when dropped.
pub struct ReactiveContext {
    subscriber_id: SubscriberId,
}

impl ReactiveContext {
    /// Make `subscriber` the active computation.
    ///
    /// While the returned guard lives, every tracked read records
    /// `subscriber` as a dependent of the cell being read.
    pub fn enter(subscriber: Subscriber) -> Result<Self> {
        let subscriber_id = subscriber.id();

        ACTIVE.with(|slot| {
            let mut slot = slot.borrow_mut();
            if let Some(active) = slot.as_ref() {
                tracing::debug!(
                    active = %active.id(),
                    rejected = %subscriber_id,
                    "rejecting nested computation"
                );
                return Err(ReactiveError::InvalidNesting {
                    active: active.id(),
                });
            }
            *slot = Some(subscriber);
            Ok(())
        })?;

        Ok(Self { subscriber_id })
    }

    /// Check if there is an active reactive context.
    pub fn is_active() -> bool {
        ACTIVE.with(|slot| slot.borrow().is_some())
    }

    /// Get the current subscriber, if any.
    pub fn current_subscriber() -> Option<Subscriber> {
        ACTIVE.with(|slot| slot.borrow().clone())
    }

    /// Record the active subscriber, if any, as a dependent.
    ///
    /// Duplicates are kept: a computation that reads the same cell twice is
    /// recorded twice.
    pub(crate) fn track(dependents: &Dependents) {
        if let Some(subscriber) = Self::current_subscriber() {
            tracing::trace!(subscriber = %subscriber.id(), "recording dependency");
            dependents.lock().push(subscriber);
        }
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let popped = ACTIVE.with(|slot| slot.borrow_mut().take());

        if let Some(entry) = popped {
            debug_assert_eq!(
                entry.id(),
                self.subscriber_id,
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.subscriber_id,
                entry.id()
            );
        }
    }
}

/// Guard that suspends dependency tracking until dropped.
///
/// Prefer [`untracked`] unless the scope has to outlive a single closure.
pub struct UntrackedScope {
    saved: Option<Subscriber>,
}

impl UntrackedScope {
    /// Clear the context, remembering whatever was active.
    pub fn new() -> Self {
        let saved = ACTIVE.with(|slot| slot.borrow_mut().take());
        Self { saved }
    }
}

impl Default for UntrackedScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UntrackedScope {
    fn drop(&mut self) {
        let saved = self.saved.take();
        ACTIVE.with(|slot| *slot.borrow_mut() = saved);
    }
}

/// Run `f` without recording any dependencies, then restore the previous
/// tracking state.
///
/// Scopes nest freely. The previous state is restored even if `f` panics.
pub fn untracked<T, F>(f: F) -> T
where
    F: FnOnce() -> T,
{
    let _scope = UntrackedScope::new();
    f()
}
