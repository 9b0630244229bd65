//! Change notification channel.
//!
//! Every cell owns one [`ChangeChannel`]. Host code subscribes to it with
//! `on`; the cell emits to it whenever its value changes (state cells) or
//! it is marked stale (computed cells). Effects are built on top of this.
//!
//! Handlers run synchronously, in subscription order, and receive a
//! reference to the cell that emitted. There is no unsubscribe.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

/// Events a cell can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeEvent {
    /// The cell's value changed, or the cell became stale.
    Changed,
}

type Handler<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// Keyed subscribe/emit facility whose handlers receive a `&S`.
pub struct ChangeChannel<S> {
    handlers: Mutex<IndexMap<ChangeEvent, Vec<Handler<S>>>>,
}

impl<S> ChangeChannel<S> {
    /// Create a channel with no handlers.
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(IndexMap::new()),
        }
    }

    /// Register `handler` for `event`.
    pub fn on<F>(&self, event: ChangeEvent, handler: F)
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.handlers
            .lock()
            .entry(event)
            .or_default()
            .push(Arc::new(handler));
    }

    /// Call every handler registered for `event`, in registration order.
    ///
    /// Walks the live list, so a handler registered during an emit is called
    /// by that same emit. No lock is held while a handler runs.
    pub fn emit(&self, event: ChangeEvent, source: &S) {
        tracing::trace!(?event, handlers = self.handler_count(event), "emitting");

        let mut index = 0;
        loop {
            let next = self
                .handlers
                .lock()
                .get(&event)
                .and_then(|handlers| handlers.get(index).cloned());
            let Some(handler) = next else { break };

            handler(source);
            index += 1;
        }
    }

    /// Number of handlers registered for `event`.
    pub fn handler_count(&self, event: ChangeEvent) -> usize {
        self.handlers.lock().get(&event).map_or(0, Vec::len)
    }
}

impl<S> Default for ChangeChannel<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for ChangeChannel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeChannel")
            .field("changed", &self.handler_count(ChangeEvent::Changed))
            .finish()
    }
}
