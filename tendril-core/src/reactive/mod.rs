//! Reactive Primitives
//!
//! This module implements the signal graph: state cells, computed cells,
//! and effects, wired together by a thread-local tracking context.
//!
//! # Concepts
//!
//! ## State Cells
//!
//! A [`StateCell`] holds a value set from outside the graph. Reading it while
//! a computation is being evaluated records that computation as a dependent.
//! Setting it to a different value notifies its change channel, then every
//! recorded dependent, synchronously and in recording order.
//!
//! ## Computed Cells
//!
//! A [`Computed`] cell caches a value derived from other cells. It discovers
//! its inputs during construction only, is marked stale when any of them
//! changes, and recomputes lazily on the next read.
//!
//! ## Effects
//!
//! An [`Effect`] re-runs a side-effecting function whenever its inputs
//! change, running the cleanups queued by the previous run first.
//!
//! # Implementation Notes
//!
//! Propagation is push-based and immediate: there is no batching, no
//! deduplication of dependents and no edge removal. A computation reachable
//! through two paths from the same change is notified twice.

mod api;
mod channel;
mod context;
mod effect;
mod memo;
mod signal;
mod subscriber;

pub use api::{create_effect, create_memo, create_signal, Getter, Memo, Setter};
pub use channel::{ChangeChannel, ChangeEvent};
pub use context::{untracked, ReactiveContext, UntrackedScope};
pub use effect::{Effect, EffectContext};
pub use memo::Computed;
#[cfg(feature = "python")]
pub use signal::PySignal;
pub use signal::StateCell;
pub use subscriber::{Reactive, Subscriber, SubscriberId};
