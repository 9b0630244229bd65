//! Error types for the signal graph.
//!
//! Only cell construction can fail. Reads, writes, untracked scopes and
//! effect re-runs are total; panics raised by user compute functions
//! propagate to whoever triggered the evaluation.

use thiserror::Error;

use crate::reactive::SubscriberId;

/// Errors produced by the reactive runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReactiveError {
    /// A computed cell was constructed while another computation was
    /// being evaluated on this thread.
    #[error("cannot create a computed cell while computation {active} is being evaluated")]
    InvalidNesting {
        /// The subscriber that held the tracking context at the time.
        active: SubscriberId,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = ReactiveError> = std::result::Result<T, E>;
