//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever one of
//! its dependencies changes.
//!
//! # How Effects Work
//!
//! An effect is a computed cell of `()` wrapping the user function, plus a
//! handler on that cell's change channel. Creating the effect runs the
//! function once, which is when its dependencies are discovered. When the
//! cell is marked stale the handler:
//!
//! 1. runs every cleanup queued with [`EffectContext::defer`] during the
//!    previous run, in queue order, and empties the queue. A cleanup that
//!    defers another cleanup has it run in the same pass;
//!
//! 2. reads the cell, which recomputes it and so runs the function again.
//!
//! Effects never tear themselves down. They live as long as some cell they
//! read is alive, whether or not the [`Effect`] handle is kept.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::memo::Computed;
use super::subscriber::SubscriberId;
use crate::error::Result;

type Cleanup = Box<dyn FnOnce() + Send>;

/// Handed to the effect function on every run.
#[derive(Clone)]
pub struct EffectContext {
    cleanups: Arc<Mutex<Vec<Cleanup>>>,
}

impl EffectContext {
    /// Queue `cleanup` to run right before the next re-run of the effect.
    pub fn defer<F>(&self, cleanup: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cleanups.lock().push(Box::new(cleanup));
    }
}

impl std::fmt::Debug for EffectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectContext")
            .field("pending_cleanups", &self.cleanups.lock().len())
            .finish()
    }
}

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust
/// use tendril_core::reactive::{Effect, StateCell};
///
/// let count = StateCell::new(0);
/// let reader = count.clone();
///
/// let effect = Effect::new(move |ctx| {
///     let value = reader.get();
///     ctx.defer(move || println!("leaving {value}"));
/// })
/// .unwrap();
///
/// count.set(5);
/// assert_eq!(effect.run_count(), 2);
/// ```
pub struct Effect {
    cell: Computed<()>,
    cleanups: Arc<Mutex<Vec<Cleanup>>>,
    run_count: Arc<AtomicUsize>,
}

impl Effect {
    /// Create an effect and run it once.
    ///
    /// Fails with [`ReactiveError::InvalidNesting`](crate::ReactiveError)
    /// when called while another computation is being evaluated.
    pub fn new<F>(run: F) -> Result<Self>
    where
        F: Fn(&EffectContext) + Send + Sync + 'static,
    {
        let cleanups: Arc<Mutex<Vec<Cleanup>>> = Arc::new(Mutex::new(Vec::new()));
        let run_count = Arc::new(AtomicUsize::new(0));

        let ctx = EffectContext {
            cleanups: cleanups.clone(),
        };
        let counter = run_count.clone();
        let cell = Computed::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            run(&ctx);
        })?;

        let pending = cleanups.clone();
        cell.on_change(move |cell| {
            tracing::trace!(effect = %cell.subscriber_id(), "re-running effect");

            // Cleanups deferred by other cleanups run in this same pass.
            loop {
                let batch = std::mem::take(&mut *pending.lock());
                if batch.is_empty() {
                    break;
                }
                for cleanup in batch {
                    cleanup();
                }
            }
            cell.get();
        });

        tracing::debug!(effect = %cell.subscriber_id(), "created effect");
        Ok(Self {
            cell,
            cleanups,
            run_count,
        })
    }

    /// The ID of the recorder this effect leaves in its inputs.
    pub fn subscriber_id(&self) -> SubscriberId {
        self.cell.subscriber_id()
    }

    /// Get the number of times the effect has run, including the first run.
    pub fn run_count(&self) -> usize {
        self.run_count.load(Ordering::SeqCst)
    }

    /// Number of cleanups queued by the latest run.
    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.lock().len()
    }
}

impl Clone for Effect {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            cleanups: Arc::clone(&self.cleanups),
            run_count: Arc::clone(&self.run_count),
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.subscriber_id())
            .field("run_count", &self.run_count())
            .field("pending_cleanups", &self.pending_cleanups())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReactiveError;
    use crate::reactive::StateCell;
    use std::sync::atomic::AtomicI32;

    #[test]
    fn effect_runs_on_creation() {
        let run_count = Arc::new(AtomicI32::new(0));
        let run_count_clone = run_count.clone();

        let effect = Effect::new(move |_| {
            run_count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        assert_eq!(run_count.load(Ordering::SeqCst), 1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn effect_reruns_when_dependency_changes() {
        let signal = StateCell::new(0);
        let observed = Arc::new(AtomicI32::new(-1));

        let signal_clone = signal.clone();
        let observed_clone = observed.clone();
        let effect = Effect::new(move |_| {
            observed_clone.store(signal_clone.get(), Ordering::SeqCst);
        })
        .unwrap();

        assert_eq!(observed.load(Ordering::SeqCst), 0);

        signal.set(42);
        assert_eq!(observed.load(Ordering::SeqCst), 42);
        assert_eq!(effect.run_count(), 2);

        // Equal value: no re-run.
        signal.set(42);
        assert_eq!(effect.run_count(), 2);
    }

    #[test]
    fn cleanups_run_in_order_before_the_next_run() {
        let signal = StateCell::new(1);
        let log = Arc::new(Mutex::new(Vec::new()));

        let signal_clone = signal.clone();
        let log_clone = log.clone();
        let effect = Effect::new(move |ctx| {
            let value = signal_clone.get();
            log_clone.lock().push(format!("run {value}"));

            for tag in ["a", "b"] {
                let log = log_clone.clone();
                ctx.defer(move || log.lock().push(format!("cleanup {tag}{value}")));
            }
        })
        .unwrap();

        assert_eq!(effect.pending_cleanups(), 2);

        signal.set(2);
        signal.set(3);

        assert_eq!(
            *log.lock(),
            vec![
                "run 1",
                "cleanup a1",
                "cleanup b1",
                "run 2",
                "cleanup a2",
                "cleanup b2",
                "run 3",
            ]
        );
        assert_eq!(effect.pending_cleanups(), 2);
    }

    #[test]
    fn cleanup_deferred_by_a_cleanup_runs_before_the_rerun() {
        let signal = StateCell::new(0);
        let log = Arc::new(Mutex::new(Vec::new()));

        let signal_clone = signal.clone();
        let log_clone = log.clone();
        let effect = Effect::new(move |ctx| {
            let value = signal_clone.get();
            log_clone.lock().push(format!("run{value}"));

            let log = log_clone.clone();
            let later = ctx.clone();
            ctx.defer(move || {
                log.lock().push(format!("c{value}"));
                let log = log.clone();
                later.defer(move || log.lock().push("late".to_string()));
            });
        })
        .unwrap();

        signal.set(1);
        signal.set(2);

        assert_eq!(
            *log.lock(),
            vec!["run0", "c0", "late", "run1", "c1", "late", "run2"]
        );
        assert_eq!(effect.pending_cleanups(), 1);
    }

    #[test]
    fn effects_run_in_creation_order() {
        let signal = StateCell::new(0);
        let order = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let signal = signal.clone();
            let order = order.clone();
            Effect::new(move |_| {
                signal.get();
                order.lock().push(name);
            })
            .unwrap();
        }

        order.lock().clear();
        signal.set(1);
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn effect_outlives_its_handle() {
        let signal = StateCell::new(0);
        let runs = Arc::new(AtomicI32::new(0));

        {
            let signal = signal.clone();
            let runs = runs.clone();
            let effect = Effect::new(move |_| {
                signal.get();
                runs.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
            drop(effect);
        }

        signal.set(1);
        signal.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn repeated_reads_rerun_the_effect_per_edge() {
        let signal = StateCell::new(0);
        let signal_clone = signal.clone();

        let effect = Effect::new(move |_| {
            signal_clone.get();
            signal_clone.get();
        })
        .unwrap();

        signal.set(1);
        assert_eq!(effect.run_count(), 3);
    }

    #[test]
    fn effect_inside_computation_is_rejected() {
        let outer = Computed::new(|| Effect::new(|_| {}).err()).unwrap();
        assert!(matches!(
            outer.get(),
            Some(ReactiveError::InvalidNesting { .. })
        ));
    }

    #[test]
    fn effect_clone_shares_state() {
        let signal = StateCell::new(0);
        let signal_clone = signal.clone();

        let effect1 = Effect::new(move |_| {
            signal_clone.get();
        })
        .unwrap();
        let effect2 = effect1.clone();

        assert_eq!(effect1.subscriber_id(), effect2.subscriber_id());

        signal.set(1);
        assert_eq!(effect1.run_count(), 2);
        assert_eq!(effect2.run_count(), 2);
    }
}
